//! The fixed inspection template.
//!
//! Every checklist is created from these sections and items. Ids are owned
//! by this table and stay stable across releases; records created by other
//! clients may use different ids.

use crate::checklist::{ChecklistItem, ChecklistStatus, Section};

/// A section of the template: id, title, and `(item id, label)` pairs.
type SectionTemplate = (&'static str, &'static str, &'static [(&'static str, &'static str)]);

const TEMPLATE: &[SectionTemplate] = &[
    (
        "documentacao",
        "Documentação",
        &[
            ("crlv", "CRLV em dia"),
            ("cnh", "CNH do motorista"),
            ("seguro", "Seguro obrigatório"),
        ],
    ),
    (
        "pneus",
        "Pneus",
        &[
            ("dianteiros", "Pneus dianteiros"),
            ("traseiros", "Pneus traseiros"),
            ("estepe", "Estepe"),
            ("calibragem", "Calibragem"),
        ],
    ),
    (
        "iluminacao",
        "Iluminação",
        &[
            ("farois", "Faróis"),
            ("lanternas", "Lanternas"),
            ("setas", "Setas"),
            ("luz_freio", "Luz de freio"),
        ],
    ),
    (
        "motor",
        "Motor e fluidos",
        &[
            ("oleo", "Nível de óleo"),
            ("arrefecimento", "Líquido de arrefecimento"),
            ("fluido_freio", "Fluido de freio"),
            ("vazamentos", "Vazamentos"),
        ],
    ),
    (
        "seguranca",
        "Itens de segurança",
        &[
            ("extintor", "Extintor"),
            ("triangulo", "Triângulo"),
            ("macaco", "Macaco e chave de roda"),
            ("cintos", "Cintos de segurança"),
        ],
    ),
];

/// Build the blank sections of a new checklist.
///
/// Items start as [`ChecklistStatus::Ok`] with empty notes.
#[must_use]
pub fn initial_sections() -> Vec<Section> {
    TEMPLATE
        .iter()
        .map(|(id, title, items)| Section {
            id: (*id).to_string(),
            title: (*title).to_string(),
            section_notes: String::new(),
            items: items
                .iter()
                .map(|(item_id, label)| ChecklistItem {
                    id: (*item_id).to_string(),
                    label: (*label).to_string(),
                    status: ChecklistStatus::Ok,
                    notes: String::new(),
                })
                .collect(),
        })
        .collect()
}
