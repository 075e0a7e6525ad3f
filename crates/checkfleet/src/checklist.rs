//! The vehicle checklist entity.
//!
//! Field names serialize in camelCase so the local blob and the remote
//! documents keep the layout existing clients already read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::image::ImageRef;
use crate::template;

/// Maximum number of photos a checklist carries (front and rear).
pub const MAX_IMAGES: usize = 2;

/// Condition recorded for a single inspection item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecklistStatus {
    /// Good condition.
    #[default]
    Ok,
    /// Acceptable, needs attention soon.
    Regular,
    /// Bad condition.
    Ruim,
}

impl std::fmt::Display for ChecklistStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Regular => write!(f, "regular"),
            Self::Ruim => write!(f, "ruim"),
        }
    }
}

/// One inspected item inside a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    /// Stable identifier from the template.
    pub id: String,
    /// Human-readable label.
    pub label: String,
    /// Recorded condition.
    pub status: ChecklistStatus,
    /// Free-text observation.
    #[serde(default)]
    pub notes: String,
}

/// A group of inspection items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// Stable identifier from the template.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Free-text notes for the whole section.
    #[serde(default)]
    pub section_notes: String,
    /// Items in template order.
    pub items: Vec<ChecklistItem>,
}

/// A filled-in vehicle inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleChecklist {
    /// Caller-assigned identity, immutable after creation.
    pub id: String,
    /// Owner; empty when created before an identity was known.
    #[serde(default)]
    pub user_id: String,
    /// Licence plate.
    #[serde(default)]
    pub plate: String,
    /// Driver name.
    #[serde(default)]
    pub driver: String,
    /// Inspection date, `YYYY-MM-DD`.
    #[serde(default)]
    pub date: String,
    /// Inspection time, `HH:MM`.
    #[serde(default)]
    pub time: String,
    /// Odometer reading.
    #[serde(default)]
    pub km: String,
    /// Free-text notes for the whole inspection.
    #[serde(default)]
    pub general_notes: String,
    /// Driver signature.
    #[serde(default)]
    pub driver_signature: String,
    /// Inspector signature.
    #[serde(default)]
    pub inspector_signature: String,
    /// Embedded photos, front first.
    #[serde(default)]
    pub images: Vec<String>,
    /// Sections in template order.
    pub sections: Vec<Section>,
    /// Set once when the record is created.
    pub created_at: DateTime<Utc>,
    /// Refreshed on every write.
    pub updated_at: DateTime<Utc>,
}

/// Generate a checklist id from a timestamp (milliseconds since the epoch).
#[must_use]
pub fn generate_id(now: DateTime<Utc>) -> String {
    now.timestamp_millis().to_string()
}

impl VehicleChecklist {
    /// Create a blank checklist from the inspection template.
    ///
    /// Date and time default to `now`; both timestamps are set to `now`.
    #[must_use]
    pub fn new(id: impl Into<String>, user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            plate: String::new(),
            driver: String::new(),
            date: now.format("%Y-%m-%d").to_string(),
            time: now.format("%H:%M").to_string(),
            km: String::new(),
            general_notes: String::new(),
            driver_signature: String::new(),
            inspector_signature: String::new(),
            images: Vec::new(),
            sections: template::initial_sections(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Refresh `updated_at`. Callers do this before saving.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    /// Assign an owner to a record created before the identity was known.
    pub fn assign_owner_if_missing(&mut self, user_id: &str) {
        if self.user_id.is_empty() {
            self.user_id = user_id.to_string();
        }
    }

    /// Set the recorded condition of an item.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownSection`] or [`Error::UnknownItem`] if the
    /// template has no such slot.
    pub fn set_item_status(
        &mut self,
        section_id: &str,
        item_id: &str,
        status: ChecklistStatus,
    ) -> Result<()> {
        self.item_mut(section_id, item_id)?.status = status;
        Ok(())
    }

    /// Set the observation text of an item.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownSection`] or [`Error::UnknownItem`] if the
    /// template has no such slot.
    pub fn set_item_notes(
        &mut self,
        section_id: &str,
        item_id: &str,
        notes: impl Into<String>,
    ) -> Result<()> {
        self.item_mut(section_id, item_id)?.notes = notes.into();
        Ok(())
    }

    /// Set the notes of a whole section.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownSection`] if the template has no such section.
    pub fn set_section_notes(&mut self, section_id: &str, notes: impl Into<String>) -> Result<()> {
        self.section_mut(section_id)?.section_notes = notes.into();
        Ok(())
    }

    /// Attach a photo reference.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ImageLimit`] if the checklist already holds
    /// [`MAX_IMAGES`] photos.
    pub fn add_image(&mut self, reference: impl Into<String>) -> Result<()> {
        if self.images.len() >= MAX_IMAGES {
            return Err(Error::ImageLimit { max: MAX_IMAGES });
        }
        self.images.push(reference.into());
        Ok(())
    }

    /// Remove the photo at `index`, returning it if it existed.
    pub fn remove_image(&mut self, index: usize) -> Option<String> {
        (index < self.images.len()).then(|| self.images.remove(index))
    }

    /// Photos still stored as raw references rather than embedded data.
    ///
    /// These are left behind when resolution failed during a save.
    #[must_use]
    pub fn unresolved_images(&self) -> Vec<&str> {
        self.images
            .iter()
            .map(String::as_str)
            .filter(|img| !ImageRef::classify(img).is_embedded())
            .collect()
    }

    /// Count items recorded with the given status.
    #[must_use]
    pub fn count_status(&self, status: ChecklistStatus) -> usize {
        self.sections
            .iter()
            .flat_map(|s| &s.items)
            .filter(|i| i.status == status)
            .count()
    }

    fn section_mut(&mut self, section_id: &str) -> Result<&mut Section> {
        self.sections
            .iter_mut()
            .find(|s| s.id == section_id)
            .ok_or_else(|| Error::UnknownSection {
                section_id: section_id.to_string(),
            })
    }

    fn item_mut(&mut self, section_id: &str, item_id: &str) -> Result<&mut ChecklistItem> {
        self.section_mut(section_id)?
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| Error::UnknownItem {
                section_id: section_id.to_string(),
                item_id: item_id.to_string(),
            })
    }
}

/// Role of the person looking at a list of checklists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Sees every checklist.
    Admin,
    /// Sees only checklists they own.
    #[default]
    Inspector,
}

/// The identity a list of checklists is filtered for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    /// The viewer's user id.
    pub user_id: String,
    /// The viewer's role.
    pub role: Role,
}

impl Viewer {
    /// Create a viewer.
    #[must_use]
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    /// Whether this viewer may see the checklist.
    #[must_use]
    pub fn can_see(&self, checklist: &VehicleChecklist) -> bool {
        self.role == Role::Admin || checklist.user_id == self.user_id
    }
}

/// Keep only the checklists `viewer` may see.
#[must_use]
pub fn filter_visible(checklists: Vec<VehicleChecklist>, viewer: &Viewer) -> Vec<VehicleChecklist> {
    checklists.into_iter().filter(|c| viewer.can_see(c)).collect()
}

/// Order checklists by creation time, newest first.
pub fn sort_newest_first(checklists: &mut [VehicleChecklist]) {
    checklists.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
