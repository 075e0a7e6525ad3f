//! `checkfleet` - Vehicle inspection checklist storage
//!
//! This library persists vehicle inspection checklists either in an on-device
//! key-value blob or in a remote document collection, chosen per operation
//! from the remote credentials in effect. It also normalizes photos into
//! embedded data, validates form fields and pushes local records to the
//! remote backend.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod checklist;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod fetch;
pub mod image;
pub mod logging;
pub mod repository;
pub mod store;
pub mod sync;
pub mod template;
pub mod validate;

pub use checklist::{ChecklistStatus, Role, VehicleChecklist, Viewer};
pub use config::Config;
pub use credentials::{CredentialSource, ReloadingCredentials, SharedCredentials};
pub use error::{BackendKind, Error, Result};
pub use image::ImageNormalizer;
pub use logging::init_logging;
pub use repository::ChecklistRepository;
pub use store::{ChecklistStore, FirestoreConnector, LocalStore, RemoteConnector};
pub use sync::{SyncOrchestrator, SyncReport};
