//! # Validation
//!
//! Cross-system checks that an imported person was persisted.

pub mod cross_system;
pub mod outcome;

pub use cross_system::CrossSystemValidator;
pub use outcome::{PersistedRecord, ValidationOutcome, PERSON_ID_COLUMN};
