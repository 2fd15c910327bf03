//! Domain records mirrored from the review datastore.
//!
//! # Responsibility
//! - Define the typed shape of locations, reviews and identity records.
//! - Provide form-level validation for location drafts.
//!
//! # Invariants
//! - Every record is identified by a stable UUID.
//! - Rating range is owned by the datastore CHECK constraint, not this module.

pub mod location;
pub mod review;
pub mod user;
