//! # Lessonbook Core
//!
//! Domain types and the booking/quota engine for the lesson studio.
//!
//! - [`models`]: catalog, availability, quota, booking and history records
//! - [`store`]: the transactional persistence interface plus an in-memory store
//! - [`services`]: the operations callers use, one store transaction each
//! - [`policy`]: business-policy values (validity window, studio timezone)

pub mod errors;
pub mod models;
pub mod policy;
pub mod services;
pub mod store;

pub use errors::{BookingError, BookingResult};
