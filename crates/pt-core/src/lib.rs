//! pt-core: shared foundation for the power-path twin.
//!
//! Contains:
//! - units (uom SI electrical types + constructors)
//! - numeric (Real + tolerances + range checks)
//! - fixed (unsigned Q-format values + saturating integer guards)
//! - error (shared error types)

pub mod error;
pub mod fixed;
pub mod numeric;
pub mod units;

// Re-exports for downstream crates
pub use error::{PtError, PtResult};
pub use fixed::*;
pub use numeric::*;
pub use units::*;
