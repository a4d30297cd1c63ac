//! Strata Core
//!
//! Shared plumbing for the Strata crates: logging bootstrap, profiling scopes,
//! math re-exports and hash collection aliases.

pub mod alloc;
pub mod logging;
pub mod math;
pub mod profiling;
