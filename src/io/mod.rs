//! Input/output helpers.
//!
//! - plate description JSON (`plate`)
//! - curve JSON read/write (`curve`)

pub mod curve;
pub mod plate;

pub use curve::*;
pub use plate::*;
