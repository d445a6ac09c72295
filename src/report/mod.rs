//! Reporting: terminal summaries of a fitting run.

pub mod format;

pub use format::*;
