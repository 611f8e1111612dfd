//! Foundational types shared by every Visage crate.

pub mod diagnostics;
pub mod errors;

pub use diagnostics::{DiagnosticReport, DiagnosticSink, DiagnosticsReader};
pub use errors::{Result, VisageError};
