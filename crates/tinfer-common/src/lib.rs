//! Common types shared by the tinfer crates.
//!
//! This crate provides the leaf-level pieces every other crate builds on:
//! - Source positions (`Position`) used to anchor diagnostics
//! - Structured diagnostics (`Diagnostic`, `MessageTemplate`) and the `LogSink` seam
//! - Centralized limits and thresholds
//! - Tracing subscriber setup driven by environment variables

// Position type for source locations
pub mod position;
pub use position::Position;

// Structured diagnostics and log sinks
pub mod diagnostics;
pub use diagnostics::{
    CollectingSink, Diagnostic, DiagnosticArg, Level, LogSink, MessageTemplate, NullSink,
    format_message,
};

// Centralized limits and thresholds
pub mod limits;

// Tracing subscriber initialisation
pub mod tracing_config;
