//! Structured, leveled diagnostics emitted by the sync engine.
//!
//! The engine never prints. Every user-visible message becomes a
//! [`Diagnostic`] with a severity, a categorised code, and an optional
//! subject (a target label or a file). Diagnostics are collected by an
//! injected, thread-safe [`DiagnosticSink`]; the host decides how to show
//! them, for example through one of the [`DiagnosticRenderer`]s.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::{Diagnostic, Subject};
pub use renderer::{DiagnosticRenderer, JsonRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
