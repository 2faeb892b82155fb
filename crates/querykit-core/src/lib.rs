//! QueryKit Core
//!
//! Shared configuration and diagnostic types for the QueryKit SQL toolkit.
//! Diagnostic codes are part of the public API - never rename them.

pub mod diagnostic;
pub mod config;

pub use diagnostic::{Diagnostic, DiagnosticCode, Severity, Location};
pub use config::{Config, ConfigError, DialectConfig, DEFAULT_MAX_LIMIT};
