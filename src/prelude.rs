//! # Prelude
//!
//! Re-exports commonly used types for convenience.
//!
//! ```rust
//! use log_forwarder_operator::prelude::*;
//! ```

// CRD types - most commonly used
pub use crate::crd::*;

// Generator entry points and result types
pub use crate::generator::{
    generate, parse_spec, CollectorKind, GenerateOptions, GeneratedConfig,
};
pub use crate::generator::diagnostic::{Diagnostic, DiagnosticKind, Severity};
pub use crate::generator::secrets::{SecretData, SecretMap};

// Reconciler types
pub use crate::controller::reconciler::{reconcile, error_policy, Reconciler};

// Config types
pub use crate::config::OperatorConfig;
