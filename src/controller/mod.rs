//! # Controller
//!
//! The reconciliation loop wiring the generator into the cluster: watch
//! ClusterLogForwarder resources, generate collector configuration, project
//! diagnostics onto status conditions.

pub mod reconciler;
