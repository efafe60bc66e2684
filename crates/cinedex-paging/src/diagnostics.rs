//! Error-reporting side channel for contract drift.

use std::fmt::Debug;

use crate::error::FetchError;
use crate::scope::Scope;

/// Fire-and-forget sink for failures that indicate a bug rather than a
/// transient condition. Mediators only report decode failures here.
pub trait DiagnosticsSink: Send + Sync + Debug {
    /// Records a failure observed while loading `scope`.
    fn report(&self, scope: &Scope, error: &FetchError);
}

/// Sink that writes reports to the `tracing` error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl DiagnosticsSink for TracingDiagnostics {
    fn report(&self, scope: &Scope, error: &FetchError) {
        let chain = error_chain(error);
        tracing::error!(scope = %scope, error = %chain, "response shape mismatch");
    }
}

/// Joins an error and its sources with `": "`.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut out = error.to_string();
    let mut source = error.source();
    while let Some(err) = source {
        out.push_str(": ");
        out.push_str(&err.to_string());
        source = err.source();
    }
    out
}
