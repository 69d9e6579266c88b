use std::error::Error;

use crate::form::{FieldKey, FormId};

/// Receives faults the form core recovers from instead of propagating.
pub trait DiagnosticSink: Send + Sync {
    fn validator_fault(&self, field: FieldKey, detail: &str);

    fn submit_rejected(&self, form_id: FormId, error: &(dyn Error + Send + Sync)) {
        let _ = (form_id, error);
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn validator_fault(&self, field: FieldKey, detail: &str) {
        tracing::warn!(field = %field, detail, "validator fault recovered");
    }

    fn submit_rejected(&self, form_id: FormId, error: &(dyn Error + Send + Sync)) {
        tracing::warn!(form_id = form_id.0, error = %error, "form submit rejected");
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopDiagnostics;

impl DiagnosticSink for NoopDiagnostics {
    fn validator_fault(&self, _field: FieldKey, _detail: &str) {}
}
