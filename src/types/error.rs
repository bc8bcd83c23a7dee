use thiserror::Error;

/// Errors raised while assembling an [`Auditor`](crate::Auditor).
///
/// The audit pass itself never fails; missing directives, missing ancestors
/// and odd option values all mean "nothing to report".
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("duplicate rule id '{id}'")]
    DuplicateRule { id: String },

    #[error("unknown rule '{id}' in {context}")]
    UnknownRule { id: String, context: &'static str },

    #[error("unknown severity '{name}'")]
    UnknownSeverity { name: String },
}
