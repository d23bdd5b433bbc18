use thiserror::Error;

/// A unit or member skipped during discovery.
#[derive(Debug, Clone, Error)]
pub enum DiscoveryError {
    #[error("Error importing unit {unit}: {reason}")]
    Import { unit: String, reason: String },

    #[error("Error processing {member} in unit {unit}: {reason}")]
    Introspection {
        unit: String,
        member: String,
        reason: String,
    },
}
