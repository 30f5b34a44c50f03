use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScanError>;

/// Conditions that stop a whole session. Per-port faults are never reported
/// here; they are folded into the port's result.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("could not resolve target {target:?}: {reason}")]
    Resolution { target: String, reason: String },

    #[error("scan interrupted after {completed} probes ({open} open)")]
    Interrupted { completed: usize, open: usize },
}

impl ScanError {
    pub fn resolution(target: impl Into<String>, reason: impl ToString) -> Self {
        ScanError::Resolution {
            target: target.into(),
            reason: reason.to_string(),
        }
    }
}
