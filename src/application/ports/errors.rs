/// Raised by repositories when a unique index rejects a write.
#[derive(Debug, thiserror::Error)]
#[error("unique constraint violated: {constraint}")]
pub struct UniqueViolation {
    pub constraint: String,
}

impl UniqueViolation {
    pub fn new(constraint: impl Into<String>) -> Self {
        Self {
            constraint: constraint.into(),
        }
    }

    pub fn find(err: &anyhow::Error) -> Option<&UniqueViolation> {
        err.downcast_ref::<UniqueViolation>()
    }
}
