use thiserror::Error;

/// Coarse classification of a [`SimError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidConfig,
    InvalidOrder,
    InvalidSchedule,
    SamplerExhausted,
    Parse,
    ThreadPool,
}

/// Fatal simulation errors. Shortage, backorders, waste and overflow are modelled
/// outcomes and never surface here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("invalid configuration for '{entity}': {reason}")]
    InvalidConfig { entity: String, reason: String },

    #[error("invalid order at '{entity}': {reason}")]
    InvalidOrder { entity: String, reason: String },

    #[error("invalid schedule for '{entity}': {reason}")]
    InvalidSchedule { entity: String, reason: String },

    #[error("sampler for '{entity}' is exhausted")]
    SamplerExhausted { entity: String },

    #[error("failed to parse network description: {0}")]
    Parse(String),

    #[error("failed to build thread pool: {0}")]
    ThreadPool(String),
}

impl SimError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SimError::InvalidConfig { .. } => ErrorKind::InvalidConfig,
            SimError::InvalidOrder { .. } => ErrorKind::InvalidOrder,
            SimError::InvalidSchedule { .. } => ErrorKind::InvalidSchedule,
            SimError::SamplerExhausted { .. } => ErrorKind::SamplerExhausted,
            SimError::Parse(_) => ErrorKind::Parse,
            SimError::ThreadPool(_) => ErrorKind::ThreadPool,
        }
    }

    pub(crate) fn config(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        SimError::InvalidConfig {
            entity: entity.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn order(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        SimError::InvalidOrder {
            entity: entity.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn schedule(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        SimError::InvalidSchedule {
            entity: entity.into(),
            reason: reason.into(),
        }
    }

    /// Attribute a scheduling failure to the entity that asked for it
    pub(crate) fn scheduled_by(self, entity: &str) -> Self {
        match self {
            SimError::InvalidSchedule { reason, .. } => SimError::InvalidSchedule {
                entity: entity.to_string(),
                reason,
            },
            other => other,
        }
    }
}

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        SimError::Parse(err.to_string())
    }
}
