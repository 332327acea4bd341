use std::fmt::Display;

pub type PlotResult<T> = Result<T, PlotError>;

#[derive(thiserror::Error, Debug)]
pub enum PlotError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("data access error: {0}")]
    DataAccess(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error("generation cancelled")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PlotError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn data_access(msg: impl Into<String>) -> Self {
        Self::DataAccess(msg.into())
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Prefix the message with `ctx` while keeping the error category.
    ///
    /// Used to name the offending dataset, series, table or predicate.
    pub fn with_context(self, ctx: impl Display) -> Self {
        match self {
            Self::Configuration(m) => Self::Configuration(format!("{ctx}: {m}")),
            Self::DataAccess(m) => Self::DataAccess(format!("{ctx}: {m}")),
            Self::Persistence(m) => Self::Persistence(format!("{ctx}: {m}")),
            Self::Serde(m) => Self::Serde(format!("{ctx}: {m}")),
            Self::Cancelled => Self::Cancelled,
            Self::Other(e) => Self::Other(e.context(ctx.to_string())),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
