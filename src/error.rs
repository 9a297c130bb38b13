/// Convenience result type used across stagecast.
pub type StageResult<T> = Result<T, StageError>;

/// Top-level error taxonomy used by loader APIs.
///
/// Every failure mode is explicit: a missing archive entry or a failed fetch
/// surfaces as a typed value instead of a request that never completes.
#[derive(thiserror::Error, Debug)]
pub enum StageError {
    /// Malformed or structurally invalid project descriptor bytes.
    #[error("descriptor error: {0}")]
    Descriptor(String),

    /// A network fetch failed. Retryable by the caller.
    #[error("transport error fetching '{url}': {reason}")]
    Transport {
        /// Requested URL.
        url: String,
        /// Underlying failure description.
        reason: String,
    },

    /// The active archive has no entry with the expected name.
    #[error("archive has no entry named '{0}'")]
    AssetUnresolved(String),

    /// An asset extension the resolver cannot embed.
    #[error("unknown asset extension '{0}'")]
    UnknownExtension(String),

    /// Audio bytes failed to parse as a supported WAV stream.
    #[error("audio decode error: {0}")]
    Decode(String),

    /// One or more asset tasks failed; every failure is listed.
    #[error("asset tasks failed ({n} total): {failures:?}", n = .failures.len())]
    AssetsFailed {
        /// Human-readable description of every failed asset task.
        failures: Vec<String>,
    },

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StageError {
    /// Build a [`StageError::Descriptor`] value.
    pub fn descriptor(msg: impl Into<String>) -> Self {
        Self::Descriptor(msg.into())
    }

    /// Build a [`StageError::Transport`] value.
    pub fn transport(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`StageError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }
}
