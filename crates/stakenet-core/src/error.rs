use thiserror::Error;

#[derive(Debug, Error)]
pub enum BootstrapError {
    // ── Operator input ───────────────────────────────────────────────────────
    #[error("invalid {field}: {reason}")]
    InvalidParameter { field: &'static str, reason: String },

    // ── Key material ─────────────────────────────────────────────────────────
    #[error("random source exhausted while generating key material: {0}")]
    KeyGenerationExhaustion(String),

    #[error("invalid private key")]
    InvalidPrivateKey,

    #[error("key store: {0}")]
    KeyStore(String),

    // ── Chain specification ──────────────────────────────────────────────────
    #[error("chain specification: {0}")]
    Specification(String),

    // ── Chain interaction ────────────────────────────────────────────────────
    #[error("RPC failure: {0}")]
    RpcFailure(String),

    #[error("node rejected `{method}` ({code}): {message}")]
    RpcRejected {
        method: String,
        code: i64,
        message: String,
    },

    #[error("transaction for step `{step}` failed (tx {tx_hash})")]
    TransactionFailed { step: String, tx_hash: String },

    /// A later step failed after earlier transactions were already mined.
    #[error("step `{step}` interrupted: {source}")]
    StepInterrupted {
        step: String,
        #[source]
        source: Box<BootstrapError>,
    },

    #[error("contract compilation failed: {0}")]
    Compilation(String),

    #[error("ABI error: {0}")]
    Abi(String),

    // ── Serialization / storage ──────────────────────────────────────────────
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BootstrapError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field,
            reason: reason.into(),
        }
    }

    /// Transport-level failures may succeed on a later attempt; everything
    /// else is deterministic and must not be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RpcFailure(_))
    }

    /// Attribute the error to `step`. Reverted transactions already carry
    /// their step and are returned unchanged.
    pub fn in_step(self, step: impl Into<String>) -> Self {
        match self {
            e @ (Self::TransactionFailed { .. } | Self::StepInterrupted { .. }) => e,
            e => Self::StepInterrupted {
                step: step.into(),
                source: Box::new(e),
            },
        }
    }
}

impl From<serde_json::Error> for BootstrapError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
