use thiserror::Error;

/// Errors returned by attestation client operations.
#[derive(Debug, Error)]
pub enum AttestationError {
    /// The verifier could not be reached (DNS, refused connection, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx response that is not a verifier verdict: the body is not JSON,
    /// or is JSON without a `status` field.
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("decode error: {0}")]
    Decode(String),

    /// The verifier answered, but could not confirm the asserted fact.
    #[error("attestation invalid: status {0}")]
    AttestationInvalid(String),

    #[error("verification timed out after {attempts} attempts: {last_error}")]
    VerificationTimeout { attempts: u32, last_error: String },

    #[error("identifier {value:?} encodes to {len} bytes, exceeding the {max}-byte field")]
    EncodingOverflow {
        value: String,
        len: usize,
        max: usize,
    },

    #[error("{network} indexer did not reach block {target} within {waited_ms}ms (last seen {last_seen:?})")]
    IndexerTimeout {
        network: String,
        target: u64,
        last_seen: Option<u64>,
        waited_ms: u64,
    },

    #[error("round {round_id} not finalized within {waited_ms}ms (last finalized {last_finalized:?})")]
    RoundNotFinalized {
        round_id: u64,
        last_finalized: Option<u64>,
        waited_ms: u64,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("chain error: {0}")]
    Chain(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
