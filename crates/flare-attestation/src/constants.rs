use std::time::Duration;

/// Header carrying the verifier API key.
pub const API_KEY_HEADER: &str = "X-API-KEY";

/// Width in bytes of an encoded attestation type, source id, or payment reference.
pub const IDENTIFIER_BYTES: usize = 32;

/// Attestation status reported for a confirmed fact.
pub const STATUS_VALID: &str = "VALID";

/// Attestation status reported when the fact could not be confirmed.
pub const STATUS_INVALID: &str = "INVALID";

/// Path of the Merkle proof endpoint, relative to the attestation client base URL.
pub const SPECIFIC_PROOF_PATH: &str = "/attestation-client/api/proof/get-specific-proof";

/// Default per-request timeout for verifier calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of attempts for [`crate::retry::retry_fixed`].
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 5;

/// Default delay between retry attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(5000);

/// Default interval between polls of the indexer or state connector.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Shortest delay between polls; smaller intervals, including zero, are raised to this.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default upper bound on a single polling wait.
pub const DEFAULT_POLL_MAX_WAIT: Duration = Duration::from_secs(300);

/// Timeout on sending an on-chain transaction.
pub const TX_SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout on waiting for a transaction receipt.
pub const TX_RECEIPT_TIMEOUT: Duration = Duration::from_secs(60);

/// Timeout on a read-only contract call.
pub const VIEW_CALL_TIMEOUT: Duration = Duration::from_secs(30);
