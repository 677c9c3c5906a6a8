//! Typed request bodies for the attestation types the verifiers support.
//!
//! Verifiers expect integers as decimal strings, so the numeric fields here
//! are serialised that way. Anything not modelled can still be sent as a raw
//! [`RequestBody`].

use serde::Serialize;

use crate::error::AttestationError;
use crate::types::{AttestationType, RequestBody};

/// A request body that knows which attestation type it belongs to.
pub trait AttestationRequest: Serialize {
    const ATTESTATION_TYPE: AttestationType;

    /// Serialise into the opaque map forwarded to the verifier.
    fn to_request_body(&self) -> Result<RequestBody, AttestationError> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(AttestationError::Decode(format!(
                "request body must be an object, got {other}"
            ))),
        }
    }
}

fn decimal<S: serde::Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Prove that a transaction paid some amount.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub transaction_id: String,
    #[serde(serialize_with = "decimal")]
    pub in_utxo: u64,
    #[serde(serialize_with = "decimal")]
    pub utxo: u64,
}

impl AttestationRequest for PaymentRequest {
    const ATTESTATION_TYPE: AttestationType = AttestationType::Payment;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressValidityRequest {
    pub address_str: String,
}

impl AttestationRequest for AddressValidityRequest {
    const ATTESTATION_TYPE: AttestationType = AttestationType::AddressValidity;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedBlockHeightExistsRequest {
    #[serde(serialize_with = "decimal")]
    pub block_number: u64,
    /// Window in seconds used to compute the lowest query window block.
    #[serde(serialize_with = "decimal")]
    pub query_window: u64,
}

impl AttestationRequest for ConfirmedBlockHeightExistsRequest {
    const ATTESTATION_TYPE: AttestationType = AttestationType::ConfirmedBlockHeightExists;
}

/// Prove that no payment with the given reference reached the destination
/// within the block and time bounds.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferencedPaymentNonexistenceRequest {
    #[serde(serialize_with = "decimal")]
    pub minimal_block_number: u64,
    #[serde(serialize_with = "decimal")]
    pub deadline_block_number: u64,
    #[serde(serialize_with = "decimal")]
    pub deadline_timestamp: u64,
    pub destination_address_hash: String,
    /// Amount in the chain's smallest unit.
    pub amount: String,
    pub standard_payment_reference: String,
}

impl AttestationRequest for ReferencedPaymentNonexistenceRequest {
    const ATTESTATION_TYPE: AttestationType = AttestationType::ReferencedPaymentNonexistence;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceDecreasingTransactionRequest {
    pub transaction_id: String,
    pub source_address_indicator: String,
}

impl AttestationRequest for BalanceDecreasingTransactionRequest {
    const ATTESTATION_TYPE: AttestationType = AttestationType::BalanceDecreasingTransaction;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmTransactionRequest {
    pub transaction_hash: String,
    #[serde(serialize_with = "decimal")]
    pub required_confirmations: u64,
    pub provide_input: bool,
    pub list_events: bool,
    /// Empty means all events, when `list_events` is set.
    pub log_indices: Vec<u32>,
}

impl AttestationRequest for EvmTransactionRequest {
    const ATTESTATION_TYPE: AttestationType = AttestationType::EvmTransaction;
}
