//! Responses returned by the verifier and attestation client services.
//!
//! The outer shapes keep every field they receive so that a result can be
//! re-serialised unchanged. The attestation-type-specific `responseBody` is
//! kept raw and decoded on demand into [`ResponseBody`].

use alloy::primitives::B256;
use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::{STATUS_INVALID, STATUS_VALID};
use crate::error::AttestationError;
use crate::types::AttestationType;

type Extra = serde_json::Map<String, serde_json::Value>;

/// Verifier verdict on an attestation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AttestationStatus {
    Valid,
    Invalid,
    /// Any other status string, kept verbatim.
    Other(String),
}

impl AttestationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Valid => STATUS_VALID,
            Self::Invalid => STATUS_INVALID,
            Self::Other(s) => s,
        }
    }
}

impl From<String> for AttestationStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            STATUS_VALID => Self::Valid,
            STATUS_INVALID => Self::Invalid,
            _ => Self::Other(s),
        }
    }
}

impl From<AttestationStatus> for String {
    fn from(status: AttestationStatus) -> Self {
        match status {
            AttestationStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

/// Result of `prepareRequest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedRequest {
    pub status: AttestationStatus,
    /// ABI-encoded request to submit to the state connector. Absent when the
    /// verifier rejects the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abi_encoded_request: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Result of `prepareResponse`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttestationResult {
    pub status: AttestationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<AttestationResponse>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// The `response` object of a valid attestation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttestationResponse {
    #[serde(rename = "responseBody")]
    pub response_body: serde_json::Value,
    /// `attestationType`, `sourceId`, `votingRound`, `requestBody`, ...
    #[serde(flatten)]
    pub extra: Extra,
}

impl AttestationResult {
    pub fn is_valid(&self) -> bool {
        self.status == AttestationStatus::Valid
    }

    /// Fail with [`AttestationError::AttestationInvalid`] unless the status is `VALID`.
    pub fn require_valid(self) -> Result<Self, AttestationError> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(AttestationError::AttestationInvalid(
                self.status.as_str().to_string(),
            ))
        }
    }

    pub fn response_body(&self) -> Option<&serde_json::Value> {
        self.response.as_ref().map(|r| &r.response_body)
    }

    /// Decode the response body into the typed shape for `attestation_type`.
    pub fn typed_body(
        &self,
        attestation_type: &AttestationType,
    ) -> Result<ResponseBody, AttestationError> {
        let body = self.response_body().ok_or_else(|| {
            AttestationError::Decode(format!(
                "no response body (status {})",
                self.status.as_str()
            ))
        })?;
        ResponseBody::decode(attestation_type, body)
    }
}

/// Indexed block range of a verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRange {
    #[serde(deserialize_with = "lenient::u64")]
    pub first: u64,
    #[serde(deserialize_with = "lenient::u64")]
    pub last: u64,
}

impl BlockRange {
    pub fn contains(&self, block: u64) -> bool {
        (self.first..=self.last).contains(&block)
    }
}

/// Attestation response plus its inclusion proof for a finalised round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerkleProof {
    pub response: serde_json::Value,
    pub merkle_proof: Vec<String>,
}

impl MerkleProof {
    /// Parse the proof into 32-byte sibling hashes.
    pub fn proof_hashes(&self) -> Result<Vec<B256>, AttestationError> {
        self.merkle_proof
            .iter()
            .map(|h| {
                h.parse::<B256>()
                    .map_err(|e| AttestationError::Decode(format!("invalid proof hash {h:?}: {e}")))
            })
            .collect()
    }
}

/// `{ status, data }` wrapper used by the indexer and proof endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiEnvelope<T> {
    #[serde(default)]
    pub status: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    pub(crate) fn into_data(self, what: &str) -> Result<T, AttestationError> {
        let status = self.status;
        self.data.ok_or_else(|| {
            AttestationError::Decode(format!(
                "{what}: response has no data (status {})",
                status.as_deref().unwrap_or("missing")
            ))
        })
    }
}

/// Typed `responseBody`, keyed by attestation type.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Payment(PaymentBody),
    AddressValidity(AddressValidityBody),
    ConfirmedBlockHeightExists(ConfirmedBlockHeightExistsBody),
    ReferencedPaymentNonexistence(ReferencedPaymentNonexistenceBody),
    BalanceDecreasingTransaction(BalanceDecreasingTransactionBody),
    EvmTransaction(EvmTransactionBody),
    /// Body of an attestation type without a typed model.
    Unknown(serde_json::Value),
}

impl ResponseBody {
    pub fn decode(
        attestation_type: &AttestationType,
        body: &serde_json::Value,
    ) -> Result<Self, AttestationError> {
        fn typed<T: serde::de::DeserializeOwned>(
            ty: &AttestationType,
            body: &serde_json::Value,
        ) -> Result<T, AttestationError> {
            T::deserialize(body)
                .map_err(|e| AttestationError::Decode(format!("{ty} response body: {e}")))
        }

        let ty = attestation_type;
        Ok(match ty {
            AttestationType::Payment => Self::Payment(typed(ty, body)?),
            AttestationType::AddressValidity => Self::AddressValidity(typed(ty, body)?),
            AttestationType::ConfirmedBlockHeightExists => {
                Self::ConfirmedBlockHeightExists(typed(ty, body)?)
            }
            AttestationType::ReferencedPaymentNonexistence => {
                Self::ReferencedPaymentNonexistence(typed(ty, body)?)
            }
            AttestationType::BalanceDecreasingTransaction => {
                Self::BalanceDecreasingTransaction(typed(ty, body)?)
            }
            AttestationType::EvmTransaction => Self::EvmTransaction(typed(ty, body)?),
            AttestationType::Other(_) => Self::Unknown(body.clone()),
        })
    }

    /// Block number the attested fact was observed in, when the type has one.
    pub fn block_number(&self) -> Option<u64> {
        match self {
            Self::Payment(b) => Some(b.block_number),
            Self::BalanceDecreasingTransaction(b) => Some(b.block_number),
            Self::EvmTransaction(b) => Some(b.block_number),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaymentBody {
    #[serde(deserialize_with = "lenient::u64")]
    pub block_number: u64,
    #[serde(deserialize_with = "lenient::u64")]
    pub block_timestamp: u64,
    pub source_address_hash: String,
    pub receiving_address_hash: String,
    pub intended_receiving_address_hash: String,
    pub standard_payment_reference: String,
    #[serde(deserialize_with = "lenient::string")]
    pub spent_amount: String,
    #[serde(deserialize_with = "lenient::string")]
    pub intended_spent_amount: String,
    #[serde(deserialize_with = "lenient::string")]
    pub received_amount: String,
    #[serde(deserialize_with = "lenient::string")]
    pub intended_received_amount: String,
    pub one_to_one: bool,
    #[serde(deserialize_with = "lenient::string")]
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AddressValidityBody {
    pub is_valid: bool,
    pub standard_address: String,
    pub standard_address_hash: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfirmedBlockHeightExistsBody {
    #[serde(deserialize_with = "lenient::u64")]
    pub block_timestamp: u64,
    #[serde(deserialize_with = "lenient::u64")]
    pub number_of_confirmations: u64,
    #[serde(deserialize_with = "lenient::u64")]
    pub lowest_query_window_block_number: u64,
    #[serde(deserialize_with = "lenient::u64")]
    pub lowest_query_window_block_timestamp: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReferencedPaymentNonexistenceBody {
    #[serde(deserialize_with = "lenient::u64")]
    pub minimal_block_timestamp: u64,
    #[serde(deserialize_with = "lenient::u64")]
    pub first_overflow_block_number: u64,
    #[serde(deserialize_with = "lenient::u64")]
    pub first_overflow_block_timestamp: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BalanceDecreasingTransactionBody {
    #[serde(deserialize_with = "lenient::u64")]
    pub block_number: u64,
    #[serde(deserialize_with = "lenient::u64")]
    pub block_timestamp: u64,
    pub source_address_hash: String,
    #[serde(deserialize_with = "lenient::string")]
    pub spent_amount: String,
    pub standard_payment_reference: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EvmTransactionBody {
    #[serde(deserialize_with = "lenient::u64")]
    pub block_number: u64,
    #[serde(deserialize_with = "lenient::u64")]
    pub timestamp: u64,
    pub source_address: String,
    pub is_deployment: bool,
    pub receiving_address: String,
    #[serde(deserialize_with = "lenient::string")]
    pub value: String,
    pub input: String,
    #[serde(deserialize_with = "lenient::string")]
    pub status: String,
    pub events: Vec<EvmEvent>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EvmEvent {
    #[serde(deserialize_with = "lenient::u64")]
    pub log_index: u64,
    pub emitter_address: String,
    pub topics: Vec<String>,
    pub data: String,
    pub removed: bool,
}

/// Verifiers emit uint fields as decimal strings; accept plain numbers too.
pub(crate) mod lenient {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Unsigned(u64),
        Float(f64),
        Flag(bool),
    }

    pub fn u64<'de, D: Deserializer<'de>>(de: D) -> Result<u64, D::Error> {
        match Scalar::deserialize(de)? {
            Scalar::Unsigned(n) => Ok(n),
            Scalar::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| serde::de::Error::custom(format!("expected unsigned integer, got {s:?}"))),
            Scalar::Float(f) => Err(serde::de::Error::custom(format!(
                "expected unsigned integer, got {f}"
            ))),
            Scalar::Flag(b) => Err(serde::de::Error::custom(format!(
                "expected unsigned integer, got {b}"
            ))),
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
        Ok(match Scalar::deserialize(de)? {
            Scalar::Text(s) => s,
            Scalar::Unsigned(n) => n.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Flag(b) => b.to_string(),
        })
    }
}
