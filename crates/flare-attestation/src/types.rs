//! Identifiers and the envelope sent to verifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::encoding::encode_identifier;
use crate::error::AttestationError;

/// Attestation-type-specific request fields, forwarded to the verifier as-is.
pub type RequestBody = serde_json::Map<String, serde_json::Value>;

/// The kind of fact an attestation asserts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttestationType {
    Payment,
    AddressValidity,
    ConfirmedBlockHeightExists,
    ReferencedPaymentNonexistence,
    BalanceDecreasingTransaction,
    EvmTransaction,
    /// Any type this crate has no typed model for.
    Other(String),
}

impl AttestationType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Payment => "Payment",
            Self::AddressValidity => "AddressValidity",
            Self::ConfirmedBlockHeightExists => "ConfirmedBlockHeightExists",
            Self::ReferencedPaymentNonexistence => "ReferencedPaymentNonexistence",
            Self::BalanceDecreasingTransaction => "BalanceDecreasingTransaction",
            Self::EvmTransaction => "EVMTransaction",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for AttestationType {
    fn from(name: &str) -> Self {
        match name {
            "Payment" => Self::Payment,
            "AddressValidity" => Self::AddressValidity,
            "ConfirmedBlockHeightExists" => Self::ConfirmedBlockHeightExists,
            "ReferencedPaymentNonexistence" => Self::ReferencedPaymentNonexistence,
            "BalanceDecreasingTransaction" => Self::BalanceDecreasingTransaction,
            "EVMTransaction" => Self::EvmTransaction,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for AttestationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// External chains the verifiers index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceChain {
    Btc,
    Doge,
    Xrp,
    Eth,
}

impl SourceChain {
    pub const ALL: [SourceChain; 4] = [Self::Btc, Self::Doge, Self::Xrp, Self::Eth];

    /// Network segment used in verifier paths.
    pub fn network(self) -> &'static str {
        match self {
            Self::Btc => "btc",
            Self::Doge => "doge",
            Self::Xrp => "xrp",
            Self::Eth => "eth",
        }
    }

    /// Source id for this chain, e.g. `testBTC` on testnet and `BTC` on mainnet.
    pub fn source_id(self, testnet: bool) -> &'static str {
        match (self, testnet) {
            (Self::Btc, true) => "testBTC",
            (Self::Btc, false) => "BTC",
            (Self::Doge, true) => "testDOGE",
            (Self::Doge, false) => "DOGE",
            (Self::Xrp, true) => "testXRP",
            (Self::Xrp, false) => "XRP",
            (Self::Eth, true) => "testETH",
            (Self::Eth, false) => "ETH",
        }
    }
}

impl FromStr for SourceChain {
    type Err = AttestationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|chain| chain.network().eq_ignore_ascii_case(s))
            .ok_or_else(|| AttestationError::Config(format!("unknown source chain: {s}")))
    }
}

/// Which attestation, on which network, against which source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationIdentifier {
    pub attestation_type: AttestationType,
    pub network: String,
    pub source_id: String,
}

impl AttestationIdentifier {
    pub fn new(
        attestation_type: impl Into<AttestationType>,
        network: impl Into<String>,
        source_id: impl Into<String>,
    ) -> Self {
        Self {
            attestation_type: attestation_type.into(),
            network: network.into(),
            source_id: source_id.into(),
        }
    }

    pub fn for_chain(attestation_type: AttestationType, chain: SourceChain, testnet: bool) -> Self {
        Self {
            attestation_type,
            network: chain.network().to_string(),
            source_id: chain.source_id(testnet).to_string(),
        }
    }

    /// Build the wire envelope, hex-encoding the type and source id.
    pub fn envelope(&self, request_body: &RequestBody) -> Result<AttestationEnvelope, AttestationError> {
        Ok(AttestationEnvelope {
            attestation_type: encode_identifier(self.attestation_type.as_str())?,
            source_id: encode_identifier(&self.source_id)?,
            request_body: request_body.clone(),
        })
    }
}

/// JSON body of `prepareRequest` / `prepareResponse` calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationEnvelope {
    pub attestation_type: String,
    pub source_id: String,
    pub request_body: RequestBody,
}
