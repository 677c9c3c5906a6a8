//! Client for Flare State Connector attestation services.
//!
//! Talks to two external HTTP services:
//!
//! - **Verifiers** (`/verifier/{network}/{type}/...`): prepare ABI-encoded
//!   attestation requests and preview the response they would vote for
//! - **Attestation client** (`/attestation-client/api/proof/...`): serve the
//!   Merkle proof for a request once its voting round is finalised
//!
//! and, through [`state_connector`], the on-chain contract that accepts
//! requests and finalises rounds.
//!
//! # Quick example
//!
//! ```no_run
//! use attestation::{AttestationClient, AttestationConfig, AttestationIdentifier, AttestationType, SourceChain};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let config = AttestationConfig::from_env().unwrap();
//! let testnet = config.use_testnet;
//! let client = AttestationClient::new(config).unwrap();
//!
//! let id = AttestationIdentifier::for_chain(AttestationType::AddressValidity, SourceChain::Xrp, testnet);
//! let body = serde_json::json!({ "addressStr": "r9RLXvWuRro3RX33pk4xsN58tefYZ8Tvbj" });
//!
//! let result = client
//!     .prepare_response(&id, body.as_object().unwrap())
//!     .await
//!     .unwrap();
//! println!("status: {}", result.status.as_str());
//! # }
//! ```

// Core types
pub mod constants;
pub mod encoding;
pub mod error;
pub mod request;
pub mod response;
pub mod types;

// Configuration and HTTP
pub mod client;
pub mod config;
pub mod transport;

// Waiting and retrying
pub mod poll;
pub mod retry;

// On-chain
pub mod state_connector;
pub mod verification;

use alloy::sol;

// State connector interface used to submit requests and track round finalisation.
sol! {
    #[sol(rpc)]
    interface IStateConnector {
        function requestAttestations(bytes calldata data) external;
        function lastFinalizedRoundId() external view returns (uint256);
        function BUFFER_TIMESTAMP_OFFSET() external view returns (uint256);
        function BUFFER_WINDOW() external view returns (uint256);
    }
}

// Verification contract that checks a Payment attestation against the finalised Merkle root.
sol! {
    #[sol(rpc)]
    interface IPaymentVerification {
        #[derive(Debug)]
        struct RequestBody {
            bytes32 transactionId;
            uint256 inUtxo;
            uint256 utxo;
        }

        #[derive(Debug)]
        struct ResponseBody {
            uint64 blockNumber;
            uint64 blockTimestamp;
            bytes32 sourceAddressHash;
            bytes32 receivingAddressHash;
            bytes32 intendedReceivingAddressHash;
            int256 spentAmount;
            int256 intendedSpentAmount;
            int256 receivedAmount;
            int256 intendedReceivedAmount;
            bytes32 standardPaymentReference;
            bool oneToOne;
            uint8 status;
        }

        #[derive(Debug)]
        struct Response {
            bytes32 attestationType;
            bytes32 sourceId;
            uint64 votingRound;
            uint64 lowestUsedTimestamp;
            RequestBody requestBody;
            ResponseBody responseBody;
        }

        #[derive(Debug)]
        struct Proof {
            bytes32[] merkleProof;
            Response data;
        }

        function verifyPayment(Proof calldata proof) external view returns (bool);
    }
}

// Re-exports
pub use client::AttestationClient;
pub use config::AttestationConfig;
pub use encoding::{address_hash, decode_identifier, encode_identifier, payment_reference};
pub use error::AttestationError;
pub use poll::PollPolicy;
pub use request::*;
pub use response::{
    AttestationResponse, AttestationResult, AttestationStatus, BlockRange, MerkleProof,
    PreparedRequest, ResponseBody,
};
pub use retry::{retry_fixed, RetryOutcome, RetryPolicy};
pub use transport::{HttpTransport, VerifierTransport};
pub use types::{AttestationEnvelope, AttestationIdentifier, AttestationType, RequestBody, SourceChain};
