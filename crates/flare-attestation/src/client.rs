//! Client for the verifier and attestation client HTTP APIs.

use std::time::Instant;

use crate::config::AttestationConfig;
use crate::constants::SPECIFIC_PROOF_PATH;
use crate::error::AttestationError;
use crate::poll::PollPolicy;
use crate::request::AttestationRequest;
use crate::response::{ApiEnvelope, AttestationResult, BlockRange, MerkleProof, PreparedRequest};
use crate::transport::{HttpTransport, VerifierTransport};
use crate::types::{AttestationIdentifier, RequestBody};

/// Stateless client: every call is a single request/response round trip.
///
/// Sequencing (prepare, submit on-chain, wait, fetch proof) is left to the
/// caller; see [`crate::state_connector`] for the on-chain half.
pub struct AttestationClient<T = HttpTransport> {
    transport: T,
    config: AttestationConfig,
}

impl AttestationClient<HttpTransport> {
    /// Build a client backed by `reqwest`.
    pub fn new(config: AttestationConfig) -> Result<Self, AttestationError> {
        config.validate()?;
        let transport = HttpTransport::new(config.api_key.clone(), config.request_timeout)?;
        Ok(Self { transport, config })
    }
}

impl<T: VerifierTransport> AttestationClient<T> {
    pub fn with_transport(config: AttestationConfig, transport: T) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &AttestationConfig {
        &self.config
    }

    fn verifier_endpoint(&self, id: &AttestationIdentifier, action: &str) -> String {
        format!(
            "{}/verifier/{}/{}/{}",
            self.config.verifier_url(&id.network),
            id.network,
            id.attestation_type,
            action
        )
    }

    async fn post_envelope(
        &self,
        id: &AttestationIdentifier,
        request_body: &RequestBody,
        action: &str,
    ) -> Result<serde_json::Value, AttestationError> {
        let envelope = id.envelope(request_body)?;
        let body = serde_json::to_value(&envelope)?;
        self.transport
            .post_json(&self.verifier_endpoint(id, action), &body)
            .await
    }

    /// Ask the verifier to ABI-encode a request for submission to the state connector.
    pub async fn prepare_request(
        &self,
        id: &AttestationIdentifier,
        request_body: &RequestBody,
    ) -> Result<PreparedRequest, AttestationError> {
        let raw = self.post_envelope(id, request_body, "prepareRequest").await?;
        let prepared: PreparedRequest = decode(raw, "prepareRequest")?;
        tracing::info!(
            attestation_type = %id.attestation_type,
            network = %id.network,
            status = prepared.status.as_str(),
            "prepared attestation request"
        );
        Ok(prepared)
    }

    /// Ask the verifier for the attestation response it would vote for.
    pub async fn prepare_response(
        &self,
        id: &AttestationIdentifier,
        request_body: &RequestBody,
    ) -> Result<AttestationResult, AttestationError> {
        let raw = self.post_envelope(id, request_body, "prepareResponse").await?;
        let result: AttestationResult = decode(raw, "prepareResponse")?;
        tracing::info!(
            attestation_type = %id.attestation_type,
            network = %id.network,
            status = result.status.as_str(),
            "prepared attestation response"
        );
        Ok(result)
    }

    /// [`Self::prepare_response`] for a typed request on the given network.
    pub async fn prepare_typed_response<R: AttestationRequest>(
        &self,
        network: &str,
        source_id: &str,
        request: &R,
    ) -> Result<AttestationResult, AttestationError> {
        let id = AttestationIdentifier::new(R::ATTESTATION_TYPE, network, source_id);
        self.prepare_response(&id, &request.to_request_body()?).await
    }

    /// First and last block the verifier's indexer has seen for `network`.
    pub async fn get_indexer_block_range(
        &self,
        network: &str,
    ) -> Result<BlockRange, AttestationError> {
        let url = format!(
            "{}/verifier/{}/api/indexer/block-range",
            self.config.verifier_url(network),
            network
        );
        let raw = self.transport.get_json(&url).await?;
        let envelope: ApiEnvelope<BlockRange> = decode(raw, "block-range")?;
        envelope.into_data("block-range")
    }

    /// Fetch the response and Merkle proof for a request in a finalised round.
    pub async fn get_specific_proof(
        &self,
        round_id: u64,
        request_bytes: &str,
    ) -> Result<MerkleProof, AttestationError> {
        let url = format!("{}{}", self.config.attestation_url(), SPECIFIC_PROOF_PATH);
        let body = serde_json::json!({
            "roundId": round_id,
            "requestBytes": request_bytes,
        });
        let raw = self.transport.post_json(&url, &body).await?;
        let envelope: ApiEnvelope<MerkleProof> = decode(raw, "get-specific-proof")?;
        envelope.into_data("get-specific-proof")
    }

    /// Poll the indexer until it has seen `target`, or give up after `policy.max_wait`.
    pub async fn wait_for_indexed_block(
        &self,
        network: &str,
        target: u64,
        policy: &PollPolicy,
    ) -> Result<BlockRange, AttestationError> {
        let started = Instant::now();

        loop {
            let range = self.get_indexer_block_range(network).await?;
            if range.last >= target {
                return Ok(range);
            }

            match policy.next_delay(started.elapsed()) {
                Some(delay) => {
                    tracing::warn!(
                        network,
                        target,
                        last = range.last,
                        "indexer behind target, waiting"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    return Err(AttestationError::IndexerTimeout {
                        network: network.to_string(),
                        target,
                        last_seen: Some(range.last),
                        waited_ms: started.elapsed().as_millis() as u64,
                    })
                }
            }
        }
    }
}

fn decode<D: serde::de::DeserializeOwned>(
    raw: serde_json::Value,
    what: &str,
) -> Result<D, AttestationError> {
    D::deserialize(&raw).map_err(|e| {
        let body: String = raw.to_string().chars().take(200).collect();
        AttestationError::Decode(format!("unexpected {what} response: {e}: {body}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::AddressValidityRequest;
    use crate::response::AttestationStatus;
    use crate::types::{AttestationType, SourceChain};
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Replays canned replies and records every call.
    #[derive(Default)]
    struct MockTransport {
        replies: Mutex<VecDeque<Result<Value, AttestationError>>>,
        calls: Mutex<Vec<(String, Option<Value>)>>,
    }

    impl MockTransport {
        fn replying(replies: Vec<Result<Value, AttestationError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::default(),
            }
        }

        fn next(&self) -> Result<Value, AttestationError> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AttestationError::Network("no reply queued".to_string())))
        }

        fn calls(&self) -> Vec<(String, Option<Value>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl VerifierTransport for MockTransport {
        async fn post_json(&self, url: &str, body: &Value) -> Result<Value, AttestationError> {
            self.calls
                .lock()
                .unwrap()
                .push((url.to_string(), Some(body.clone())));
            self.next()
        }

        async fn get_json(&self, url: &str) -> Result<Value, AttestationError> {
            self.calls.lock().unwrap().push((url.to_string(), None));
            self.next()
        }
    }

    fn config() -> AttestationConfig {
        let mut config = AttestationConfig::new("https://attest.example/", "key");
        config.evm_verifier_url = Some("https://evm.example".to_string());
        config
    }

    fn btc_payment() -> AttestationIdentifier {
        AttestationIdentifier::for_chain(AttestationType::Payment, SourceChain::Btc, true)
    }

    fn payment_body() -> RequestBody {
        json!({ "transactionId": "0x01c1", "inUtxo": "8", "utxo": "4" })
            .as_object()
            .unwrap()
            .clone()
    }

    #[tokio::test]
    async fn test_prepare_request_posts_envelope() {
        let transport = MockTransport::replying(vec![Ok(json!({
            "status": "VALID",
            "abiEncodedRequest": "0x5061"
        }))]);
        let client = AttestationClient::with_transport(config(), transport);

        let prepared = client
            .prepare_request(&btc_payment(), &payment_body())
            .await
            .unwrap();
        assert_eq!(prepared.status, AttestationStatus::Valid);
        assert_eq!(prepared.abi_encoded_request.as_deref(), Some("0x5061"));

        let calls = client.transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].0,
            "https://attest.example/verifier/btc/Payment/prepareRequest"
        );
        let sent = calls[0].1.as_ref().unwrap();
        assert_eq!(
            sent["attestationType"],
            format!("0x5061796d656e74{}", "0".repeat(50))
        );
        assert_eq!(sent["requestBody"], Value::Object(payment_body()));
    }

    #[tokio::test]
    async fn test_prepare_response_is_pass_through() {
        let raw = json!({
            "status": "VALID",
            "response": { "responseBody": { "blockNumber": "100" } }
        });
        let client = AttestationClient::with_transport(
            config(),
            MockTransport::replying(vec![Ok(raw.clone())]),
        );

        let result = client
            .prepare_response(&btc_payment(), &payment_body())
            .await
            .unwrap();
        assert_eq!(serde_json::to_value(&result).unwrap(), raw);
        assert_eq!(
            client.transport.calls()[0].0,
            "https://attest.example/verifier/btc/Payment/prepareResponse"
        );
    }

    #[tokio::test]
    async fn test_transport_errors_propagate_without_retry() {
        let client = AttestationClient::with_transport(
            config(),
            MockTransport::replying(vec![
                Err(AttestationError::Network("connection refused".to_string())),
                Err(AttestationError::Network("connection refused".to_string())),
            ]),
        );

        let err = client
            .prepare_request(&btc_payment(), &payment_body())
            .await
            .unwrap_err();
        assert!(matches!(err, AttestationError::Network(_)));
        assert_eq!(client.transport.calls().len(), 1);

        let err = client
            .prepare_response(&btc_payment(), &payment_body())
            .await
            .unwrap_err();
        assert!(matches!(err, AttestationError::Network(_)));
        assert_eq!(client.transport.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_wrong_shape_is_decode_error() {
        let client = AttestationClient::with_transport(
            config(),
            MockTransport::replying(vec![Ok(json!(["not", "an", "object"]))]),
        );
        let err = client
            .prepare_response(&btc_payment(), &payment_body())
            .await
            .unwrap_err();
        assert!(matches!(err, AttestationError::Decode(_)));
    }

    #[tokio::test]
    async fn test_decode_error_keeps_server_message() {
        let client = AttestationClient::with_transport(
            config(),
            MockTransport::replying(vec![Ok(json!({
                "statusCode": 401,
                "message": "Invalid API key",
                "error": "Unauthorized"
            }))]),
        );
        match client
            .prepare_response(&btc_payment(), &payment_body())
            .await
        {
            Err(AttestationError::Decode(msg)) => {
                assert!(msg.contains("missing field `status`"), "{msg}");
                assert!(msg.contains("Invalid API key"), "{msg}");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_oversized_source_id_never_hits_network() {
        let client = AttestationClient::with_transport(config(), MockTransport::default());
        let id = AttestationIdentifier::new("Payment", "btc", "x".repeat(33));
        let err = client
            .prepare_request(&id, &payment_body())
            .await
            .unwrap_err();
        assert!(matches!(err, AttestationError::EncodingOverflow { .. }));
        assert!(client.transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_eth_uses_evm_verifier() {
        let client = AttestationClient::with_transport(
            config(),
            MockTransport::replying(vec![Ok(json!({ "status": "INVALID" }))]),
        );
        let id = AttestationIdentifier::for_chain(AttestationType::EvmTransaction, SourceChain::Eth, true);
        let result = client
            .prepare_response(&id, &RequestBody::new())
            .await
            .unwrap();
        assert!(!result.is_valid());
        assert_eq!(
            client.transport.calls()[0].0,
            "https://evm.example/verifier/eth/EVMTransaction/prepareResponse"
        );
    }

    #[tokio::test]
    async fn test_prepare_typed_response() {
        let client = AttestationClient::with_transport(
            config(),
            MockTransport::replying(vec![Ok(json!({
                "status": "VALID",
                "response": { "responseBody": { "isValid": true, "standardAddress": "r9RL" } }
            }))]),
        );
        let request = AddressValidityRequest {
            address_str: "r9RL".to_string(),
        };
        let result = client
            .prepare_typed_response("xrp", "testXRP", &request)
            .await
            .unwrap();
        let body = result
            .typed_body(&AttestationType::AddressValidity)
            .unwrap();
        assert!(matches!(body, crate::response::ResponseBody::AddressValidity(ref b) if b.is_valid));

        let calls = client.transport.calls();
        assert_eq!(
            calls[0].0,
            "https://attest.example/verifier/xrp/AddressValidity/prepareResponse"
        );
        assert_eq!(calls[0].1.as_ref().unwrap()["requestBody"]["addressStr"], "r9RL");
    }

    #[tokio::test]
    async fn test_block_range_reads_data() {
        let client = AttestationClient::with_transport(
            config(),
            MockTransport::replying(vec![
                Ok(json!({ "status": "OK", "data": { "first": 100, "last": 250 } })),
                Ok(json!({ "status": "ERROR" })),
            ]),
        );
        let range = client.get_indexer_block_range("doge").await.unwrap();
        assert_eq!(range, BlockRange { first: 100, last: 250 });
        assert_eq!(
            client.transport.calls()[0],
            (
                "https://attest.example/verifier/doge/api/indexer/block-range".to_string(),
                None
            )
        );

        let err = client.get_indexer_block_range("doge").await.unwrap_err();
        assert!(err.to_string().contains("ERROR"));
    }

    #[tokio::test]
    async fn test_specific_proof() {
        let client = AttestationClient::with_transport(
            config(),
            MockTransport::replying(vec![Ok(json!({
                "status": "OK",
                "data": {
                    "response": { "attestationType": "0x50" },
                    "merkleProof": [format!("0x{}", "11".repeat(32))]
                }
            }))]),
        );
        let proof = client.get_specific_proof(791_508, "0xabcd").await.unwrap();
        assert_eq!(proof.merkle_proof.len(), 1);

        let calls = client.transport.calls();
        assert_eq!(
            calls[0].0,
            "https://attest.example/attestation-client/api/proof/get-specific-proof"
        );
        assert_eq!(
            calls[0].1,
            Some(json!({ "roundId": 791_508, "requestBytes": "0xabcd" }))
        );
    }

    #[tokio::test]
    async fn test_wait_for_indexed_block_polls_until_reached() {
        let client = AttestationClient::with_transport(
            config(),
            MockTransport::replying(vec![
                Ok(json!({ "data": { "first": 1, "last": 8 } })),
                Ok(json!({ "data": { "first": 1, "last": 9 } })),
                Ok(json!({ "data": { "first": 1, "last": 11 } })),
            ]),
        );
        let policy = PollPolicy {
            interval: Duration::from_millis(1),
            max_wait: Duration::from_secs(5),
        };
        let range = client
            .wait_for_indexed_block("xrp", 10, &policy)
            .await
            .unwrap();
        assert_eq!(range.last, 11);
        assert_eq!(client.transport.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_wait_for_indexed_block_times_out() {
        let replies = (0..50)
            .map(|_| Ok(json!({ "data": { "first": 1, "last": 4 } })))
            .collect();
        let client = AttestationClient::with_transport(config(), MockTransport::replying(replies));
        let policy = PollPolicy {
            interval: Duration::from_millis(5),
            max_wait: Duration::from_millis(20),
        };
        match client.wait_for_indexed_block("btc", 10, &policy).await {
            Err(AttestationError::IndexerTimeout {
                network,
                target,
                last_seen,
                ..
            }) => {
                assert_eq!(network, "btc");
                assert_eq!(target, 10);
                assert_eq!(last_seen, Some(4));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
