//! On-chain check of a Payment attestation against the finalised Merkle root.
//!
//! The attestation client returns the response as JSON with decimal-string
//! integers and hex hashes; [`payment_proof`] converts it into the ABI shape
//! `IPaymentVerification.verifyPayment` expects.

use alloy::primitives::{Address, B256, I256, U256};
use alloy::providers::Provider;
use serde::Deserialize;

use crate::constants::VIEW_CALL_TIMEOUT;
use crate::error::AttestationError;
use crate::response::{MerkleProof, PaymentBody};
use crate::IPaymentVerification;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentResponseJson {
    attestation_type: String,
    source_id: String,
    #[serde(deserialize_with = "crate::response::lenient::u64")]
    voting_round: u64,
    #[serde(deserialize_with = "crate::response::lenient::u64")]
    lowest_used_timestamp: u64,
    request_body: PaymentRequestJson,
    response_body: PaymentBody,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentRequestJson {
    transaction_id: String,
    #[serde(deserialize_with = "crate::response::lenient::string")]
    in_utxo: String,
    #[serde(deserialize_with = "crate::response::lenient::string")]
    utxo: String,
}

fn bytes32(value: &str, field: &str) -> Result<B256, AttestationError> {
    value
        .parse()
        .map_err(|e| AttestationError::Decode(format!("{field}: invalid bytes32 {value:?}: {e}")))
}

fn decimal<'a>(value: &'a str, field: &str) -> Result<&'a str, AttestationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AttestationError::Decode(format!("{field}: missing value")));
    }
    Ok(trimmed)
}

fn uint256(value: &str, field: &str) -> Result<U256, AttestationError> {
    U256::from_str_radix(decimal(value, field)?, 10)
        .map_err(|e| AttestationError::Decode(format!("{field}: invalid uint256 {value:?}: {e}")))
}

fn int256(value: &str, field: &str) -> Result<I256, AttestationError> {
    I256::from_dec_str(decimal(value, field)?)
        .map_err(|e| AttestationError::Decode(format!("{field}: invalid int256 {value:?}: {e}")))
}

/// Build the `verifyPayment` argument from a proof fetched for a Payment request.
pub fn payment_proof(proof: &MerkleProof) -> Result<IPaymentVerification::Proof, AttestationError> {
    let response = PaymentResponseJson::deserialize(&proof.response)
        .map_err(|e| AttestationError::Decode(format!("Payment proof response: {e}")))?;
    let request = &response.request_body;
    let body = &response.response_body;

    let status = decimal(&body.status, "status")?.parse::<u8>().map_err(|e| {
        AttestationError::Decode(format!("status: invalid uint8 {:?}: {e}", body.status))
    })?;

    Ok(IPaymentVerification::Proof {
        merkleProof: proof.proof_hashes()?,
        data: IPaymentVerification::Response {
            attestationType: bytes32(&response.attestation_type, "attestationType")?,
            sourceId: bytes32(&response.source_id, "sourceId")?,
            votingRound: response.voting_round,
            lowestUsedTimestamp: response.lowest_used_timestamp,
            requestBody: IPaymentVerification::RequestBody {
                transactionId: bytes32(&request.transaction_id, "transactionId")?,
                inUtxo: uint256(&request.in_utxo, "inUtxo")?,
                utxo: uint256(&request.utxo, "utxo")?,
            },
            responseBody: IPaymentVerification::ResponseBody {
                blockNumber: body.block_number,
                blockTimestamp: body.block_timestamp,
                sourceAddressHash: bytes32(&body.source_address_hash, "sourceAddressHash")?,
                receivingAddressHash: bytes32(
                    &body.receiving_address_hash,
                    "receivingAddressHash",
                )?,
                intendedReceivingAddressHash: bytes32(
                    &body.intended_receiving_address_hash,
                    "intendedReceivingAddressHash",
                )?,
                spentAmount: int256(&body.spent_amount, "spentAmount")?,
                intendedSpentAmount: int256(&body.intended_spent_amount, "intendedSpentAmount")?,
                receivedAmount: int256(&body.received_amount, "receivedAmount")?,
                intendedReceivedAmount: int256(
                    &body.intended_received_amount,
                    "intendedReceivedAmount",
                )?,
                standardPaymentReference: bytes32(
                    &body.standard_payment_reference,
                    "standardPaymentReference",
                )?,
                oneToOne: body.one_to_one,
                status,
            },
        },
    })
}

/// Ask the payment verification contract whether `proof` is included in its
/// round's finalised Merkle root.
pub async fn verify_payment<P: Provider>(
    provider: &P,
    verifier: Address,
    proof: &MerkleProof,
) -> Result<bool, AttestationError> {
    let proof = payment_proof(proof)?;
    let voting_round = proof.data.votingRound;
    let contract = IPaymentVerification::new(verifier, provider);

    let proved = tokio::time::timeout(VIEW_CALL_TIMEOUT, contract.verifyPayment(proof).call())
        .await
        .map_err(|_| {
            AttestationError::Chain(format!(
                "verifyPayment timed out after {}s",
                VIEW_CALL_TIMEOUT.as_secs()
            ))
        })?
        .map_err(|e| AttestationError::Chain(format!("verifyPayment failed: {e}")))?;

    tracing::info!(%verifier, voting_round, proved, "payment proof checked on-chain");
    Ok(proved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol_types::SolCall;
    use serde_json::json;

    fn hash(byte: u8) -> String {
        format!("0x{}", format!("{byte:02x}").repeat(32))
    }

    fn sample_proof() -> MerkleProof {
        MerkleProof {
            response: json!({
                "attestationType": format!("0x5061796d656e74{}", "0".repeat(50)),
                "sourceId": format!("0x74657374425443{}", "0".repeat(50)),
                "votingRound": "791508",
                "lowestUsedTimestamp": 1_729_665_000u64,
                "requestBody": {
                    "transactionId": hash(0x01),
                    "inUtxo": "8",
                    "utxo": 4
                },
                "responseBody": {
                    "blockNumber": "2583000",
                    "blockTimestamp": "1729665500",
                    "sourceAddressHash": hash(0x0a),
                    "receivingAddressHash": hash(0x0b),
                    "intendedReceivingAddressHash": hash(0x0b),
                    "spentAmount": "-15",
                    "intendedSpentAmount": "-15",
                    "receivedAmount": "1000",
                    "intendedReceivedAmount": "1000",
                    "standardPaymentReference": hash(0x00),
                    "oneToOne": true,
                    "status": "0"
                }
            }),
            merkle_proof: vec![hash(0x22), hash(0x33)],
        }
    }

    #[test]
    fn test_payment_proof_converts_fields() {
        let proof = payment_proof(&sample_proof()).unwrap();

        assert_eq!(
            proof.merkleProof,
            vec![B256::repeat_byte(0x22), B256::repeat_byte(0x33)]
        );
        let data = &proof.data;
        assert_eq!(data.attestationType, B256::right_padding_from(b"Payment"));
        assert_eq!(data.sourceId, B256::right_padding_from(b"testBTC"));
        assert_eq!(data.votingRound, 791_508);
        assert_eq!(data.lowestUsedTimestamp, 1_729_665_000);

        assert_eq!(data.requestBody.transactionId, B256::repeat_byte(0x01));
        assert_eq!(data.requestBody.inUtxo, U256::from(8u64));
        assert_eq!(data.requestBody.utxo, U256::from(4u64));

        let body = &data.responseBody;
        assert_eq!(body.blockNumber, 2_583_000);
        assert_eq!(body.blockTimestamp, 1_729_665_500);
        assert_eq!(body.sourceAddressHash, B256::repeat_byte(0x0a));
        assert_eq!(body.spentAmount, I256::from_dec_str("-15").unwrap());
        assert_eq!(body.receivedAmount, I256::from_dec_str("1000").unwrap());
        assert_eq!(body.standardPaymentReference, B256::ZERO);
        assert!(body.oneToOne);
        assert_eq!(body.status, 0);
    }

    #[test]
    fn test_call_matches_verifier_abi() {
        assert_eq!(
            IPaymentVerification::verifyPaymentCall::SIGNATURE,
            "verifyPayment((bytes32[],(bytes32,bytes32,uint64,uint64,(bytes32,uint256,uint256),\
             (uint64,uint64,bytes32,bytes32,bytes32,int256,int256,int256,int256,bytes32,bool,uint8))))"
        );

        let call = IPaymentVerification::verifyPaymentCall {
            proof: payment_proof(&sample_proof()).unwrap(),
        };
        let encoded = call.abi_encode();
        assert_eq!(&encoded[..4], IPaymentVerification::verifyPaymentCall::SELECTOR.as_slice());
    }

    #[test]
    fn test_missing_amount_is_decode_error() {
        let mut proof = sample_proof();
        proof.response["responseBody"]
            .as_object_mut()
            .unwrap()
            .remove("receivedAmount");
        match payment_proof(&proof) {
            Err(AttestationError::Decode(msg)) => assert!(msg.contains("receivedAmount"), "{msg}"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_short_hash_is_decode_error() {
        let mut proof = sample_proof();
        proof.response["requestBody"]["transactionId"] = json!("0x01c17d14");
        assert!(matches!(
            payment_proof(&proof),
            Err(AttestationError::Decode(_))
        ));

        let mut proof = sample_proof();
        proof.merkle_proof.push("0x1234".to_string());
        assert!(matches!(
            payment_proof(&proof),
            Err(AttestationError::Decode(_))
        ));
    }

    #[test]
    fn test_non_payment_response_is_decode_error() {
        let proof = MerkleProof {
            response: json!({ "attestationType": "0x41", "responseBody": { "isValid": true } }),
            merkle_proof: vec![],
        };
        assert!(matches!(
            payment_proof(&proof),
            Err(AttestationError::Decode(_))
        ));
    }
}
