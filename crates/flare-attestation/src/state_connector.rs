//! On-chain half of the attestation flow: submit a prepared request to the
//! state connector, work out its voting round, and wait for finalisation.

use std::time::Instant;

use alloy::eips::BlockNumberOrTag;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::Provider;

use crate::constants::{TX_RECEIPT_TIMEOUT, TX_SEND_TIMEOUT};
use crate::error::AttestationError;
use crate::poll::PollPolicy;
use crate::IStateConnector;

/// Round layout reported by the state connector contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundTiming {
    /// Timestamp of the start of round 0, in seconds.
    pub offset: u64,
    /// Round length in seconds.
    pub window: u64,
}

impl RoundTiming {
    pub fn round_for(&self, timestamp: u64) -> Result<u64, AttestationError> {
        round_id_for_timestamp(timestamp, self.offset, self.window)
    }
}

/// A request accepted on-chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedRequest {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub round_id: u64,
}

/// Voting round containing `timestamp`: `floor((timestamp - offset) / window)`.
pub fn round_id_for_timestamp(
    timestamp: u64,
    offset: u64,
    window: u64,
) -> Result<u64, AttestationError> {
    if window == 0 {
        return Err(AttestationError::Config(
            "round window must be non-zero".to_string(),
        ));
    }
    let since_start = timestamp.checked_sub(offset).ok_or_else(|| {
        AttestationError::Chain(format!(
            "timestamp {timestamp} precedes the first round at {offset}"
        ))
    })?;
    Ok(since_start / window)
}

fn to_u64(value: U256, what: &str) -> Result<u64, AttestationError> {
    u64::try_from(value)
        .map_err(|_| AttestationError::Chain(format!("{what} does not fit in u64: {value}")))
}

/// Read `BUFFER_TIMESTAMP_OFFSET` and `BUFFER_WINDOW` from the contract.
pub async fn round_timing<P: Provider>(
    provider: &P,
    connector: Address,
) -> Result<RoundTiming, AttestationError> {
    let contract = IStateConnector::new(connector, provider);
    let offset = contract
        .BUFFER_TIMESTAMP_OFFSET()
        .call()
        .await
        .map_err(|e| AttestationError::Chain(format!("BUFFER_TIMESTAMP_OFFSET failed: {e}")))?;
    let window = contract
        .BUFFER_WINDOW()
        .call()
        .await
        .map_err(|e| AttestationError::Chain(format!("BUFFER_WINDOW failed: {e}")))?;

    Ok(RoundTiming {
        offset: to_u64(offset, "BUFFER_TIMESTAMP_OFFSET")?,
        window: to_u64(window, "BUFFER_WINDOW")?,
    })
}

pub async fn last_finalized_round_id<P: Provider>(
    provider: &P,
    connector: Address,
) -> Result<u64, AttestationError> {
    let contract = IStateConnector::new(connector, provider);
    let round = contract
        .lastFinalizedRoundId()
        .call()
        .await
        .map_err(|e| AttestationError::Chain(format!("lastFinalizedRoundId failed: {e}")))?;
    to_u64(round, "lastFinalizedRoundId")
}

/// Submit an ABI-encoded request (from `prepareRequest`) and return the
/// round it lands in.
pub async fn submit_request<P: Provider>(
    provider: &P,
    connector: Address,
    abi_encoded_request: &str,
) -> Result<SubmittedRequest, AttestationError> {
    let data: Bytes = abi_encoded_request
        .parse()
        .map_err(|e| AttestationError::Decode(format!("invalid abiEncodedRequest: {e}")))?;

    let timing = round_timing(provider, connector).await?;
    let contract = IStateConnector::new(connector, provider);

    let pending = tokio::time::timeout(TX_SEND_TIMEOUT, contract.requestAttestations(data).send())
        .await
        .map_err(|_| {
            AttestationError::Chain(format!(
                "requestAttestations send timed out after {}s",
                TX_SEND_TIMEOUT.as_secs()
            ))
        })?
        .map_err(|e| AttestationError::Chain(format!("requestAttestations send failed: {e}")))?;

    let receipt = tokio::time::timeout(TX_RECEIPT_TIMEOUT, pending.get_receipt())
        .await
        .map_err(|_| {
            AttestationError::Chain(format!(
                "requestAttestations receipt timed out after {}s",
                TX_RECEIPT_TIMEOUT.as_secs()
            ))
        })?
        .map_err(|e| AttestationError::Chain(format!("requestAttestations receipt failed: {e}")))?;

    if !receipt.status() {
        return Err(AttestationError::Chain(
            "requestAttestations reverted".to_string(),
        ));
    }

    let block_number = receipt
        .block_number
        .ok_or_else(|| AttestationError::Chain("receipt has no block number".to_string()))?;
    let block = provider
        .get_block_by_number(BlockNumberOrTag::Number(block_number))
        .await
        .map_err(|e| AttestationError::Chain(format!("get block {block_number} failed: {e}")))?
        .ok_or_else(|| AttestationError::Chain(format!("block {block_number} not found")))?;

    let round_id = timing.round_for(block.header.timestamp)?;
    tracing::info!(
        tx = %receipt.transaction_hash,
        block_number,
        round_id,
        "attestation request submitted"
    );

    Ok(SubmittedRequest {
        tx_hash: receipt.transaction_hash,
        block_number,
        round_id,
    })
}

/// Poll `lastFinalizedRoundId` until it reaches `round_id`.
pub async fn wait_for_round_finalization<P: Provider>(
    provider: &P,
    connector: Address,
    round_id: u64,
    policy: &PollPolicy,
) -> Result<u64, AttestationError> {
    let started = Instant::now();

    loop {
        let finalized = last_finalized_round_id(provider, connector).await?;
        if finalized >= round_id {
            return Ok(finalized);
        }

        match policy.next_delay(started.elapsed()) {
            Some(delay) => {
                tracing::warn!(round_id, finalized, "round not finalized yet, waiting");
                tokio::time::sleep(delay).await;
            }
            None => {
                return Err(AttestationError::RoundNotFinalized {
                    round_id,
                    last_finalized: Some(finalized),
                    waited_ms: started.elapsed().as_millis() as u64,
                })
            }
        }
    }
}
