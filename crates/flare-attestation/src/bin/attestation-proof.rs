use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::providers::ProviderBuilder;
use alloy::signers::local::PrivateKeySigner;
use attestation::state_connector::{submit_request, wait_for_round_finalization};
use attestation::verification::verify_payment;
use attestation::{
    AttestationClient, AttestationConfig, AttestationIdentifier, AttestationType, PollPolicy,
    RequestBody, SourceChain,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AttestationConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });

    let key =
        std::env::var("EVM_PRIVATE_KEY").expect("EVM_PRIVATE_KEY environment variable is required");
    let signer: PrivateKeySigner = key.parse().expect("invalid EVM_PRIVATE_KEY");

    let rpc_url = std::env::var("RPC_URL").expect("RPC_URL environment variable is required");

    let connector: Address = std::env::var("STATE_CONNECTOR_ADDRESS")
        .expect("STATE_CONNECTOR_ADDRESS environment variable is required")
        .parse()
        .expect("invalid STATE_CONNECTOR_ADDRESS");

    let attestation_type = AttestationType::from(
        std::env::var("ATTESTATION_TYPE")
            .expect("ATTESTATION_TYPE environment variable is required")
            .as_str(),
    );
    let chain: SourceChain = std::env::var("SOURCE_CHAIN")
        .expect("SOURCE_CHAIN environment variable is required")
        .parse()
        .expect("invalid SOURCE_CHAIN");
    let request_body: RequestBody = serde_json::from_str(
        &std::env::var("REQUEST_BODY").expect("REQUEST_BODY environment variable is required"),
    )
    .expect("REQUEST_BODY must be a JSON object");

    let id = AttestationIdentifier::for_chain(attestation_type, chain, config.use_testnet);
    let client = AttestationClient::new(config).expect("invalid attestation config");

    println!("Preparing {} request on {}...", id.attestation_type, id.network);
    let prepared = client
        .prepare_request(&id, &request_body)
        .await
        .expect("prepareRequest failed");
    let Some(request_bytes) = prepared.abi_encoded_request else {
        eprintln!(
            "Verifier rejected the request (status {})",
            prepared.status.as_str()
        );
        std::process::exit(1);
    };

    let provider = ProviderBuilder::new()
        .wallet(EthereumWallet::from(signer))
        .connect_http(rpc_url.parse().expect("invalid RPC_URL"));

    println!("Submitting to state connector {connector}...");
    let submitted = submit_request(&provider, connector, &request_bytes)
        .await
        .expect("submission failed");
    println!("  tx:    {}", submitted.tx_hash);
    println!("  round: {}", submitted.round_id);

    println!("Waiting for round {} to finalize...", submitted.round_id);
    wait_for_round_finalization(&provider, connector, submitted.round_id, &PollPolicy::default())
        .await
        .expect("round did not finalize");

    let proof = client
        .get_specific_proof(submitted.round_id, &request_bytes)
        .await
        .expect("failed to fetch Merkle proof");

    println!("Merkle proof:");
    println!(
        "{}",
        serde_json::to_string_pretty(&proof).unwrap_or_default()
    );

    if id.attestation_type != AttestationType::Payment {
        return;
    }
    let Ok(verifier) = std::env::var("PAYMENT_VERIFICATION_ADDRESS") else {
        println!("PAYMENT_VERIFICATION_ADDRESS not set, skipping on-chain verification");
        return;
    };
    let verifier: Address = verifier
        .parse()
        .expect("invalid PAYMENT_VERIFICATION_ADDRESS");

    println!("Verifying proof with {verifier}...");
    let proved = verify_payment(&provider, verifier, &proof)
        .await
        .expect("verifyPayment failed");
    if proved {
        println!("  proof accepted");
    } else {
        eprintln!("  proof rejected");
        std::process::exit(1);
    }
}
