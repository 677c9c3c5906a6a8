use attestation::{
    AttestationClient, AttestationConfig, AttestationIdentifier, AttestationType, RequestBody,
    SourceChain,
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

    let mode = std::env::var("PREPARE_MODE").unwrap_or_else(|_| "response".to_string());

    let id = AttestationIdentifier::for_chain(attestation_type, chain, config.use_testnet);
    let client = AttestationClient::new(config).expect("invalid attestation config");

    println!(
        "{} {} on {} ({})",
        mode, id.attestation_type, id.network, id.source_id
    );

    let printed = match mode.as_str() {
        "request" => client
            .prepare_request(&id, &request_body)
            .await
            .and_then(|prepared| Ok(serde_json::to_string_pretty(&prepared)?)),
        "response" => client
            .prepare_response(&id, &request_body)
            .await
            .and_then(|result| {
                if let Ok(body) = result.typed_body(&id.attestation_type) {
                    tracing::info!(block = ?body.block_number(), "typed response body decoded");
                }
                Ok(serde_json::to_string_pretty(&result)?)
            }),
        other => {
            eprintln!("Error: PREPARE_MODE must be `request` or `response`, got {other:?}");
            std::process::exit(1);
        }
    };

    match printed {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
