//! Client configuration, built once at startup and passed into the client.

use std::collections::HashMap;
use std::time::Duration;

use crate::constants::DEFAULT_REQUEST_TIMEOUT;
use crate::error::AttestationError;
use crate::types::SourceChain;

/// Settings for talking to the attestation client and verifier services.
#[derive(Debug, Clone)]
pub struct AttestationConfig {
    /// Base URL of the attestation service (env: ATTESTATION_URL).
    pub attestation_url: String,
    /// API key sent as `X-API-KEY` (env: ATTESTATION_API_KEY).
    pub api_key: String,
    /// Base URL of the EVM verifier, used for the `eth` network (env: EVM_VERIFIER_URL).
    pub evm_verifier_url: Option<String>,
    /// Use testnet source ids such as `testBTC` (env: USE_TESTNET_ATTESTATIONS, default: true).
    ///
    /// Only `false` or `0` select mainnet ids. The Flare demo scripts read this
    /// variable the other way round and pick testnet when it is `"false"`.
    pub use_testnet: bool,
    /// Per-network verifier base URLs (env: VERIFIER_URL_<NETWORK>).
    pub verifier_overrides: HashMap<String, String>,
    /// Per-request timeout (env: ATTESTATION_TIMEOUT_SECS, default: 30).
    pub request_timeout: Duration,
}

impl AttestationConfig {
    pub fn new(attestation_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            attestation_url: attestation_url.into(),
            api_key: api_key.into(),
            evm_verifier_url: None,
            use_testnet: true,
            verifier_overrides: HashMap::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AttestationError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self, AttestationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

        let attestation_url = non_empty("ATTESTATION_URL")
            .ok_or_else(|| AttestationError::Config("ATTESTATION_URL is required".to_string()))?;
        let api_key = non_empty("ATTESTATION_API_KEY").ok_or_else(|| {
            AttestationError::Config("ATTESTATION_API_KEY is required".to_string())
        })?;

        let use_testnet = non_empty("USE_TESTNET_ATTESTATIONS")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let request_timeout = match non_empty("ATTESTATION_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.parse().map_err(|_| {
                AttestationError::Config(format!("invalid ATTESTATION_TIMEOUT_SECS: {raw}"))
            })?),
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        let verifier_overrides = SourceChain::ALL
            .iter()
            .filter_map(|chain| {
                let key = format!("VERIFIER_URL_{}", chain.network().to_uppercase());
                non_empty(&key).map(|url| (chain.network().to_string(), url))
            })
            .collect();

        let config = Self {
            attestation_url,
            api_key,
            evm_verifier_url: non_empty("EVM_VERIFIER_URL"),
            use_testnet,
            verifier_overrides,
            request_timeout,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that every configured URL is an absolute http(s) URL.
    pub fn validate(&self) -> Result<(), AttestationError> {
        if self.api_key.is_empty() {
            return Err(AttestationError::Config("API key is empty".to_string()));
        }
        check_url("attestation url", &self.attestation_url)?;
        if let Some(url) = &self.evm_verifier_url {
            check_url("EVM verifier url", url)?;
        }
        for (network, url) in &self.verifier_overrides {
            check_url(&format!("{network} verifier url"), url)?;
        }
        Ok(())
    }

    /// Base URL serving `/verifier/{network}/...` for the given network.
    pub fn verifier_url(&self, network: &str) -> &str {
        let base = self
            .verifier_overrides
            .get(network)
            .or_else(|| {
                (network == SourceChain::Eth.network())
                    .then_some(self.evm_verifier_url.as_ref())
                    .flatten()
            })
            .unwrap_or(&self.attestation_url);
        base.trim_end_matches('/')
    }

    /// Base URL of the attestation client service (Merkle proofs).
    pub fn attestation_url(&self) -> &str {
        self.attestation_url.trim_end_matches('/')
    }
}

fn check_url(label: &str, raw: &str) -> Result<(), AttestationError> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| AttestationError::Config(format!("invalid {label} {raw:?}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(AttestationError::Config(format!(
            "{label} must be http or https, got {other}"
        ))),
    }
}
