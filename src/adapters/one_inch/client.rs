//! 1inch API Client
//!
//! HTTP client for the 1inch aggregator API. Serves price quotes, the
//! per-chain token list and wallet balances. One client per chain.
//!
//! Every request is a single attempt. A rate-limited or failed call surfaces
//! as an error and the worker tries the token again on its next pass.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use super::types::{parse_balances, QuoteResponse, TokenListResponse};
use crate::domain::TokenMetadata;
use crate::ports::{ChainCatalog, ExecutionError, OracleError, PriceOracle, Quote, WalletInspector};

/// 1inch client configuration
#[derive(Debug, Clone)]
pub struct OneInchConfig {
    /// Base URL of the 1inch API
    pub api_base_url: String,
    /// Bearer token from the developer portal
    pub api_key: Option<String>,
    /// Wallet whose balances are reported
    pub wallet_address: Option<String>,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for OneInchConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.1inch.dev".to_string(),
            api_key: None,
            wallet_address: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// 1inch aggregator client bound to one chain
#[derive(Debug, Clone)]
pub struct OneInchClient {
    config: OneInchConfig,
    chain_id: u64,
    http: Client,
}

impl OneInchClient {
    pub fn new(config: OneInchConfig, chain_id: u64) -> Result<Self, OracleError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| OracleError::RestError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            chain_id,
            http,
        })
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn quote_url(&self) -> String {
        format!("{}/swap/v6.0/{}/quote", self.config.api_base_url, self.chain_id)
    }

    pub fn tokens_url(&self, chain_id: u64) -> String {
        format!("{}/swap/v6.0/{}/tokens", self.config.api_base_url, chain_id)
    }

    pub fn balances_url(&self, wallet: &str) -> String {
        format!(
            "{}/balance/v1.2/{}/balances/{}",
            self.config.api_base_url, self.chain_id, wallet
        )
    }

    /// Quote `amount` of `src` into `dst`
    pub async fn get_quote(&self, src: &str, dst: &str, amount: u128) -> Result<Quote, OracleError> {
        let amount_str = amount.to_string();
        let req = self.http.get(self.quote_url()).query(&[
            ("src", src),
            ("dst", dst),
            ("amount", amount_str.as_str()),
            ("includeGas", "true"),
        ]);

        let response: QuoteResponse = self.send(req).await?;
        response.into_quote(amount)
    }

    /// Tradable tokens of `chain_id`
    pub async fn get_tokens(&self, chain_id: u64) -> Result<HashMap<String, TokenMetadata>, OracleError> {
        let req = self.http.get(self.tokens_url(chain_id));
        let response: TokenListResponse = self.send(req).await?;
        Ok(response.into_metadata())
    }

    /// Non-zero balances of the configured wallet
    pub async fn get_balances(&self) -> Result<HashMap<String, u128>, OracleError> {
        let wallet = self
            .config
            .wallet_address
            .as_deref()
            .ok_or_else(|| OracleError::Unsupported("No wallet address configured".into()))?;

        let req = self.http.get(self.balances_url(wallet));
        let raw: HashMap<String, String> = self.send(req).await?;
        parse_balances(raw)
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, OracleError> {
        let req = match self.config.api_key {
            Some(ref api_key) => req.bearer_auth(api_key),
            None => req,
        };

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                OracleError::Timeout
            } else {
                OracleError::RestError(e.to_string())
            }
        })?;

        self.handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, OracleError> {
        let status = response.status();

        if let Some(err) = status_error(status) {
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!("1inch request failed with {}: {}", status, error_text);
            return Err(match err {
                OracleError::RestError(msg) => {
                    OracleError::RestError(format!("{}: {}", msg, error_text))
                }
                other => other,
            });
        }

        response
            .json()
            .await
            .map_err(|e| OracleError::ParseError(format!("Failed to parse response: {}", e)))
    }
}

/// Map a non-success status to its oracle error
fn status_error(status: StatusCode) -> Option<OracleError> {
    if status.is_success() {
        None
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        // 1inch allows one request per second on the free tier
        Some(OracleError::RateLimited("Rate limit exceeded".into()))
    } else {
        Some(OracleError::RestError(format!("API error {}", status)))
    }
}

#[async_trait]
impl PriceOracle for OneInchClient {
    async fn quote(
        &self,
        token_id: &str,
        reference_id: &str,
        amount: u128,
    ) -> Result<Quote, OracleError> {
        // The price is how much of the token one reference amount buys
        self.get_quote(reference_id, token_id, amount).await
    }
}

#[async_trait]
impl ChainCatalog for OneInchClient {
    async fn discover_tokens(
        &self,
        chain_id: u64,
    ) -> Result<HashMap<String, TokenMetadata>, OracleError> {
        self.get_tokens(chain_id).await
    }
}

#[async_trait]
impl WalletInspector for OneInchClient {
    async fn balances(&self) -> Result<HashMap<String, u128>, ExecutionError> {
        self.get_balances()
            .await
            .map_err(|e| ExecutionError::ApiError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(wallet: Option<&str>) -> OneInchClient {
        let config = OneInchConfig {
            api_base_url: "http://127.0.0.1:9".to_string(),
            wallet_address: wallet.map(str::to_string),
            timeout: Duration::from_millis(200),
            ..OneInchConfig::default()
        };
        OneInchClient::new(config, 137).unwrap()
    }

    #[test]
    fn test_endpoint_urls() {
        let client = client(Some("0xwallet"));
        assert_eq!(client.quote_url(), "http://127.0.0.1:9/swap/v6.0/137/quote");
        assert_eq!(client.tokens_url(8453), "http://127.0.0.1:9/swap/v6.0/8453/tokens");
        assert_eq!(
            client.balances_url("0xwallet"),
            "http://127.0.0.1:9/balance/v1.2/137/balances/0xwallet"
        );
    }

    #[tokio::test]
    async fn test_balances_without_wallet() {
        let client = client(None);
        let err = client.get_balances().await.unwrap_err();
        assert!(matches!(err, OracleError::Unsupported(_)));
    }

    #[test]
    fn test_status_mapping() {
        assert!(status_error(StatusCode::OK).is_none());
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS),
            Some(OracleError::RateLimited(_))
        ));
        match status_error(StatusCode::SERVICE_UNAVAILABLE) {
            Some(OracleError::RestError(msg)) => assert!(msg.contains("503")),
            other => panic!("expected a rest error, got {:?}", other),
        }
        assert!(matches!(
            status_error(StatusCode::BAD_REQUEST),
            Some(OracleError::RestError(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_api_fails_in_one_attempt() {
        let client = client(None);
        let started = std::time::Instant::now();
        assert!(client.quote("0xtoken", "0xnative", 1000).await.is_err());
        // A single attempt with no sleep before the error
        assert!(started.elapsed() < Duration::from_millis(500));
    }
}
