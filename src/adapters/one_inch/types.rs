//! 1inch API Types
//!
//! Response structures for the quote, token-list and balance endpoints.
//! Amounts arrive as decimal strings and are parsed into `u128`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::TokenMetadata;
use crate::ports::{OracleError, Quote};

/// Response from the quote endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    /// Output amount in base units (`toAmount` on the older API version)
    #[serde(alias = "toAmount")]
    pub dst_amount: String,
    /// Estimated gas units, when requested
    #[serde(default)]
    pub gas: Option<u64>,
    /// Catch-all for any additional fields from the API
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl QuoteResponse {
    /// Convert into a port quote for the requested input amount
    pub fn into_quote(self, amount_in: u128) -> Result<Quote, OracleError> {
        let amount_out = parse_amount(&self.dst_amount)?;
        Ok(Quote {
            amount_in,
            amount_out,
            gas: self.gas,
        })
    }
}

/// One entry of the token-list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    pub address: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    #[serde(default, rename = "logoURI")]
    pub logo_uri: Option<String>,
}

impl From<TokenInfo> for TokenMetadata {
    fn from(info: TokenInfo) -> Self {
        TokenMetadata::new(info.name, info.symbol, info.decimals)
    }
}

/// Response from the token-list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenListResponse {
    pub tokens: HashMap<String, TokenInfo>,
}

impl TokenListResponse {
    /// Token metadata keyed by lowercase address
    pub fn into_metadata(self) -> HashMap<String, TokenMetadata> {
        self.tokens
            .into_iter()
            .map(|(address, info)| (address.to_lowercase(), info.into()))
            .collect()
    }
}

/// Parse a decimal amount string in base units
pub fn parse_amount(raw: &str) -> Result<u128, OracleError> {
    raw.trim()
        .parse::<u128>()
        .map_err(|e| OracleError::ParseError(format!("Invalid amount '{}': {}", raw, e)))
}

/// Parse the balance endpoint body (`address -> amount string`), dropping zero balances
pub fn parse_balances(raw: HashMap<String, String>) -> Result<HashMap<String, u128>, OracleError> {
    let mut balances = HashMap::new();
    for (address, amount) in raw {
        let amount = parse_amount(&amount)?;
        if amount > 0 {
            balances.insert(address.to_lowercase(), amount);
        }
    }
    Ok(balances)
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUOTE_V6: &str = r#"{
        "dstAmount": "1543218876120931",
        "gas": 182000,
        "protocols": [[[{"name": "UNISWAP_V3", "part": 100}]]]
    }"#;

    const QUOTE_V5: &str = r#"{
        "fromToken": {"symbol": "MATIC"},
        "toToken": {"symbol": "USDC"},
        "toAmount": "950"
    }"#;

    const TOKENS: &str = r#"{
        "tokens": {
            "0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174": {
                "address": "0x2791bca1f2de4661ed88a30c99a7a9449aa84174",
                "symbol": "USDC",
                "name": "USD Coin",
                "decimals": 6,
                "logoURI": "https://tokens.1inch.io/usdc.png",
                "tags": ["tokens"]
            },
            "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee": {
                "address": "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee",
                "symbol": "MATIC",
                "name": "Polygon",
                "decimals": 18
            }
        }
    }"#;

    #[test]
    fn test_parse_quote_v6() {
        let response: QuoteResponse = serde_json::from_str(QUOTE_V6).unwrap();
        assert!(response.extra.contains_key("protocols"));

        let quote = response.into_quote(10u128.pow(12)).unwrap();
        assert_eq!(quote.amount_out, 1_543_218_876_120_931);
        assert_eq!(quote.gas, Some(182_000));
        assert_eq!(quote.amount_in, 10u128.pow(12));
    }

    #[test]
    fn test_parse_quote_legacy_field() {
        let response: QuoteResponse = serde_json::from_str(QUOTE_V5).unwrap();
        let quote = response.into_quote(1000).unwrap();
        assert_eq!(quote.price(), 950);
        assert_eq!(quote.gas, None);
    }

    #[test]
    fn test_quote_with_garbage_amount() {
        let response: QuoteResponse =
            serde_json::from_str(r#"{"dstAmount": "12.5"}"#).unwrap();
        assert!(matches!(
            response.into_quote(1),
            Err(OracleError::ParseError(_))
        ));
    }

    #[test]
    fn test_parse_token_list() {
        let response: TokenListResponse = serde_json::from_str(TOKENS).unwrap();
        let metadata = response.into_metadata();

        assert_eq!(metadata.len(), 2);
        let usdc = &metadata["0x2791bca1f2de4661ed88a30c99a7a9449aa84174"];
        assert_eq!(usdc.symbol, "USDC");
        assert_eq!(usdc.decimals, 6);
    }

    #[test]
    fn test_parse_balances_drops_zero() {
        let raw = HashMap::from([
            ("0xAAA".to_string(), "0".to_string()),
            ("0xBBB".to_string(), "340282366920938463463374607431768211455".to_string()),
        ]);
        let balances = parse_balances(raw).unwrap();
        assert_eq!(balances.len(), 1);
        assert_eq!(balances["0xbbb"], u128::MAX);
    }

    #[test]
    fn test_parse_balances_rejects_bad_amount() {
        let raw = HashMap::from([("0xAAA".to_string(), "-1".to_string())]);
        assert!(parse_balances(raw).is_err());
    }
}
