//! JSON-RPC plumbing shared by the HTTP chain client.

use std::time::Duration;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Default timeout for a single RPC request.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Create an HTTP client configured for JSON-RPC requests.
pub fn create_client() -> Result<reqwest::Client, anyhow::Error> {
    reqwest::Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .build()
        .context("Failed to create HTTP client")
}

/// Make a JSON-RPC call and deserialize the result.
///
/// An error object in the response body is surfaced with its code and
/// message; `"result": null` deserializes cleanly into `Option::None` for
/// callers polling receipts that do not exist yet.
pub async fn json_rpc_call<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    params: Vec<Value>,
) -> Result<T, anyhow::Error> {
    let response = client
        .post(url)
        .json(&serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        }))
        .send()
        .await
        .with_context(|| format!("Failed to send {} request", method))?;

    let body: Value = response
        .json()
        .await
        .with_context(|| format!("Failed to parse {} response", method))?;

    if let Some(error) = body.get("error") {
        let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        anyhow::bail!("RPC error from {} (code {}): {}", method, code, message);
    }

    let result = body
        .get("result")
        .with_context(|| format!("No result in {} response", method))?
        .clone();

    serde_json::from_value(result)
        .with_context(|| format!("Failed to deserialize {} result", method))
}

/// Parse a `0x`-prefixed hex quantity as u64, as returned by `eth_chainId`
/// and block-number fields.
pub fn parse_hex_u64(raw: &str) -> Result<u64, anyhow::Error> {
    let digits = raw
        .strip_prefix("0x")
        .with_context(|| format!("Expected 0x-prefixed quantity, got '{raw}'"))?;
    u64::from_str_radix(digits, 16).with_context(|| format!("Invalid hex quantity '{raw}'"))
}

/// Deserialize a u64 from a hex quantity string.
pub fn deserialize_u64_from_hex<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = serde::Deserialize::deserialize(deserializer)?;
    parse_hex_u64(&s).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_u64() {
        assert_eq!(parse_hex_u64("0x61").unwrap(), 97);
        assert_eq!(parse_hex_u64("0x0").unwrap(), 0);
        assert_eq!(parse_hex_u64("0xde").unwrap(), 222);
        assert!(parse_hex_u64("61").is_err());
        assert!(parse_hex_u64("0xzz").is_err());
    }
}
