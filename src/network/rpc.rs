// bitcoind JSON-RPC client

use crate::config::BitcoindConfig;
use crate::core::Hash256;
use crate::error::{Error, Result};
use crate::wallet::Address;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Satoshis per bitcoin
pub const COIN: u64 = 100_000_000;

/// Convert a BTC amount reported by bitcoind to satoshis, rounding to the
/// nearest satoshi
pub fn btc_to_sat(btc: f64) -> u64 {
    (btc * COIN as f64).round().max(0.0) as u64
}

/// Convert satoshis to the BTC amount bitcoind expects
pub fn sat_to_btc(sat: u64) -> f64 {
    sat as f64 / COIN as f64
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: P,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

/// Subset of `getnetworkinfo`
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkInfo {
    pub version: u64,
    pub subversion: String,
    pub protocolversion: u64,
}

/// One unspent output reported by `scantxoutset`
#[derive(Debug, Clone, Deserialize)]
pub struct ScannedUtxo {
    pub txid: String,
    pub vout: u32,
    #[serde(rename = "scriptPubKey")]
    pub script_pubkey: String,
    /// Value in BTC
    pub amount: f64,
    #[serde(default)]
    pub height: u64,
}

impl ScannedUtxo {
    pub fn value_sat(&self) -> u64 {
        btc_to_sat(self.amount)
    }
}

/// Result of `scantxoutset start`
#[derive(Debug, Clone, Deserialize)]
pub struct ScanResult {
    pub success: bool,
    #[serde(default)]
    pub unspents: Vec<ScannedUtxo>,
    /// Total in BTC
    pub total_amount: f64,
}

impl ScanResult {
    pub fn total_sat(&self) -> u64 {
        btc_to_sat(self.total_amount)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptPubKeyInfo {
    pub hex: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTxOutput {
    /// Value in BTC
    pub value: f64,
    pub n: u32,
    #[serde(rename = "scriptPubKey")]
    pub script_pubkey: ScriptPubKeyInfo,
}

/// Subset of verbose `getrawtransaction`
#[derive(Debug, Clone, Deserialize)]
pub struct RawTransactionInfo {
    pub txid: String,
    pub vout: Vec<RawTxOutput>,
    pub confirmations: Option<u64>,
}

impl RawTransactionInfo {
    /// First output paying exactly `script_pubkey`, as (index, satoshis)
    pub fn find_output(&self, script_pubkey: &[u8]) -> Option<(u32, u64)> {
        let wanted = hex::encode(script_pubkey);
        self.vout
            .iter()
            .find(|out| out.script_pubkey.hex.eq_ignore_ascii_case(&wanted))
            .map(|out| (out.n, btc_to_sat(out.value)))
    }
}

/// JSON-RPC client for a single bitcoind endpoint
pub struct RpcClient {
    http: reqwest::Client,
    url: String,
    user: String,
    pass: String,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(url: impl Into<String>, user: impl Into<String>, pass: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            user: user.into(),
            pass: pass.into(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Build a client from config; fails if no credentials are configured
    pub fn from_config(config: &BitcoindConfig) -> Result<Self> {
        let (user, pass) = config.credentials()?;
        Ok(Self::new(config.url(), user, pass))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call<T: DeserializeOwned, P: Serialize>(&self, method: &'static str, params: P) -> Result<T> {
        let request = JsonRpcRequest {
            jsonrpc: "1.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        log::debug!("RPC {} -> {}", method, self.url);

        // bitcoind answers RPC errors with HTTP 500 and a JSON body
        let response = self
            .http
            .post(&self.url)
            .basic_auth(&self.user, Some(&self.pass))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Rpc(format!("{} request failed: {}", method, e)))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Rpc(format!("{}: bitcoind rejected the credentials", method)));
        }

        let rpc_response: JsonRpcResponse<T> = response
            .json()
            .await
            .map_err(|e| Error::Rpc(format!("Failed to parse {} response: {}", method, e)))?;

        unpack(method, rpc_response)
    }

    pub async fn get_network_info(&self) -> Result<NetworkInfo> {
        self.call("getnetworkinfo", serde_json::json!([])).await
    }

    /// Scan the UTXO set for outputs paying `address`
    pub async fn scan_address(&self, address: &Address) -> Result<ScanResult> {
        let descriptor = format!("addr({})", address);
        let result: ScanResult = self.call("scantxoutset", ("start", [descriptor])).await?;
        if !result.success {
            return Err(Error::Rpc(format!("scantxoutset for {} did not complete", address)));
        }
        Ok(result)
    }

    /// Pay `amount_sat` to `address` from the node's wallet
    pub async fn send_to_address(&self, address: &Address, amount_sat: u64) -> Result<Hash256> {
        let txid: String = self
            .call("sendtoaddress", (address.as_str(), sat_to_btc(amount_sat)))
            .await?;
        Hash256::from_hex(&txid)
    }

    pub async fn get_raw_transaction(&self, txid: &Hash256) -> Result<RawTransactionInfo> {
        self.call("getrawtransaction", (txid.to_hex(), true)).await
    }

    pub async fn send_raw_transaction(&self, tx_hex: &str) -> Result<Hash256> {
        let txid: String = self.call("sendrawtransaction", [tx_hex]).await?;
        Hash256::from_hex(&txid)
    }
}

fn unpack<T>(method: &str, response: JsonRpcResponse<T>) -> Result<T> {
    if let Some(error) = response.error {
        return Err(Error::Rpc(format!(
            "{} failed with code {}: {}",
            method, error.code, error.message
        )));
    }
    response
        .result
        .ok_or_else(|| Error::Rpc(format!("{} returned no result", method)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_conversion() {
        assert_eq!(btc_to_sat(0.001), 100_000);
        assert_eq!(btc_to_sat(0.00099), 99_000);
        assert_eq!(btc_to_sat(21.0), 2_100_000_000);
        assert_eq!(btc_to_sat(0.1 + 0.2), 30_000_000);
        assert_eq!(sat_to_btc(100_000), 0.001);
        assert_eq!(btc_to_sat(sat_to_btc(123_456_789)), 123_456_789);
    }

    #[test]
    fn test_request_shape() {
        let request = JsonRpcRequest {
            jsonrpc: "1.0",
            id: 7,
            method: "scantxoutset",
            params: ("start", ["addr(tb1qexample)".to_string()]),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "jsonrpc": "1.0",
                "id": 7,
                "method": "scantxoutset",
                "params": ["start", ["addr(tb1qexample)"]]
            })
        );
    }

    #[test]
    fn test_scan_result() {
        let body = r#"{
            "result": {
                "success": true,
                "txouts": 9143,
                "height": 2000,
                "bestblock": "00",
                "unspents": [{
                    "txid": "0ae1bd19cf7b7c6be8a36d03b1557d78879dc6e519abfe02af9b31d8d3c0253c",
                    "vout": 0,
                    "scriptPubKey": "0020cfab3cd876c731e89daa4ae0623f6fb13a384082dadec6c58d84e5e529b710c6",
                    "desc": "addr(tb1q...)#xyz",
                    "amount": 0.00100000,
                    "coinbase": false,
                    "height": 1999
                }],
                "total_amount": 0.00100000
            },
            "error": null,
            "id": 1
        }"#;
        let response: JsonRpcResponse<ScanResult> = serde_json::from_str(body).unwrap();
        let scan = unpack("scantxoutset", response).unwrap();

        assert!(scan.success);
        assert_eq!(scan.total_sat(), 100_000);
        assert_eq!(scan.unspents.len(), 1);
        assert_eq!(scan.unspents[0].value_sat(), 100_000);
        assert_eq!(scan.unspents[0].height, 1999);
    }

    #[test]
    fn test_rpc_error() {
        let body = r#"{"result":null,"error":{"code":-5,"message":"No such mempool or blockchain transaction"},"id":1}"#;
        let response: JsonRpcResponse<RawTransactionInfo> = serde_json::from_str(body).unwrap();
        let err = unpack("getrawtransaction", response).unwrap_err();
        assert_eq!(
            err,
            Error::Rpc("getrawtransaction failed with code -5: No such mempool or blockchain transaction".to_string())
        );
    }

    #[test]
    fn test_find_output() {
        let body = r#"{
            "txid": "0ae1bd19cf7b7c6be8a36d03b1557d78879dc6e519abfe02af9b31d8d3c0253c",
            "vout": [
                {"value": 0.5, "n": 0, "scriptPubKey": {"hex": "00145c24dc2c43e37dd5f5354ff4e06d47cf1359ee12"}},
                {"value": 0.001, "n": 1, "scriptPubKey": {"hex": "0020CFAB3CD876C731E89DAA4AE0623F6FB13A384082DADEC6C58D84E5E529B710C6"}}
            ]
        }"#;
        let info: RawTransactionInfo = serde_json::from_str(body).unwrap();
        let script = hex::decode("0020cfab3cd876c731e89daa4ae0623f6fb13a384082dadec6c58d84e5e529b710c6").unwrap();

        assert_eq!(info.find_output(&script), Some((1, 100_000)));
        assert_eq!(info.find_output(&[0x51]), None);
        assert!(info.confirmations.is_none());
    }
}
