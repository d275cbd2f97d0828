use anyhow::{bail, Context};

use lifeboat_core::transaction::Transaction;
use lifeboat_core::types::Address;
use lifeboat_rpc::{RpcAccount, RpcTokenInfo};

/// Minimal JSON-RPC 2.0 client the wallet uses to talk to a running node.
pub struct WalletRpcClient {
    url: String,
    client: reqwest::Client,
}

impl WalletRpcClient {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Call a JSON-RPC method and return the `result` field.
    async fn call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> anyhow::Result<serde_json::Value> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("connecting to node at {}", self.url))?;

        let json: serde_json::Value = resp.json().await.context("parsing RPC response")?;

        if let Some(err) = json.get("error") {
            bail!("RPC error: {}", err);
        }

        Ok(json["result"].clone())
    }

    pub async fn get_nonce(&self, address: &Address) -> anyhow::Result<u64> {
        let result = self
            .call("lifeboat_getNonce", serde_json::json!([address.to_hex()]))
            .await?;
        result.as_u64().context("expected integer nonce")
    }

    pub async fn get_account(&self, address: &Address) -> anyhow::Result<RpcAccount> {
        let result = self
            .call("lifeboat_getAccount", serde_json::json!([address.to_hex()]))
            .await?;
        serde_json::from_value(result).context("parsing account response")
    }

    pub async fn get_allowance(&self, owner: &Address, spender: &Address) -> anyhow::Result<u128> {
        let result = self
            .call(
                "lifeboat_getAllowance",
                serde_json::json!([owner.to_hex(), spender.to_hex()]),
            )
            .await?;
        let s = result.as_str().context("expected string allowance")?;
        s.parse().context("parsing allowance")
    }

    pub async fn get_token_info(&self) -> anyhow::Result<RpcTokenInfo> {
        let result = self
            .call("lifeboat_getTokenInfo", serde_json::json!([]))
            .await?;
        serde_json::from_value(result).context("parsing token info")
    }

    /// Submit a signed transaction. Returns the transaction hash hex.
    pub async fn send_transaction(&self, tx: &Transaction) -> anyhow::Result<String> {
        let bytes = bincode::serialize(tx).context("serializing transaction")?;
        let tx_hex = hex::encode(&bytes);

        let result = self
            .call("lifeboat_sendTransaction", serde_json::json!([tx_hex]))
            .await?;

        result
            .as_str()
            .map(|s| s.to_string())
            .context("expected tx hash string from sendTransaction")
    }
}
