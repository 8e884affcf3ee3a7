// Transaction broadcast

use crate::core::Hash256;
use crate::error::Result;
use crate::network::rpc::RpcClient;
use crate::puzzle::SerializedTransaction;
use async_trait::async_trait;

#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Submit a finalized transaction, returning the txid the network saw
    async fn broadcast(&self, tx: &SerializedTransaction) -> Result<Hash256>;
}

/// Logs the transaction instead of sending it
#[derive(Debug, Default)]
pub struct DryRunBroadcaster;

#[async_trait]
impl Broadcaster for DryRunBroadcaster {
    async fn broadcast(&self, tx: &SerializedTransaction) -> Result<Hash256> {
        log::info!("Dry run: not broadcasting {} ({} vbytes)", tx.txid(), tx.vsize());
        Ok(tx.txid())
    }
}

#[async_trait]
impl Broadcaster for RpcClient {
    async fn broadcast(&self, tx: &SerializedTransaction) -> Result<Hash256> {
        let txid = self.send_raw_transaction(&tx.to_hex()).await?;
        if txid != tx.txid() {
            log::warn!("Node reported txid {} for local txid {}", txid, tx.txid());
        }
        log::info!("Broadcast {} via {}", txid, self.url());
        Ok(txid)
    }
}
