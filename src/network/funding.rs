// Funding sources for the game output

use crate::core::{Hash256, OutPoint};
use crate::error::{Error, Result};
use crate::network::rpc::{RpcClient, ScanResult};
use crate::wallet::Address;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// The output that holds the game funds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FundedOutput {
    pub outpoint: OutPoint,
    pub value_sat: u64,
}

/// Where the game output comes from
#[async_trait]
pub trait FundingSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether `address` already holds at least `min_sat`
    async fn has_sufficient_balance(&self, address: &Address, min_sat: u64) -> Result<bool>;

    /// Locate (or create) an output of at least `min_sat` paying
    /// `output_script` at `address`
    async fn funding_outpoint(
        &self,
        address: &Address,
        output_script: &[u8],
        min_sat: u64,
    ) -> Result<FundedOutput>;
}

/// Anything that can list the unspent outputs of an address
#[async_trait]
pub trait UtxoScanner: Send + Sync {
    async fn scan_address(&self, address: &Address) -> Result<ScanResult>;
}

#[async_trait]
impl UtxoScanner for RpcClient {
    async fn scan_address(&self, address: &Address) -> Result<ScanResult> {
        RpcClient::scan_address(self, address).await
    }
}

/// Largest scanned output paying `output_script` with at least `min_sat`
pub fn largest_matching(scan: &ScanResult, output_script: &[u8], min_sat: u64) -> Result<Option<FundedOutput>> {
    let wanted = hex::encode(output_script);
    let best = scan
        .unspents
        .iter()
        .filter(|utxo| utxo.script_pubkey.eq_ignore_ascii_case(&wanted))
        .filter(|utxo| utxo.value_sat() >= min_sat)
        .max_by_key(|utxo| utxo.value_sat());

    match best {
        Some(utxo) => Ok(Some(FundedOutput {
            outpoint: OutPoint::new(Hash256::from_hex(&utxo.txid)?, utxo.vout),
            value_sat: utxo.value_sat(),
        })),
        None => Ok(None),
    }
}

/// Operator funded the address out of band and supplied the outpoint
pub struct ManualFunding {
    funded: FundedOutput,
}

impl ManualFunding {
    pub fn new(outpoint: OutPoint, value_sat: u64) -> Self {
        Self {
            funded: FundedOutput { outpoint, value_sat },
        }
    }
}

#[async_trait]
impl FundingSource for ManualFunding {
    fn name(&self) -> &'static str {
        "manual"
    }

    async fn has_sufficient_balance(&self, _address: &Address, min_sat: u64) -> Result<bool> {
        Ok(self.funded.value_sat >= min_sat)
    }

    async fn funding_outpoint(
        &self,
        address: &Address,
        _output_script: &[u8],
        min_sat: u64,
    ) -> Result<FundedOutput> {
        if self.funded.value_sat < min_sat {
            log::warn!(
                "Outpoint {} holds {} sat, less than the {} sat game amount",
                self.funded.outpoint,
                self.funded.value_sat,
                min_sat
            );
        }
        log::info!(
            "Using operator-supplied outpoint {} ({} sat) for {}",
            self.funded.outpoint,
            self.funded.value_sat,
            address
        );
        Ok(self.funded)
    }
}

/// Poll the UTXO set until someone funds the address
pub struct RpcPollFunding<S: UtxoScanner = RpcClient> {
    scanner: Arc<S>,
    interval: Duration,
    timeout: Duration,
}

impl<S: UtxoScanner> RpcPollFunding<S> {
    pub fn new(scanner: Arc<S>, interval: Duration, timeout: Duration) -> Self {
        Self {
            scanner,
            interval,
            timeout,
        }
    }
}

#[async_trait]
impl<S: UtxoScanner> FundingSource for RpcPollFunding<S> {
    fn name(&self) -> &'static str {
        "rpc-poll"
    }

    async fn has_sufficient_balance(&self, address: &Address, min_sat: u64) -> Result<bool> {
        let scan = self.scanner.scan_address(address).await?;
        log::info!("Balance of {}: {} sat", address, scan.total_sat());
        Ok(scan.total_sat() >= min_sat)
    }

    async fn funding_outpoint(
        &self,
        address: &Address,
        output_script: &[u8],
        min_sat: u64,
    ) -> Result<FundedOutput> {
        let deadline = Instant::now() + self.timeout;
        log::info!(
            "Waiting for at least {} sat at {} (timeout {}s)",
            min_sat,
            address,
            self.timeout.as_secs()
        );

        loop {
            let scan = self.scanner.scan_address(address).await?;
            if let Some(funded) = largest_matching(&scan, output_script, min_sat)? {
                log::info!("Found funding output {} ({} sat)", funded.outpoint, funded.value_sat);
                return Ok(funded);
            }

            if Instant::now() + self.interval > deadline {
                return Err(Error::FundingTimeout(self.timeout.as_secs()));
            }
            log::debug!("{} holds {} sat, retrying", address, scan.total_sat());
            tokio::time::sleep(self.interval).await;
        }
    }
}

/// Pay the game amount from the node's wallet
pub struct AutoSendFunding {
    client: Arc<RpcClient>,
}

impl AutoSendFunding {
    pub fn new(client: Arc<RpcClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FundingSource for AutoSendFunding {
    fn name(&self) -> &'static str {
        "auto-send"
    }

    async fn has_sufficient_balance(&self, address: &Address, min_sat: u64) -> Result<bool> {
        let scan = self.client.scan_address(address).await?;
        Ok(scan.total_sat() >= min_sat)
    }

    async fn funding_outpoint(
        &self,
        address: &Address,
        output_script: &[u8],
        min_sat: u64,
    ) -> Result<FundedOutput> {
        // Reuse an existing output rather than funding twice
        let scan = self.client.scan_address(address).await?;
        if let Some(funded) = largest_matching(&scan, output_script, min_sat)? {
            log::info!("{} is already funded by {}", address, funded.outpoint);
            return Ok(funded);
        }

        let txid = self.client.send_to_address(address, min_sat).await?;
        log::info!("Sent {} sat to {} in {}", min_sat, address, txid);

        let info = self.client.get_raw_transaction(&txid).await?;
        let (vout, value_sat) = info.find_output(output_script).ok_or_else(|| {
            Error::Rpc(format!("Transaction {} has no output paying {}", txid, address))
        })?;

        Ok(FundedOutput {
            outpoint: OutPoint::new(txid, vout),
            value_sat,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Network;
    use crate::network::rpc::ScannedUtxo;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const GAME_ADDRESS: &str = "tb1qe74nekrkcuc738d2ftsxy0m0kyarssyzmt0vd3vdsnj722dhzrrq97e5r6";
    const GAME_SCRIPT: &str = "0020cfab3cd876c731e89daa4ae0623f6fb13a384082dadec6c58d84e5e529b710c6";

    fn address() -> Address {
        Address::parse(GAME_ADDRESS, Network::Testnet).unwrap()
    }

    fn script() -> Vec<u8> {
        hex::decode(GAME_SCRIPT).unwrap()
    }

    fn utxo(txid_byte: u8, vout: u32, amount: f64) -> ScannedUtxo {
        ScannedUtxo {
            txid: hex::encode([txid_byte; 32]),
            vout,
            script_pubkey: GAME_SCRIPT.to_string(),
            amount,
            height: 100,
        }
    }

    fn scan(unspents: Vec<ScannedUtxo>) -> ScanResult {
        let total_amount = unspents.iter().map(|u| u.amount).sum();
        ScanResult {
            success: true,
            unspents,
            total_amount,
        }
    }

    /// Address stays empty for `empty_scans` polls, then gets funded
    struct DelayedScanner {
        empty_scans: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl UtxoScanner for DelayedScanner {
        async fn scan_address(&self, _address: &Address) -> Result<ScanResult> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.empty_scans {
                Ok(scan(Vec::new()))
            } else {
                Ok(scan(vec![utxo(0xaa, 1, 0.001)]))
            }
        }
    }

    #[test]
    fn test_largest_matching() {
        let result = scan(vec![utxo(0x01, 0, 0.0005), utxo(0x02, 3, 0.002), utxo(0x03, 1, 0.001)]);

        let best = largest_matching(&result, &script(), 100_000).unwrap().unwrap();
        assert_eq!(best.outpoint.vout, 3);
        assert_eq!(best.value_sat, 200_000);

        assert!(largest_matching(&result, &script(), 300_000).unwrap().is_none());
        assert!(largest_matching(&result, &[0x51], 0).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_manual_funding() {
        let outpoint = OutPoint::new(Hash256::new([7; 32]), 2);
        let source = ManualFunding::new(outpoint, 100_000);

        assert!(source.has_sufficient_balance(&address(), 100_000).await.unwrap());
        assert!(!source.has_sufficient_balance(&address(), 100_001).await.unwrap());

        let funded = source.funding_outpoint(&address(), &script(), 100_000).await.unwrap();
        assert_eq!(funded, FundedOutput { outpoint, value_sat: 100_000 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_until_funded() {
        let scanner = Arc::new(DelayedScanner {
            empty_scans: 3,
            calls: AtomicUsize::new(0),
        });
        let source = RpcPollFunding::new(scanner.clone(), Duration::from_secs(10), Duration::from_secs(600));

        let funded = source.funding_outpoint(&address(), &script(), 100_000).await.unwrap();
        assert_eq!(funded.outpoint, OutPoint::new(Hash256::new([0xaa; 32]), 1));
        assert_eq!(funded.value_sat, 100_000);
        assert_eq!(scanner.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_timeout() {
        let scanner = Arc::new(DelayedScanner {
            empty_scans: usize::MAX,
            calls: AtomicUsize::new(0),
        });
        let source = RpcPollFunding::new(scanner, Duration::from_secs(10), Duration::from_secs(30));

        let err = source.funding_outpoint(&address(), &script(), 100_000).await.unwrap_err();
        assert_eq!(err, Error::FundingTimeout(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_threshold_comes_from_caller() {
        let scanner = Arc::new(DelayedScanner {
            empty_scans: 0,
            calls: AtomicUsize::new(0),
        });
        let source = RpcPollFunding::new(scanner, Duration::from_secs(10), Duration::from_secs(20));

        // The funded output holds 100,000 sat
        assert!(source.funding_outpoint(&address(), &script(), 50_000).await.is_ok());
        let err = source.funding_outpoint(&address(), &script(), 150_000).await.unwrap_err();
        assert_eq!(err, Error::FundingTimeout(20));
    }

    #[tokio::test]
    async fn test_poll_balance_check() {
        let scanner = Arc::new(DelayedScanner {
            empty_scans: 1,
            calls: AtomicUsize::new(0),
        });
        let source = RpcPollFunding::new(scanner, Duration::from_secs(1), Duration::from_secs(5));

        assert!(!source.has_sufficient_balance(&address(), 100_000).await.unwrap());
        assert!(source.has_sufficient_balance(&address(), 100_000).await.unwrap());
    }
}
