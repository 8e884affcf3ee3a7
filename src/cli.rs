// CLI commands

use crate::config::AppConfig;
use crate::core::{Hash256, Network, OutPoint, Script, WitnessStack};
use crate::error::{Error, Result};
use crate::game::GameContext;
use crate::network::{
    AutoSendFunding, Broadcaster, DryRunBroadcaster, FundingSource, ManualFunding, RpcClient,
    RpcPollFunding,
};
use crate::puzzle::{BodyPart, Cat, HeadPart, TailPart, TARGET_CAT};
use crate::wallet::PlayerKey;
use clap::{Parser, Subcommand, ValueEnum};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "catcraft")]
#[command(about = "Build the target cat to unlock a P2WSH puzzle output", long_about = None)]
pub struct Cli {
    /// Override the configured network
    #[arg(long, global = true)]
    pub network: Option<Network>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the game address and locking script
    Address {
        /// Player WIF, to also show the payout address
        #[arg(long)]
        wif: Option<String>,
    },

    /// Play a round
    Play {
        #[arg(long, value_enum)]
        head: HeadPart,
        #[arg(long, value_enum)]
        body: BodyPart,
        #[arg(long, value_enum)]
        tail: TailPart,

        /// How the game output gets funded
        #[arg(long, value_enum, default_value = "manual")]
        funding: FundingMode,

        /// Funding transaction id (manual funding)
        #[arg(long)]
        txid: Option<String>,
        /// Funding output index (manual funding)
        #[arg(long, default_value = "0")]
        vout: u32,

        /// Game amount in satoshis
        #[arg(long)]
        amount: Option<u64>,
        /// Transaction fee in satoshis
        #[arg(short, long)]
        fee: Option<u64>,

        /// Player WIF; winnings are paid to its P2WPKH address
        #[arg(long)]
        wif: String,

        /// Send the spend through bitcoind instead of a dry run
        #[arg(long)]
        broadcast: bool,
    },

    /// Check the connection to bitcoind
    CheckNode,

    /// Decode a serialized witness field
    DecodeWitness {
        /// Witness bytes in hex
        hex: String,
    },

    /// List the cat parts and their codes
    Parts,

    /// Generate a new player key
    NewKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FundingMode {
    /// Fund out of band and pass --txid/--vout
    Manual,
    /// Wait for the address to be funded
    RpcPoll,
    /// Fund from the node's wallet
    AutoSend,
}

/// CLI handler
pub struct CliHandler {
    config: AppConfig,
}

impl CliHandler {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Handle CLI command
    pub async fn handle(mut self, cli: Cli) -> Result<()> {
        if let Some(network) = cli.network {
            self.config.network = network;
        }

        match cli.command {
            Commands::Address { wif } => self.address(wif.as_deref()),
            Commands::Play {
                head,
                body,
                tail,
                funding,
                txid,
                vout,
                amount,
                fee,
                wif,
                broadcast,
            } => {
                if let Some(amount) = amount {
                    self.config.game.amount_sat = amount;
                }
                if let Some(fee) = fee {
                    self.config.game.fee_sat = fee;
                }
                self.config.validate()?;
                let choice = Cat::new(head, body, tail);
                self.play(choice, funding, txid.as_deref(), vout, &wif, broadcast)
                    .await
            }
            Commands::CheckNode => self.check_node().await,
            Commands::DecodeWitness { hex } => Self::decode_witness(&hex),
            Commands::Parts => {
                Self::parts();
                Ok(())
            }
            Commands::NewKey => {
                self.new_key();
                Ok(())
            }
        }
    }

    fn rpc_client(&self) -> Result<Arc<RpcClient>> {
        Ok(Arc::new(RpcClient::from_config(&self.config.bitcoind)?))
    }

    fn address(self, wif: Option<&str>) -> Result<()> {
        let network = self.config.network;
        let player = match wif {
            Some(wif) => PlayerKey::from_wif(wif, network)?,
            None => PlayerKey::generate(network),
        };
        let show_player = wif.is_some();
        let ctx = GameContext::new(self.config, player)?;

        println!("CatCraft game ({}):", network);
        println!("  Target: {}", ctx.target);
        println!("  Address: {}", ctx.game_address());
        println!("  Output script: {}", hex::encode(&ctx.program.output_script));
        println!("  Witness script: {}", ctx.script);
        println!("  Explorer: {}", ctx.config.address_url(ctx.game_address().as_str()));
        if show_player {
            println!("  Player address: {}", ctx.payout_address()?);
        }

        Ok(())
    }

    async fn play(
        self,
        choice: Cat,
        mode: FundingMode,
        txid: Option<&str>,
        vout: u32,
        wif: &str,
        broadcast: bool,
    ) -> Result<()> {
        let amount = self.config.game.amount_sat;
        let funding: Box<dyn FundingSource> = match mode {
            FundingMode::Manual => {
                let txid = txid.ok_or_else(|| {
                    Error::InvalidInput("--txid is required with manual funding".to_string())
                })?;
                Box::new(ManualFunding::new(
                    OutPoint::new(Hash256::from_hex(txid)?, vout),
                    amount,
                ))
            }
            FundingMode::RpcPoll => Box::new(RpcPollFunding::new(
                self.rpc_client()?,
                Duration::from_secs(self.config.game.poll_interval_secs),
                Duration::from_secs(self.config.game.poll_timeout_secs),
            )),
            FundingMode::AutoSend => Box::new(AutoSendFunding::new(self.rpc_client()?)),
        };
        let broadcaster: Box<dyn Broadcaster> = if broadcast {
            Box::new(RpcClient::from_config(&self.config.bitcoind)?)
        } else {
            Box::new(DryRunBroadcaster)
        };

        let player = PlayerKey::from_wif(wif, self.config.network)?;
        let ctx = GameContext::new(self.config, player)?;

        println!("Welcome to CatCraft!");
        println!("  Game address: {}", ctx.game_address());
        println!("  Payout address: {}", ctx.payout_address()?);

        let outcome = ctx
            .play(choice, funding.as_ref(), Some(broadcaster.as_ref()))
            .await?;

        println!("Funding: {} ({} sat)", outcome.funded.outpoint, outcome.funded.value_sat);
        println!("Transaction hex: {}", outcome.transaction.to_hex());
        println!("  TXID: {}", outcome.transaction.txid());
        println!("  Size: {} vbytes", outcome.transaction.vsize());

        if outcome.won {
            println!("✓ Your cat matches the target!");
        } else {
            println!("✗ {} is not the target cat; the network would reject this spend", outcome.choice);
        }
        match outcome.broadcast_txid {
            Some(txid) if broadcast => println!("✓ Broadcast {}", txid),
            Some(_) => println!("Dry run: pass --broadcast to send it"),
            None => {}
        }
        println!("  Explorer: {}", outcome.explorer_link);

        Ok(())
    }

    async fn check_node(&self) -> Result<()> {
        let client = self.rpc_client()?;
        let info = client.get_network_info().await?;

        println!("✓ Connected to bitcoind at {}", client.url());
        println!("  Version: {}", info.version);
        println!("  Subversion: {}", info.subversion);
        println!("  Protocol: {}", info.protocolversion);

        Ok(())
    }

    fn decode_witness(hex_str: &str) -> Result<()> {
        let bytes = hex::decode(hex_str.trim())
            .map_err(|e| Error::InvalidInput(format!("Invalid hex: {}", e)))?;
        let witness = WitnessStack::decode(&bytes)?;

        println!("Witness ({} items):", witness.len());
        for (i, item) in witness.items().iter().enumerate() {
            println!("  [{}] {}", i, hex::encode(item));
        }

        // The last item of a script-hash spend is the witness script
        if let Some(last) = witness.last() {
            if let Ok(script) = Script::parse(last) {
                println!("  Script: {}", script);
            }
        }

        Ok(())
    }

    fn parts() {
        println!("Heads:");
        for part in HeadPart::ALL {
            println!("  {:02x} {}", part.code(), part.name());
        }
        println!("Bodies:");
        for part in BodyPart::ALL {
            println!("  {:02x} {}", part.code(), part.name());
        }
        println!("Tails:");
        for part in TailPart::ALL {
            println!("  {:02x} {}", part.code(), part.name());
        }
        println!("Target: {}", TARGET_CAT);
    }

    fn new_key(&self) {
        let key = PlayerKey::generate(self.config.network);

        println!("New {} key:", self.config.network);
        println!("  WIF: {}", key.to_wif());
        println!("  Public key: {}", hex::encode(key.pubkey_bytes()));
        match key.p2wpkh_address() {
            Ok(address) => println!("  Address: {}", address),
            Err(e) => println!("  Address: unavailable ({})", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_play() {
        let cli = Cli::try_parse_from([
            "catcraft",
            "--network",
            "regtest",
            "play",
            "--head",
            "maine-coon",
            "--body",
            "fluffy",
            "--tail",
            "short",
            "--funding",
            "rpc-poll",
            "--wif",
            "cTT3atcdHZ3F83L79niWKfBgdiV2k4r7wUmdCRPbbmSBY7r9BG6L",
        ])
        .unwrap();

        assert_eq!(cli.network, Some(Network::Regtest));
        match cli.command {
            Commands::Play { head, funding, vout, broadcast, .. } => {
                assert_eq!(head, HeadPart::MaineCoon);
                assert_eq!(funding, FundingMode::RpcPoll);
                assert_eq!(vout, 0);
                assert!(!broadcast);
            }
            _ => panic!("expected play"),
        }
    }

    #[test]
    fn test_rejects_unknown_part() {
        assert!(Cli::try_parse_from(["catcraft", "play", "--head", "sphynx"]).is_err());
    }

    #[tokio::test]
    async fn test_manual_play_requires_txid() {
        let cli = Cli::try_parse_from([
            "catcraft",
            "play",
            "--head",
            "siamese",
            "--body",
            "fluffy",
            "--tail",
            "short",
            "--wif",
            "cTT3atcdHZ3F83L79niWKfBgdiV2k4r7wUmdCRPbbmSBY7r9BG6L",
        ])
        .unwrap();

        let handler = CliHandler::new(AppConfig::defaults().unwrap());
        let err = handler.handle(cli).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_fee_override_is_validated_before_funding() {
        let cli = Cli::try_parse_from([
            "catcraft",
            "play",
            "--head",
            "siamese",
            "--body",
            "fluffy",
            "--tail",
            "short",
            "--funding",
            "auto-send",
            "--amount",
            "5000",
            "--fee",
            "5000",
            "--wif",
            "cTT3atcdHZ3F83L79niWKfBgdiV2k4r7wUmdCRPbbmSBY7r9BG6L",
        ])
        .unwrap();

        // Defaults carry no RPC credentials, so reaching the funding step
        // would fail with a different error
        let handler = CliHandler::new(AppConfig::defaults().unwrap());
        let err = handler.handle(cli).await.unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("Fee 5000 sat")));
    }

    #[test]
    fn test_decode_witness_rejects_garbage() {
        assert!(CliHandler::decode_witness("zz").is_err());
        assert!(CliHandler::decode_witness("0501").is_err());
        assert!(CliHandler::decode_witness("04010101020101077e7e0301020187").is_ok());
    }
}
