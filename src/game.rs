// One round of CatCraft: fund the puzzle output, build the spend, check it, send it

use crate::config::AppConfig;
use crate::core::{Hash256, Network, Script};
use crate::error::{Error, Result};
use crate::network::{Broadcaster, FundedOutput, FundingSource};
use crate::puzzle::{
    assemble, build_puzzle_script, derive_program, verify_p2wsh, Cat, DerivedProgram,
    SerializedTransaction, SpendRequest, TargetValue, TARGET_CAT,
};
use crate::wallet::{Address, PlayerKey};

/// Everything a game round needs, built once from configuration
pub struct GameContext {
    pub config: AppConfig,
    pub network: Network,
    pub target: Cat,
    pub script: Script,
    pub program: DerivedProgram,
    pub player: PlayerKey,
}

/// What happened in a round
#[derive(Debug, Clone)]
pub struct GameOutcome {
    pub choice: Cat,
    pub funded: FundedOutput,
    pub transaction: SerializedTransaction,
    /// Whether the local interpreter accepted the witness
    pub won: bool,
    /// Txid returned by the broadcaster, if the spend was sent
    pub broadcast_txid: Option<Hash256>,
    pub explorer_link: String,
}

impl GameContext {
    /// Game for the standard target cat
    pub fn new(config: AppConfig, player: PlayerKey) -> Result<Self> {
        Self::with_target(config, player, TARGET_CAT)
    }

    pub fn with_target(config: AppConfig, player: PlayerKey, target: Cat) -> Result<Self> {
        let network = config.network;
        if player.network != network {
            return Err(Error::InvalidKey(format!(
                "Player key is for {} but the game runs on {}",
                player.network, network
            )));
        }

        let script = build_puzzle_script(&TargetValue::from(target));
        let program = derive_program(&script, network)?;

        log::info!("Game address: {}", program.address);
        log::debug!("Witness script: {}", script);

        Ok(Self {
            config,
            network,
            target,
            script,
            program,
            player,
        })
    }

    /// P2WSH address that holds the game funds
    pub fn game_address(&self) -> &Address {
        &self.program.address
    }

    pub fn payout_address(&self) -> Result<Address> {
        self.player.p2wpkh_address()
    }

    /// Build the spend of `funded` for `choice` without any I/O
    pub fn build_spend(&self, funded: &FundedOutput, choice: Cat) -> Result<SerializedTransaction> {
        let destination = self.payout_address()?;
        assemble(&SpendRequest {
            outpoint: funded.outpoint,
            locking_script: &self.program.output_script,
            spend_script: &self.script,
            selections: choice.to_bytes(),
            destination: destination.as_str(),
            network: self.network,
            total_value: funded.value_sat,
            fee: self.config.game.fee_sat,
        })
    }

    /// Play one round with `choice`
    ///
    /// Funding comes from `funding`. The spend is checked against the funding
    /// output with the local interpreter first; a losing spend is never
    /// handed to `broadcaster`.
    pub async fn play(
        &self,
        choice: Cat,
        funding: &dyn FundingSource,
        broadcaster: Option<&dyn Broadcaster>,
    ) -> Result<GameOutcome> {
        let address = self.game_address();
        let amount = self.config.game.amount_sat;

        log::info!("Target cat: {}", self.target);
        log::info!("Your choice: {}", choice);

        if funding.has_sufficient_balance(address, amount).await? {
            log::info!("{} already holds at least {} sat", address, amount);
        } else {
            log::info!("Funding {} with {} sat via {}", address, amount, funding.name());
        }

        let funded = funding
            .funding_outpoint(address, &self.program.output_script, amount)
            .await?;
        let transaction = self.build_spend(&funded, choice)?;

        let won = verify_p2wsh(
            &self.program.output_script,
            &transaction.transaction.inputs[0].witness,
        )?;

        let broadcast_txid = match (won, broadcaster) {
            (true, Some(broadcaster)) => Some(broadcaster.broadcast(&transaction).await?),
            (false, Some(_)) => {
                log::warn!("{} does not match the target; not broadcasting", choice);
                None
            }
            (_, None) => None,
        };

        let txid = broadcast_txid.unwrap_or_else(|| transaction.txid());
        Ok(GameOutcome {
            choice,
            funded,
            won,
            broadcast_txid,
            explorer_link: self.config.tx_url(&txid),
            transaction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::OutPoint;
    use crate::network::{DryRunBroadcaster, ManualFunding};
    use crate::puzzle::{BodyPart, HeadPart, TailPart};

    const DEMO_WIF: &str = "cTT3atcdHZ3F83L79niWKfBgdiV2k4r7wUmdCRPbbmSBY7r9BG6L";

    fn context() -> GameContext {
        let config = AppConfig::defaults().unwrap();
        let player = PlayerKey::from_wif(DEMO_WIF, Network::Testnet).unwrap();
        GameContext::new(config, player).unwrap()
    }

    fn funding() -> ManualFunding {
        ManualFunding::new(OutPoint::new(Hash256::new([3; 32]), 0), 100_000)
    }

    #[test]
    fn test_context_addresses() {
        let ctx = context();
        assert_eq!(
            ctx.game_address().as_str(),
            "tb1qe74nekrkcuc738d2ftsxy0m0kyarssyzmt0vd3vdsnj722dhzrrq97e5r6"
        );
        assert_eq!(
            ctx.payout_address().unwrap().as_str(),
            "tb1qtsjdctzrud7ataf4fl6wqm28euf4nmsjjmz5cu"
        );
    }

    #[test]
    fn test_key_network_mismatch() {
        let config = AppConfig::defaults().unwrap();
        let player = PlayerKey::generate(Network::Mainnet);
        assert!(matches!(GameContext::new(config, player), Err(Error::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_winning_round() {
        let ctx = context();
        let outcome = ctx
            .play(TARGET_CAT, &funding(), Some(&DryRunBroadcaster))
            .await
            .unwrap();

        assert!(outcome.won);
        assert_eq!(outcome.broadcast_txid, Some(outcome.transaction.txid()));
        assert_eq!(outcome.transaction.transaction.outputs[0].value, 99_000);
        assert!(outcome.explorer_link.ends_with(&outcome.transaction.txid().to_hex()));
    }

    #[tokio::test]
    async fn test_losing_round_is_not_broadcast() {
        let ctx = context();
        let choice = Cat::new(HeadPart::Persian, BodyPart::Fluffy, TailPart::Short);
        let outcome = ctx
            .play(choice, &funding(), Some(&DryRunBroadcaster))
            .await
            .unwrap();

        assert!(!outcome.won);
        assert!(outcome.broadcast_txid.is_none());
        assert_eq!(outcome.transaction.transaction.inputs[0].witness.items()[0], vec![0x02]);
    }

    #[tokio::test]
    async fn test_custom_target() {
        let config = AppConfig::defaults().unwrap();
        let player = PlayerKey::from_wif(DEMO_WIF, Network::Testnet).unwrap();
        let target = Cat::new(HeadPart::MaineCoon, BodyPart::Large, TailPart::Bushy);
        let ctx = GameContext::with_target(config, player, target).unwrap();

        assert!(ctx.play(target, &funding(), None).await.unwrap().won);
        assert!(!ctx.play(TARGET_CAT, &funding(), None).await.unwrap().won);
    }
}
