// CatCraft
// A P2WSH output locked by OP_CAT OP_CAT <target> OP_EQUAL: whoever pushes
// the right head, body and tail bytes takes the funds.

pub mod core;
pub mod puzzle;
pub mod wallet;
pub mod network;
pub mod config;
pub mod error;
pub mod game;
pub mod cli;

// Re-exports for convenience
pub use core::{Hash256, Network, OutPoint, Script, Transaction, TxInput, TxOutput, WitnessStack};
pub use puzzle::{assemble, build_puzzle_script, derive_program, satisfy, verify_p2wsh, Cat, TargetValue};
pub use wallet::{Address, PlayerKey};
pub use network::{Broadcaster, FundingSource, RpcClient};
pub use crate::config::AppConfig;
pub use error::{Error, Result};
pub use game::{GameContext, GameOutcome};
pub use cli::{Cli, CliHandler};
