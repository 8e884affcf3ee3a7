// bitcoind connectivity: JSON-RPC, funding and broadcast

pub mod rpc;
mod funding;
mod broadcast;

pub use rpc::{btc_to_sat, sat_to_btc, RpcClient};
pub use funding::{
    largest_matching, AutoSendFunding, FundedOutput, FundingSource, ManualFunding, RpcPollFunding,
    UtxoScanner,
};
pub use broadcast::{Broadcaster, DryRunBroadcaster};
