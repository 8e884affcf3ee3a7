// Spending transaction assembly

use crate::core::{Hash256, Network, OutPoint, Script, Transaction, TxInput, TxOutput};
use crate::error::{Error, Result};
use crate::puzzle::program::WitnessProgram;
use crate::puzzle::satisfier::satisfy;
use crate::wallet::address_to_script_pubkey;

/// Inputs to `assemble`
#[derive(Debug, Clone)]
pub struct SpendRequest<'a> {
    /// Funding output being claimed
    pub outpoint: OutPoint,
    /// scriptPubKey of the funding output
    pub locking_script: &'a [u8],
    /// The script the funding output commits to
    pub spend_script: &'a Script,
    /// Head, body and tail codes
    pub selections: [u8; 3],
    /// Payout address
    pub destination: &'a str,
    pub network: Network,
    /// Value of the funding output in satoshis
    pub total_value: u64,
    /// Fixed fee in satoshis
    pub fee: u64,
}

/// A finalized transaction and its wire form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedTransaction {
    pub transaction: Transaction,
    pub bytes: Vec<u8>,
}

impl SerializedTransaction {
    fn new(transaction: Transaction) -> Self {
        let bytes = transaction.serialize();
        Self { transaction, bytes }
    }

    pub fn txid(&self) -> Hash256 {
        self.transaction.txid()
    }

    pub fn wtxid(&self) -> Hash256 {
        self.transaction.wtxid()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    pub fn vsize(&self) -> usize {
        self.transaction.vsize()
    }
}

/// Build and finalize the one-input, one-output spend of a game output
pub fn assemble(request: &SpendRequest) -> Result<SerializedTransaction> {
    if request.fee >= request.total_value {
        return Err(Error::InsufficientValue {
            total: request.total_value,
            fee: request.fee,
        });
    }

    let witness_script = request.spend_script.compile()?;
    let expected = WitnessProgram::p2wsh(&witness_script).script_pubkey();
    if expected != request.locking_script {
        return Err(Error::WitnessProgramMismatch {
            expected: hex::encode(request.locking_script),
        });
    }

    let payout_script = address_to_script_pubkey(request.destination, request.network)?;
    let output = TxOutput::new(request.total_value - request.fee, payout_script);

    // Pure witness spend: scriptSig stays empty
    let mut input = TxInput::new(request.outpoint);
    input.witness = satisfy(request.spend_script, request.selections)?;

    let tx = Transaction::new(vec![input], vec![output]);
    let serialized = SerializedTransaction::new(tx);

    log::info!(
        "Assembled spend of {} paying {} sat to {} (txid {})",
        request.outpoint,
        request.total_value - request.fee,
        request.destination,
        serialized.txid()
    );
    log::debug!("Transaction hex: {}", serialized.to_hex());

    Ok(serialized)
}
