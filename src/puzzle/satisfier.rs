// Witness construction for the puzzle script

use crate::core::{Script, WitnessStack};
use crate::error::Result;

/// Build the spending witness `[head, body, tail, witness_script]`
///
/// Each selection is pushed as a one-byte item and the compiled script goes
/// last, as P2WSH redemption requires. The selections are not checked
/// against the script's target: a wrong guess yields a well-formed witness
/// that consensus will reject. Use `interpreter::verify_p2wsh` to find out
/// beforehand.
pub fn satisfy(script: &Script, selections: [u8; 3]) -> Result<WitnessStack> {
    let witness_script = script.compile()?;

    let mut witness = WitnessStack::default();
    for selection in selections {
        witness.push(vec![selection]);
    }
    witness.push(witness_script);

    log::debug!("Witness stack: {}", hex::encode(witness.encode()));
    Ok(witness)
}
