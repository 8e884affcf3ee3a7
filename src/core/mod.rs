// Script, witness and transaction primitives

mod types;
mod transaction;
mod serialize;
mod hash;
mod witness;
pub mod script;

pub use types::*;
pub use transaction::*;
pub use serialize::*;
pub use hash::*;
pub use witness::WitnessStack;
pub use script::{OpCode, Script, ScriptElement};
