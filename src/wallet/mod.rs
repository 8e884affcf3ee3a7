// Player keys and segwit addresses

mod address;
mod keystore;

pub use address::{address_to_script_pubkey, Address};
pub use keystore::PlayerKey;
