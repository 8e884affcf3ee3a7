// P2WSH witness program derivation

use crate::core::{script::p2wsh_script_pubkey, sha256_hash, Network, Script};
use crate::error::Result;
use crate::wallet::Address;

/// Segwit version used for script-hash outputs
pub const WITNESS_V0: u8 = 0;

/// Version 0 witness program committing to a script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WitnessProgram {
    pub version: u8,
    /// SHA256 of the compiled witness script
    pub program: [u8; 32],
}

impl WitnessProgram {
    /// Commit to compiled script bytes
    pub fn p2wsh(script_bytes: &[u8]) -> Self {
        Self {
            version: WITNESS_V0,
            program: sha256_hash(script_bytes),
        }
    }

    /// `OP_0 <32-byte hash>`
    pub fn script_pubkey(&self) -> Vec<u8> {
        p2wsh_script_pubkey(&self.program)
    }

    pub fn address(&self, network: Network) -> Result<Address> {
        Address::from_witness_program(network, self.version, &self.program)
    }
}

/// Everything needed to fund and later recognise the game output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedProgram {
    pub program: WitnessProgram,
    /// Exact scriptPubKey of the funding output
    pub output_script: Vec<u8>,
    pub address: Address,
}

/// Hash the compiled script into its P2WSH output script and address
pub fn derive_program(script: &Script, network: Network) -> Result<DerivedProgram> {
    let compiled = script.compile()?;
    let program = WitnessProgram::p2wsh(&compiled);

    Ok(DerivedProgram {
        output_script: program.script_pubkey(),
        address: program.address(network)?,
        program,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::locking::{build_puzzle_script, TargetValue};

    const TARGET: TargetValue = TargetValue([0x01, 0x02, 0x01]);

    #[test]
    fn test_program_is_single_sha256() {
        let script = build_puzzle_script(&TARGET);
        let derived = derive_program(&script, Network::Testnet).unwrap();

        let compiled = script.compile().unwrap();
        assert_eq!(derived.program.program, sha256_hash(&compiled));
        assert_eq!(derived.output_script.len(), 34);
        assert_eq!(&derived.output_script[..2], &[0x00, 0x20]);
        assert_eq!(&derived.output_script[2..], &derived.program.program);
    }

    #[test]
    fn test_known_game_address() {
        let script = build_puzzle_script(&TARGET);
        let derived = derive_program(&script, Network::Testnet).unwrap();

        assert_eq!(
            hex::encode(derived.program.program),
            "cfab3cd876c731e89daa4ae0623f6fb13a384082dadec6c58d84e5e529b710c6"
        );
        assert_eq!(
            derived.address.as_str(),
            "tb1qe74nekrkcuc738d2ftsxy0m0kyarssyzmt0vd3vdsnj722dhzrrq97e5r6"
        );
        assert_eq!(derived.address.script_pubkey().unwrap(), derived.output_script);
    }

    #[test]
    fn test_deterministic() {
        let first = derive_program(&build_puzzle_script(&TARGET), Network::Testnet).unwrap();
        let second = derive_program(&build_puzzle_script(&TARGET), Network::Testnet).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_networks_differ_only_in_prefix() {
        let script = build_puzzle_script(&TARGET);
        let testnet = derive_program(&script, Network::Testnet).unwrap();
        let mainnet = derive_program(&script, Network::Mainnet).unwrap();
        let regtest = derive_program(&script, Network::Regtest).unwrap();

        assert_eq!(testnet.output_script, mainnet.output_script);
        assert!(testnet.address.as_str().starts_with("tb1q"));
        assert!(mainnet.address.as_str().starts_with("bc1q"));
        assert!(regtest.address.as_str().starts_with("bcrt1q"));
        assert_eq!(testnet.address.as_str().len(), 62);
    }

    #[test]
    fn test_distinct_targets_distinct_programs() {
        let a = derive_program(&build_puzzle_script(&TARGET), Network::Testnet).unwrap();
        let b = derive_program(&build_puzzle_script(&TargetValue([3, 3, 3])), Network::Testnet).unwrap();
        assert_ne!(a.program, b.program);
        assert_ne!(a.address, b.address);
    }
}
