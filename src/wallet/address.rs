// Segwit (bech32/bech32m) addresses

use crate::core::{script::witness_output_script, Network};
use crate::error::{Error, Result};
use bech32::{segwit, Fe32, Hrp};
use std::fmt;

/// A checksummed segwit address string
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Encode a witness program for `network`
    ///
    /// Version 0 uses bech32, later versions bech32m; the `bech32` crate
    /// picks the checksum from the version.
    pub fn from_witness_program(network: Network, version: u8, program: &[u8]) -> Result<Self> {
        let hrp = Hrp::parse(network.hrp())
            .map_err(|e| Error::InvalidAddress(format!("Bad prefix {}: {}", network.hrp(), e)))?;
        let version = Fe32::try_from(version)
            .map_err(|e| Error::InvalidAddress(format!("Bad witness version: {}", e)))?;
        let encoded = segwit::encode(hrp, version, program)
            .map_err(|e| Error::InvalidAddress(format!("Cannot encode program: {}", e)))?;
        Ok(Self(encoded))
    }

    /// Parse and check that the address belongs to `network`
    pub fn parse(s: &str, network: Network) -> Result<Self> {
        let (hrp, _, _) = segwit::decode(s)
            .map_err(|e| Error::InvalidAddress(format!("{}: {}", s, e)))?;
        if !hrp.as_str().eq_ignore_ascii_case(network.hrp()) {
            return Err(Error::InvalidAddress(format!(
                "{} is not a {} address (expected prefix {})",
                s,
                network,
                network.hrp()
            )));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    /// Witness version and program
    pub fn witness_program(&self) -> Result<(u8, Vec<u8>)> {
        let (_, version, program) = segwit::decode(&self.0)
            .map_err(|e| Error::InvalidAddress(format!("{}: {}", self.0, e)))?;
        Ok((version.to_u8(), program))
    }

    /// The output script paying to this address
    pub fn script_pubkey(&self) -> Result<Vec<u8>> {
        let (version, program) = self.witness_program()?;
        Ok(witness_output_script(version, &program))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decode a destination address straight to its output script
pub fn address_to_script_pubkey(address: &str, network: Network) -> Result<Vec<u8>> {
    Address::parse(address, network)?.script_pubkey()
}
