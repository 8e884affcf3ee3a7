// Error types shared by the puzzle core and the node glue

use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Compiled script is larger than MAX_SCRIPT_SIZE
    #[error("Script too large: {size} bytes (max {max})")]
    ScriptTooLarge { size: usize, max: usize },

    /// A single push exceeds MAX_SCRIPT_ELEMENT_SIZE
    #[error("Push data too large: {size} bytes (max {max})")]
    PushTooLarge { size: usize, max: usize },

    /// Script bytes could not be parsed into elements
    #[error("Malformed script: {0}")]
    MalformedScript(String),

    /// Witness bytes are structurally invalid
    #[error("Malformed witness: {0}")]
    MalformedWitness(String),

    /// Fee consumes the whole input value
    #[error("Insufficient value: fee {fee} sat >= input value {total} sat")]
    InsufficientValue { total: u64, fee: u64 },

    /// Locking output script does not commit to the spend script
    #[error("Witness program mismatch: output script {expected} does not commit to the spend script")]
    WitnessProgramMismatch { expected: String },

    /// Local script evaluation hit a hard failure
    #[error("Script evaluation failed: {0}")]
    Interpreter(String),

    /// User-supplied text (hex, outpoint, part name) did not parse
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Funding did not show up before the poll deadline
    #[error("Timed out after {0}s waiting for funding")]
    FundingTimeout(u64),
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Rpc(e.to_string())
    }
}
