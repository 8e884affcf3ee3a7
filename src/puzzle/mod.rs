// The CatCraft puzzle: locking script, address, witness and spend

pub mod catalog;
pub mod locking;
pub mod program;
pub mod satisfier;
pub mod interpreter;
pub mod assembler;

pub use catalog::{BodyPart, Cat, HeadPart, TailPart, TARGET_CAT};
pub use locking::{build_puzzle_script, TargetValue};
pub use program::{derive_program, DerivedProgram, WitnessProgram};
pub use satisfier::satisfy;
pub use interpreter::verify_p2wsh;
pub use assembler::{assemble, SerializedTransaction, SpendRequest};
