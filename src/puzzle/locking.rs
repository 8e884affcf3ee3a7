// The concatenate-and-compare locking script

use crate::core::{OpCode, Script};
use crate::puzzle::catalog::Cat;
use std::fmt;

/// The three bytes a spender has to reproduce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetValue(pub [u8; 3]);

impl TargetValue {
    pub fn as_bytes(&self) -> &[u8; 3] {
        &self.0
    }
}

impl From<Cat> for TargetValue {
    fn from(cat: Cat) -> Self {
        Self(cat.to_bytes())
    }
}

impl fmt::Display for TargetValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Build the puzzle script: `OP_CAT OP_CAT <target> OP_EQUAL`
///
/// The spender pushes head, body and tail. The two OP_CATs fold them into
/// `head || body || tail`, which OP_EQUAL compares with the target. There is
/// no signature check: knowing the target is enough to spend.
pub fn build_puzzle_script(target: &TargetValue) -> Script {
    Script::default()
        .push_opcode(OpCode::OpCat)
        .push_opcode(OpCode::OpCat)
        .push_data(target.as_bytes())
        .push_opcode(OpCode::OpEqual)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ScriptElement;
    use crate::puzzle::catalog::TARGET_CAT;

    #[test]
    fn test_puzzle_script_elements() {
        let script = build_puzzle_script(&TargetValue([0x01, 0x02, 0x01]));
        assert_eq!(
            script.elements(),
            &[
                ScriptElement::Op(OpCode::OpCat),
                ScriptElement::Op(OpCode::OpCat),
                ScriptElement::Push(vec![0x01, 0x02, 0x01]),
                ScriptElement::Op(OpCode::OpEqual),
            ]
        );
    }

    #[test]
    fn test_puzzle_script_bytes() {
        let script = build_puzzle_script(&TARGET_CAT.into());
        assert_eq!(hex::encode(script.compile().unwrap()), "7e7e0301020187");
    }

    #[test]
    fn test_distinct_targets_distinct_scripts() {
        let a = build_puzzle_script(&TargetValue([1, 2, 1])).compile().unwrap();
        let b = build_puzzle_script(&TargetValue([1, 2, 2])).compile().unwrap();
        assert_ne!(a, b);
    }
}
