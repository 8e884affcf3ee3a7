// Cat parts and their byte codes
//
// This is the only place part codes are defined. The locking script and the
// witness are both built from these values.

use crate::error::{Error, Result};
use clap::ValueEnum;
use std::fmt;

/// Head choices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
#[repr(u8)]
pub enum HeadPart {
    Siamese = 0x01,
    Persian = 0x02,
    MaineCoon = 0x03,
}

/// Body choices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
#[repr(u8)]
pub enum BodyPart {
    Slim = 0x01,
    Fluffy = 0x02,
    Large = 0x03,
}

/// Tail choices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
#[repr(u8)]
pub enum TailPart {
    Short = 0x01,
    Long = 0x02,
    Bushy = 0x03,
}

impl HeadPart {
    pub const ALL: [HeadPart; 3] = [HeadPart::Siamese, HeadPart::Persian, HeadPart::MaineCoon];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|part| part.code() == code)
    }

    pub fn name(&self) -> &'static str {
        match self {
            HeadPart::Siamese => "Siamese",
            HeadPart::Persian => "Persian",
            HeadPart::MaineCoon => "Maine Coon",
        }
    }
}

impl BodyPart {
    pub const ALL: [BodyPart; 3] = [BodyPart::Slim, BodyPart::Fluffy, BodyPart::Large];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|part| part.code() == code)
    }

    pub fn name(&self) -> &'static str {
        match self {
            BodyPart::Slim => "Slim",
            BodyPart::Fluffy => "Fluffy",
            BodyPart::Large => "Large",
        }
    }
}

impl TailPart {
    pub const ALL: [TailPart; 3] = [TailPart::Short, TailPart::Long, TailPart::Bushy];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|part| part.code() == code)
    }

    pub fn name(&self) -> &'static str {
        match self {
            TailPart::Short => "Short",
            TailPart::Long => "Long",
            TailPart::Bushy => "Bushy",
        }
    }
}

/// A complete cat: one part from each category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cat {
    pub head: HeadPart,
    pub body: BodyPart,
    pub tail: TailPart,
}

/// The cat the default game is locked to
pub const TARGET_CAT: Cat = Cat {
    head: HeadPart::Siamese,
    body: BodyPart::Fluffy,
    tail: TailPart::Short,
};

impl Cat {
    pub fn new(head: HeadPart, body: BodyPart, tail: TailPart) -> Self {
        Self { head, body, tail }
    }

    /// Part codes in witness order: head, body, tail
    pub fn to_bytes(&self) -> [u8; 3] {
        [self.head.code(), self.body.code(), self.tail.code()]
    }

    pub fn from_bytes(bytes: [u8; 3]) -> Result<Self> {
        let [head, body, tail] = bytes;
        Ok(Self {
            head: HeadPart::from_code(head)
                .ok_or_else(|| Error::InvalidInput(format!("Unknown head code 0x{:02x}", head)))?,
            body: BodyPart::from_code(body)
                .ok_or_else(|| Error::InvalidInput(format!("Unknown body code 0x{:02x}", body)))?,
            tail: TailPart::from_code(tail)
                .ok_or_else(|| Error::InvalidInput(format!("Unknown tail code 0x{:02x}", tail)))?,
        })
    }
}

impl fmt::Display for Cat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} head, {} body, {} tail",
            self.head.name(),
            self.body.name(),
            self.tail.name()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_cat_bytes() {
        assert_eq!(TARGET_CAT.to_bytes(), [0x01, 0x02, 0x01]);
        assert_eq!(TARGET_CAT.to_string(), "Siamese head, Fluffy body, Short tail");
    }

    #[test]
    fn test_codes_roundtrip() {
        for head in HeadPart::ALL {
            for body in BodyPart::ALL {
                for tail in TailPart::ALL {
                    let cat = Cat::new(head, body, tail);
                    assert_eq!(Cat::from_bytes(cat.to_bytes()).unwrap(), cat);
                }
            }
        }
    }

    #[test]
    fn test_unknown_code() {
        assert!(Cat::from_bytes([0x04, 0x01, 0x01]).is_err());
        assert!(Cat::from_bytes([0x01, 0x00, 0x01]).is_err());
    }
}
