use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

const ATTO_PER_FIL: u128 = 1_000_000_000_000_000_000;

/// A token amount in attoFIL (10^-18 FIL).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TokenAmount(u128);

impl TokenAmount {
    pub const fn zero() -> Self {
        Self(0)
    }

    pub const fn from_atto(atto: u128) -> Self {
        Self(atto)
    }

    pub fn from_whole(fil: u64) -> Self {
        Self(u128::from(fil) * ATTO_PER_FIL)
    }

    pub fn atto(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

/// Decimal FIL with trailing zeros trimmed, e.g. `0.5 FIL`.
impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / ATTO_PER_FIL;
        let frac = self.0 % ATTO_PER_FIL;
        if frac == 0 {
            return write!(f, "{whole} FIL");
        }
        let frac = format!("{frac:018}");
        write!(f, "{whole}.{} FIL", frac.trim_end_matches('0'))
    }
}

/// Parses a plain attoFIL integer.
impl FromStr for TokenAmount {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u128>()
            .map(Self)
            .map_err(|_| TypeError::InvalidAmount(s.to_string()))
    }
}

impl TryFrom<String> for TokenAmount {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Serialised as the attoFIL integer string.
impl From<TokenAmount> for String {
    fn from(amount: TokenAmount) -> Self {
        amount.0.to_string()
    }
}
