use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{TypeError, TypeResult};

/// Address of a storage provider (e.g. `f01872811`).
///
/// Only the textual shape is checked here: a network prefix (`f` mainnet,
/// `t` testnets), a protocol digit and a non-empty payload. Resolving the
/// address to a reachable peer is the chain service's job.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProviderAddress(String);

impl ProviderAddress {
    /// Parse and validate an address string.
    pub fn parse(s: &str) -> TypeResult<Self> {
        let invalid = |reason: &str| TypeError::InvalidAddress {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let mut chars = s.chars();
        match chars.next() {
            Some('f') | Some('t') => {}
            _ => return Err(invalid("network prefix must be 'f' or 't'")),
        }
        let protocol = chars
            .next()
            .and_then(|c| c.to_digit(10))
            .ok_or_else(|| invalid("missing protocol digit"))?;
        if protocol > 4 {
            return Err(invalid("unknown protocol"));
        }
        let payload = chars.as_str();
        if payload.is_empty() {
            return Err(invalid("empty payload"));
        }
        if protocol == 0 && !payload.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("id address payload must be decimal"));
        }
        if !payload.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()) {
            return Err(invalid("payload must be lowercase base32"));
        }
        Ok(Self(s.to_string()))
    }

    /// The address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ProviderAddress {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ProviderAddress {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ProviderAddress> for String {
    fn from(addr: ProviderAddress) -> Self {
        addr.0
    }
}

impl fmt::Debug for ProviderAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProviderAddress({})", self.0)
    }
}

impl fmt::Display for ProviderAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_id_address() {
        let addr = ProviderAddress::parse("f01872811").unwrap();
        assert_eq!(addr.as_str(), "f01872811");
        assert_eq!(addr.to_string(), "f01872811");
    }

    #[test]
    fn parses_testnet_key_address() {
        assert!(ProviderAddress::parse("t3vvmn62lofvhjd2ugzca6sof2j2ubwok6cj4xxbfzz4yuxfkgobpihhd2thlanmsh3w2ptld2gqkn2jvlss4a").is_ok());
    }

    #[test]
    fn rejects_bad_network() {
        let err = ProviderAddress::parse("x01234").unwrap_err();
        assert!(matches!(err, TypeError::InvalidAddress { .. }));
    }

    #[test]
    fn rejects_bad_protocol() {
        assert!(ProviderAddress::parse("f9abc").is_err());
        assert!(ProviderAddress::parse("f").is_err());
    }

    #[test]
    fn rejects_non_decimal_id() {
        assert!(ProviderAddress::parse("f0abc").is_err());
        assert!(ProviderAddress::parse("f0").is_err());
    }

    #[test]
    fn serde_uses_string_form() {
        let addr = ProviderAddress::parse("f01000").unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"f01000\"");
        let back: ProviderAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
        assert!(serde_json::from_str::<ProviderAddress>("\"bogus\"").is_err());
    }
}
