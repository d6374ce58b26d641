use crate::core::amount::Token;
use crate::core::party::PublicKey;
use crate::obligation::terms::Terms;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Which kind of netting a `Net` command performs.
///
/// The type selects both how obligations are grouped and how many of the
/// involved parties must sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NetType {
    /// Bilateral settlement of what two parties owe each other. Any one
    /// involved party may trigger it.
    CloseOut,
    /// Multilateral reallocation across many parties. Every involved party
    /// must sign.
    Payment,
}

impl fmt::Display for NetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetType::CloseOut => write!(f, "CLOSE_OUT"),
            NetType::Payment => write!(f, "PAYMENT"),
        }
    }
}

impl FromStr for NetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "close-out" | "closeout" => Ok(NetType::CloseOut),
            "payment" => Ok(NetType::Payment),
            other => Err(format!("unknown net type '{}'", other)),
        }
    }
}

/// The minimal data deciding whether two obligations may be netted together.
///
/// Obligations are nettable together exactly when their net states are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(bound(deserialize = "P: Token + serde::Deserialize<'de>"))]
pub enum NetState<P> {
    /// Close-out netting key: the two parties plus the terms.
    Bilateral {
        party_keys: BTreeSet<PublicKey>,
        template: Terms<P>,
    },
    /// Payment netting key: the terms alone. Party identity is left to the
    /// balance check.
    Multilateral { template: Terms<P> },
}

impl<P> NetState<P> {
    pub fn template(&self) -> &Terms<P> {
        match self {
            NetState::Bilateral { template, .. } => template,
            NetState::Multilateral { template } => template,
        }
    }
}

impl<P: Token> fmt::Display for NetState<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetState::Bilateral {
                party_keys,
                template,
            } => {
                let keys: Vec<&str> = party_keys.iter().map(PublicKey::as_str).collect();
                write!(f, "bilateral[{}] {}", keys.join(", "), template)
            }
            NetState::Multilateral { template } => write!(f, "multilateral {}", template),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_net_type_parse() {
        assert_eq!("close-out".parse::<NetType>().unwrap(), NetType::CloseOut);
        assert_eq!("CLOSE_OUT".parse::<NetType>().unwrap(), NetType::CloseOut);
        assert_eq!("payment".parse::<NetType>().unwrap(), NetType::Payment);
        assert!("gross".parse::<NetType>().is_err());
    }

    #[test]
    fn test_net_type_serde() {
        let json = serde_json::to_string(&NetType::CloseOut).unwrap();
        assert_eq!(json, "\"CLOSE_OUT\"");
        let back: NetType = serde_json::from_str("\"PAYMENT\"").unwrap();
        assert_eq!(back, NetType::Payment);
    }
}
