use crate::core::party::Party;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A network address as `host:port`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostAndPort {
    pub host: String,
    pub port: u16,
}

impl HostAndPort {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for HostAndPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid address '{input}': {reason}")]
pub struct AddressParseError {
    pub input: String,
    pub reason: String,
}

impl FromStr for HostAndPort {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fail = |reason: &str| AddressParseError {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let (host, port) = s.rsplit_once(':').ok_or_else(|| fail("missing port"))?;
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        if host.is_empty() {
            return Err(fail("missing host"));
        }
        let port = port.parse::<u16>().map_err(|_| fail("port is not a number in 0..=65535"))?;
        Ok(Self::new(host, port))
    }
}

/// What the network map knows about a registered node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub address: HostAndPort,
    pub legal_identity: Party,
}

impl NodeInfo {
    pub fn new(address: HostAndPort, legal_identity: Party) -> Self {
        Self {
            address,
            legal_identity,
        }
    }
}

/// Read access to the network map: the directory of registered nodes.
pub trait NetworkMapCache: Send + Sync {
    /// The node registered under the legal name `name`, if any.
    fn lookup(&self, name: &str) -> Option<NodeInfo>;
}
