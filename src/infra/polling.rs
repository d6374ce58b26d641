//! Blocking retry-until-timeout helpers for node liveness checks.

use crate::infra::node::{AddressParseError, HostAndPort, NetworkMapCache, NodeInfo};
use log::{debug, trace};
use std::net::{TcpStream, ToSocketAddrs};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Polling cadence and deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Pause between attempts.
    pub interval: Duration,
    /// Give up once this much time has passed since the first attempt.
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InfraError {
    #[error("timed out after {elapsed:?} waiting for {description}")]
    Timeout {
        description: String,
        elapsed: Duration,
    },
    #[error(transparent)]
    Address(#[from] AddressParseError),
}

/// Whether something is listening on an address.
pub trait AddressProbe: Send + Sync {
    fn is_bound(&self, address: &HostAndPort) -> bool;
}

/// Probes by attempting a TCP connection.
#[derive(Debug, Clone, Copy)]
pub struct TcpAddressProbe {
    pub connect_timeout: Duration,
}

impl Default for TcpAddressProbe {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(250),
        }
    }
}

impl AddressProbe for TcpAddressProbe {
    fn is_bound(&self, address: &HostAndPort) -> bool {
        let resolved = match (address.host.as_str(), address.port).to_socket_addrs() {
            Ok(resolved) => resolved,
            Err(err) => {
                trace!("cannot resolve {}: {}", address, err);
                return false;
            }
        };
        resolved
            .into_iter()
            .any(|socket| TcpStream::connect_timeout(&socket, self.connect_timeout).is_ok())
    }
}

/// Call `check` every `config.interval` until it yields a value or
/// `config.timeout` elapses. `check` always runs at least once.
pub fn poll_until<T, F>(description: &str, config: PollConfig, mut check: F) -> Result<T, InfraError>
where
    F: FnMut() -> Option<T>,
{
    let started = Instant::now();
    loop {
        if let Some(value) = check() {
            debug!("{} after {:?}", description, started.elapsed());
            return Ok(value);
        }
        let elapsed = started.elapsed();
        if elapsed >= config.timeout {
            return Err(InfraError::Timeout {
                description: description.to_string(),
                elapsed,
            });
        }
        trace!("still waiting for {}", description);
        thread::sleep(config.interval.min(config.timeout - elapsed));
    }
}

/// Wait until the network map has a node registered as `name`.
pub fn wait_for_node(
    cache: &dyn NetworkMapCache,
    name: &str,
    config: PollConfig,
) -> Result<NodeInfo, InfraError> {
    poll_until(&format!("node '{}' in network map", name), config, || cache.lookup(name))
}

/// Wait until something is listening on `address`.
pub fn address_must_be_bound(
    probe: &dyn AddressProbe,
    address: &HostAndPort,
    config: PollConfig,
) -> Result<(), InfraError> {
    poll_until(&format!("{} to be bound", address), config, || {
        probe.is_bound(address).then_some(())
    })
}

/// Wait until nothing is listening on `address`.
pub fn address_must_not_be_bound(
    probe: &dyn AddressProbe,
    address: &HostAndPort,
    config: PollConfig,
) -> Result<(), InfraError> {
    poll_until(&format!("{} to be released", address), config, || {
        (!probe.is_bound(address)).then_some(())
    })
}
