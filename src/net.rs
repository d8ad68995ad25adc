pub mod icmp;
pub mod socket;

use std::io;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("unable to resolve \"{target}\": {source}")]
    HostLookup {
        target: String,
        #[source]
        source: io::Error,
    },
    #[error("got no IPv4 address for \"{target}\"")]
    HostLookupEmpty { target: String },
}

/// Resolves `target` to the IPv4 address echo requests are sent to.
pub fn resolve(target: &str) -> Result<Ipv4Addr, LookupError> {
    // Try to parse target as an address.
    if let Ok(addr) = target.parse::<Ipv4Addr>() {
        return Ok(addr);
    }

    // Not a dotted quad, assume input is a hostname and look it up.
    let addrs = dns_lookup::lookup_host(target).map_err(|source| LookupError::HostLookup {
        target: target.to_string(),
        source,
    })?;

    addrs
        .into_iter()
        .find_map(|addr| match addr {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        })
        .ok_or_else(|| LookupError::HostLookupEmpty {
            target: target.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_dotted_quad() {
        assert_eq!(resolve("127.0.0.1").unwrap(), Ipv4Addr::LOCALHOST);
        assert_eq!(resolve("10.1.2.3").unwrap(), Ipv4Addr::new(10, 1, 2, 3));
    }

    #[test]
    fn resolve_ipv6_literal_has_no_ipv4() {
        assert!(matches!(
            resolve("::1"),
            Err(LookupError::HostLookupEmpty { .. }) | Err(LookupError::HostLookup { .. })
        ));
    }
}
