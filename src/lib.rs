//! ICMP echo client: sends one echo request per interval to an IPv4 target,
//! matches replies by process identifier and reports round-trip times and
//! loss.
//!
//! The echo protocol is specified in [RFC 792](https://www.rfc-editor.org/rfc/rfc792).

pub mod config;
pub mod logging;
pub mod net;
pub mod ping;
