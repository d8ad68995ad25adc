use std::io;
use std::net::Ipv4Addr;
use thiserror::Error;

use crate::config::ConfigError;
use crate::net::LookupError;

#[derive(Debug, Error)]
pub enum PingError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("unable to open ICMP socket: {0}")]
    Socket(#[source] io::Error),

    #[error("unable to setup SIGINT handler: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error("unable to send echo request {seq} to {target}: {source}")]
    Send {
        seq: u16,
        target: Ipv4Addr,
        #[source]
        source: io::Error,
    },

    #[error("echo request {seq} to {target} was not sent")]
    ShortSend { seq: u16, target: Ipv4Addr },
}
