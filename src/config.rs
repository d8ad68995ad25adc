use std::time::Duration;
use thiserror::Error;

use crate::net::icmp::{DEFAULT_PAYLOAD_SIZE, ICMP_HEADER_LEN};
use crate::net::socket::RECV_BUFFER_LEN;

/// Largest IPv4 header the receive buffer has to leave room for.
const MAX_IP_HEADER_LEN: usize = 60;

/// Largest payload whose echo reply still fits the receive buffer.
pub const MAX_PAYLOAD_SIZE: usize = RECV_BUFFER_LEN - ICMP_HEADER_LEN - MAX_IP_HEADER_LEN;

const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
const DEFAULT_RECV_BUFFER_HINT: usize = 255;
const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing target host")]
    MissingTarget,

    #[error("option -s requires a packet size")]
    MissingPayloadSize,

    #[error("invalid packet size \"{0}\"")]
    InvalidPayloadSize(String),

    #[error("unexpected argument \"{0}\"")]
    Unexpected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingConfig {
    /// Host or dotted quad as given on the command line.
    pub target: String,
    pub payload_size: usize,
    /// Pause between the end of one cycle and the next send.
    pub interval: Duration,
    /// Upper bound on a single blocking receive, so interrupts are noticed.
    pub poll_interval: Duration,
    pub recv_buffer_hint: usize,
    /// Used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl PingConfig {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            payload_size: DEFAULT_PAYLOAD_SIZE,
            interval: DEFAULT_INTERVAL,
            poll_interval: DEFAULT_POLL_INTERVAL,
            recv_buffer_hint: DEFAULT_RECV_BUFFER_HINT,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }

    /// Parses the arguments following the program name: `[-s size] target`.
    pub fn from_args<I>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let mut target = None;
        let mut payload_size = DEFAULT_PAYLOAD_SIZE;

        while let Some(arg) = args.next() {
            if arg == "-s" {
                let value = args.next().ok_or(ConfigError::MissingPayloadSize)?;
                payload_size = parse_payload_size(&value)?;
            } else if (arg.starts_with('-') && arg.len() > 1) || target.is_some() {
                return Err(ConfigError::Unexpected(arg));
            } else if arg.is_empty() {
                return Err(ConfigError::MissingTarget);
            } else {
                target = Some(arg);
            }
        }

        let mut config = Self::new(target.ok_or(ConfigError::MissingTarget)?);
        config.payload_size = payload_size;
        Ok(config)
    }
}

fn parse_payload_size(value: &str) -> Result<usize, ConfigError> {
    match value.parse::<usize>() {
        Ok(size) if size <= MAX_PAYLOAD_SIZE => Ok(size),
        _ => Err(ConfigError::InvalidPayloadSize(value.to_string())),
    }
}
