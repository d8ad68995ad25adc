pub mod errors;
pub mod stats;

use crossbeam::channel::{after, bounded, select, Receiver};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, trace, warn};

use crate::config::PingConfig;
use crate::net::icmp::{EchoPacket, EchoReply};
use crate::net::socket::{IcmpTransport, RECV_BUFFER_LEN};

pub use errors::PingError;
pub use stats::{format_percent, SessionStats, Summary};

/// One matched echo reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyReport {
    /// ICMP bytes received, IP header excluded.
    pub bytes: usize,
    pub source: Ipv4Addr,
    pub sequence: u16,
    pub rtt: Duration,
    /// Counters right after this reply was counted.
    pub summary: Summary,
}

impl ReplyReport {
    pub fn rtt_ms(&self) -> f64 {
        self.rtt.as_secs_f64() * 1000.0
    }
}

impl fmt::Display for ReplyReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} bytes from {}: icmp_seq={}, time={:.3} ms, {} packets transmitted, {} packets received, {}% packet loss",
            self.bytes,
            self.source,
            self.sequence,
            self.rtt_ms(),
            self.summary.sent,
            self.summary.received,
            format_percent(self.summary.loss_percent())
        )
    }
}

/// How a drain ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drain {
    /// Every request sent so far has been answered.
    Complete,
    Interrupted,
}

type Reporter = Box<dyn FnMut(&ReplyReport) + Send>;

/// Ping session against a single IPv4 target.
///
/// One request is in flight at a time: send, wait until it is answered, sleep
/// for the interval, repeat until a shutdown arrives.
pub struct Pinger<T> {
    transport: T,
    target: Ipv4Addr,
    identifier: u16,
    payload_size: usize,
    interval: Duration,
    next_seq: u16,
    /// Send time per outstanding sequence number.
    in_flight: HashMap<u16, Instant>,
    stats: Arc<SessionStats>,
    reporter: Reporter,
}

impl<T: IcmpTransport> Pinger<T> {
    pub fn new(transport: T, target: Ipv4Addr, config: &PingConfig) -> Self {
        Self {
            transport,
            target,
            identifier: std::process::id() as u16,
            payload_size: config.payload_size,
            interval: config.interval,
            next_seq: 0,
            in_flight: HashMap::new(),
            stats: Arc::new(SessionStats::new()),
            reporter: Box::new(|reply| println!("{}", reply)),
        }
    }

    /// Overrides the ICMP identifier (the process id by default).
    pub fn with_identifier(mut self, identifier: u16) -> Self {
        self.identifier = identifier;
        self
    }

    /// Replaces the default reporter, which prints each reply to stdout.
    pub fn with_reporter<F>(mut self, reporter: F) -> Self
    where
        F: FnMut(&ReplyReport) + Send + 'static,
    {
        self.reporter = Box::new(reporter);
        self
    }

    pub fn identifier(&self) -> u16 {
        self.identifier
    }

    pub fn stats(&self) -> Arc<SessionStats> {
        Arc::clone(&self.stats)
    }

    /// Runs send/drain/sleep cycles until `shutdown` fires, then returns the
    /// final counters.
    pub fn run(&mut self, shutdown: &Receiver<()>) -> Summary {
        loop {
            if let Err(e) = self.send_echo() {
                error!("{}", e);
            }

            if self.drain_replies(shutdown) == Drain::Interrupted {
                break;
            }

            select! {
                recv(shutdown) -> _ => break,
                recv(after(self.interval)) -> _ => {}
            }
        }

        let summary = self.stats.summary();
        debug!(sent = summary.sent, received = summary.received, "session interrupted");
        summary
    }

    /// Sends the next echo request and returns its sequence number.
    ///
    /// A failed send is not counted as sent.
    pub fn send_echo(&mut self) -> Result<u16, PingError> {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);

        let packet = EchoPacket::request(self.identifier, seq, self.payload_size).to_bytes();

        self.in_flight.insert(seq, Instant::now());
        match self.transport.send_to(&packet, self.target) {
            Ok(n) if n > 0 => {
                self.stats.record_sent();
                debug!(seq, bytes = n, target = %self.target, "sent echo request");
                Ok(seq)
            }
            Ok(_) => {
                self.in_flight.remove(&seq);
                Err(PingError::ShortSend {
                    seq,
                    target: self.target,
                })
            }
            Err(source) => {
                self.in_flight.remove(&seq);
                Err(PingError::Send {
                    seq,
                    target: self.target,
                    source,
                })
            }
        }
    }

    /// Reads datagrams until every request sent so far has been answered, or
    /// until `shutdown` fires.
    ///
    /// There is no reply timeout: a lost reply keeps this waiting until the
    /// session is interrupted.
    pub fn drain_replies(&mut self, shutdown: &Receiver<()>) -> Drain {
        let mut buf = [0u8; RECV_BUFFER_LEN];

        while self.stats.received() < self.stats.sent() {
            if shutdown.try_recv().is_ok() {
                return Drain::Interrupted;
            }

            let (n, source) = match self.transport.recv_from(&mut buf) {
                Ok(received) => received,
                Err(e) if is_idle_poll(&e) => continue,
                Err(e) => {
                    warn!("unable to recv: {}", e);
                    continue;
                }
            };

            if let Some(reply) = EchoReply::decode(&buf[..n], source) {
                self.handle_reply(reply);
            }
        }

        Drain::Complete
    }

    fn handle_reply(&mut self, reply: EchoReply) {
        if !reply.matches(self.identifier) {
            return;
        }

        let Some(sent_at) = self.in_flight.remove(&reply.sequence) else {
            trace!(seq = reply.sequence, source = %reply.source, "reply without outstanding request");
            return;
        };
        let rtt = sent_at.elapsed();
        self.stats.record_received();
        debug!(seq = reply.sequence, ?rtt, "matched echo reply");

        let report = ReplyReport {
            bytes: reply.icmp_len,
            source: reply.source,
            sequence: reply.sequence,
            rtt,
            summary: self.stats.summary(),
        };
        (self.reporter)(&report);
    }
}

/// Receive errors that only mean nothing arrived yet: the poll timeout
/// expired, or a signal cut the wait short.
fn is_idle_poll(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
    )
}

/// Installs the SIGINT handler. The returned channel yields once per signal.
pub fn shutdown_signal() -> Result<Receiver<()>, PingError> {
    let (sender, receiver) = bounded(1);
    ctrlc::set_handler(move || {
        let _ = sender.try_send(());
    })?;

    Ok(receiver)
}
