//! Session counters and the reports built from them.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide sent/received counters.
///
/// Only the session loop increments them; anything else holding the `Arc`
/// reads snapshots through [`SessionStats::summary`].
#[derive(Debug, Default)]
pub struct SessionStats {
    sent: AtomicU64,
    received: AtomicU64,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_sent(&self) {
        self.sent.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::SeqCst);
    }

    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::SeqCst)
    }

    pub fn received(&self) -> u64 {
        self.received.load(Ordering::SeqCst)
    }

    pub fn summary(&self) -> Summary {
        // received first so a concurrent send can never make it exceed sent
        let received = self.received();
        let sent = self.sent();
        Summary { sent, received }
    }

    /// The block printed when the session ends.
    pub fn report(&self) -> String {
        format!("-------- PING STATISTICS --------\n{}", self.summary())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub sent: u64,
    pub received: u64,
}

impl Summary {
    pub fn loss_percent(&self) -> f64 {
        if self.sent == 0 {
            return 0.0;
        }
        let lost = self.sent.saturating_sub(self.received);
        lost as f64 / self.sent as f64 * 100.0
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} total packets transmitted, {} total packets received, {}% packet loss",
            self.sent,
            self.received,
            format_percent(self.loss_percent())
        )
    }
}

/// At most two decimals, trailing zeros dropped: `0`, `30`, `33.33`.
pub fn format_percent(value: f64) -> String {
    let s = format!("{:.2}", value);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loss_uses_float_division() {
        let summary = Summary { sent: 10, received: 7 };
        assert!((summary.loss_percent() - 30.0).abs() < 1e-9);
        assert_eq!(
            summary.to_string(),
            "10 total packets transmitted, 7 total packets received, 30% packet loss"
        );
    }

    #[test]
    fn no_loss_after_matched_cycles() {
        let stats = SessionStats::new();
        for _ in 0..5 {
            stats.record_sent();
            stats.record_received();
        }
        let summary = stats.summary();
        assert_eq!(summary, Summary { sent: 5, received: 5 });
        assert_eq!(summary.loss_percent(), 0.0);
    }

    #[test]
    fn empty_session_reports_zero_loss() {
        let stats = SessionStats::new();
        assert_eq!(stats.summary().loss_percent(), 0.0);
        assert_eq!(
            stats.report(),
            "-------- PING STATISTICS --------\n\
             0 total packets transmitted, 0 total packets received, 0% packet loss"
        );
    }

    #[test]
    fn percent_formatting() {
        assert_eq!(format_percent(0.0), "0");
        assert_eq!(format_percent(100.0), "100");
        assert_eq!(format_percent(100.0 / 3.0), "33.33");
        assert_eq!(format_percent(12.5), "12.5");
    }
}
