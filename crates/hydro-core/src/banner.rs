// ── Status banner ──
//
// Two-state machine behind the assignment status line: idle, or showing a
// message until an optional deadline. A new message always replaces the
// current one and restarts the delay; messages are never queued.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
enum BannerState {
    Idle,
    Showing {
        message: String,
        /// `None` keeps the message until it is replaced.
        expires_at: Option<Instant>,
    },
}

/// Auto-clearing status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBanner {
    state: BannerState,
    delay: Duration,
}

impl StatusBanner {
    pub fn new(delay: Duration) -> Self {
        Self {
            state: BannerState::Idle,
            delay,
        }
    }

    /// Show `message` until `now + delay`.
    pub fn show(&mut self, message: impl Into<String>, now: Instant) {
        self.state = BannerState::Showing {
            message: message.into(),
            expires_at: Some(now + self.delay),
        };
    }

    /// Show `message` until another message replaces it.
    pub fn show_persistent(&mut self, message: impl Into<String>) {
        self.state = BannerState::Showing {
            message: message.into(),
            expires_at: None,
        };
    }

    /// Clear the message if its deadline has passed. Returns `true` when
    /// this call cleared it.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.state {
            BannerState::Showing {
                expires_at: Some(deadline),
                ..
            } if now >= deadline => {
                self.state = BannerState::Idle;
                true
            }
            _ => false,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match &self.state {
            BannerState::Idle => None,
            BannerState::Showing { message, .. } => Some(message),
        }
    }

    /// Current text, empty when idle.
    pub fn text(&self) -> &str {
        self.message().unwrap_or_default()
    }

    pub fn is_showing(&self) -> bool {
        matches!(self.state, BannerState::Showing { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_secs(3);

    #[test]
    fn starts_idle() {
        let banner = StatusBanner::new(DELAY);
        assert!(!banner.is_showing());
        assert_eq!(banner.text(), "");
    }

    #[test]
    fn message_clears_after_delay() {
        let t0 = Instant::now();
        let mut banner = StatusBanner::new(DELAY);
        banner.show("OK: assigned", t0);

        assert!(!banner.expire(t0 + Duration::from_millis(2_999)));
        assert_eq!(banner.message(), Some("OK: assigned"));

        assert!(banner.expire(t0 + DELAY));
        assert_eq!(banner.message(), None);
        assert!(!banner.expire(t0 + DELAY * 2));
    }

    #[test]
    fn new_message_resets_delay() {
        let t0 = Instant::now();
        let mut banner = StatusBanner::new(DELAY);
        banner.show("first", t0);
        banner.show("second", t0 + Duration::from_secs(2));

        assert!(!banner.expire(t0 + Duration::from_secs(4)));
        assert_eq!(banner.text(), "second");
        assert!(banner.expire(t0 + Duration::from_secs(5)));
    }

    #[test]
    fn persistent_message_never_expires() {
        let t0 = Instant::now();
        let mut banner = StatusBanner::new(DELAY);
        banner.show_persistent("Error: connection refused");

        assert!(!banner.expire(t0 + Duration::from_secs(3_600)));
        assert_eq!(banner.text(), "Error: connection refused");

        banner.show("OK", t0);
        assert!(banner.expire(t0 + DELAY));
    }
}
