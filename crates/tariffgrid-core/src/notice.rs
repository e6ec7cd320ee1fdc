//! Transient user notices that expire after a fixed time.

use std::time::{Duration, Instant};

use tracing::info;

/// How long a notice stays visible by default
pub const DEFAULT_TTL: Duration = Duration::from_secs(3);

#[derive(Clone, Debug)]
struct Notice {
    message: String,
    raised_at: Instant,
}

/// Holds the latest notice; a new one replaces the previous
#[derive(Clone, Debug)]
pub struct NoticeBoard {
    ttl: Duration,
    current: Option<Notice>,
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl NoticeBoard {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, current: None }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn raise(&mut self, message: impl Into<String>, now: Instant) {
        let message = message.into();
        info!(notice = %message);
        self.current = Some(Notice {
            message,
            raised_at: now,
        });
    }

    /// The visible notice at `now`, if it has not expired
    pub fn current(&self, now: Instant) -> Option<&str> {
        self.current
            .as_ref()
            .filter(|n| now.saturating_duration_since(n.raised_at) < self.ttl)
            .map(|n| n.message.as_str())
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_expires_after_ttl() {
        let start = Instant::now();
        let mut board = NoticeBoard::default();
        board.raise("Данные сохранены", start);
        assert_eq!(board.current(start), Some("Данные сохранены"));
        assert_eq!(
            board.current(start + Duration::from_millis(2999)),
            Some("Данные сохранены")
        );
        assert_eq!(board.current(start + Duration::from_secs(3)), None);
    }

    #[test]
    fn new_notice_replaces_old() {
        let start = Instant::now();
        let mut board = NoticeBoard::new(Duration::from_secs(1));
        board.raise("first", start);
        board.raise("second", start + Duration::from_millis(500));
        assert_eq!(board.current(start + Duration::from_millis(1200)), Some("second"));
        board.dismiss();
        assert_eq!(board.current(start + Duration::from_millis(1200)), None);
    }
}
