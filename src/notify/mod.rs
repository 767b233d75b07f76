/// Transient notifications shared by every dashboard engine.
///
/// Engines push a [`Notice`] and carry on; nothing blocks on the user
/// reading it. Notices stay visible for a fixed time-to-live and are then
/// pruned. The presentation layer drains newly raised notices with
/// [`Notifier::take_unseen`] and may show the still-live ones with
/// [`Notifier::active`].
use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Default time a notice stays on screen.
pub const DEFAULT_TTL_SECS: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Info,
    Warning,
    Danger,
}

impl Level {
    /// Level for a `{status, message}` reply: only `success` is good news.
    pub fn for_status(ok: bool) -> Self {
        if ok { Self::Success } else { Self::Danger }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: Level,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct Notifier {
    notices: VecDeque<Notice>,
    unseen: usize,
    ttl: Duration,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_TTL_SECS)
    }
}

impl Notifier {
    /// A TTL beyond what `chrono` can represent saturates to "forever".
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            notices: VecDeque::new(),
            unseen: 0,
            ttl: Duration::try_seconds(ttl_secs.max(0)).unwrap_or(Duration::MAX),
        }
    }

    pub fn push(&mut self, level: Level, message: impl Into<String>) {
        self.push_at(level, message, Utc::now());
    }

    pub fn push_at(&mut self, level: Level, message: impl Into<String>, at: DateTime<Utc>) {
        self.notices.push_back(Notice {
            level,
            message: message.into(),
            raised_at: at,
        });
        self.unseen += 1;
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(Level::Success, message);
    }

    pub fn danger(&mut self, message: impl Into<String>) {
        self.push(Level::Danger, message);
    }

    /// Notices raised since the last call, oldest first.
    pub fn take_unseen(&mut self) -> Vec<Notice> {
        let start = self.notices.len() - self.unseen;
        self.unseen = 0;
        self.notices.iter().skip(start).cloned().collect()
    }

    /// Notices still within their time-to-live at `now`.
    pub fn active(&self, now: DateTime<Utc>) -> impl Iterator<Item = &Notice> {
        let ttl = self.ttl;
        self.notices
            .iter()
            .filter(move |notice| now - notice.raised_at < ttl)
    }

    /// Drop expired notices. Unseen ones are kept regardless of age.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        let seen = self.notices.len() - self.unseen;
        let expired = self
            .notices
            .iter()
            .take(seen)
            .take_while(|notice| now - notice.raised_at >= self.ttl)
            .count();
        self.notices.drain(..expired);
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_unseen_returns_each_notice_once() {
        let mut notifier = Notifier::default();
        notifier.success("Bot starting...");
        notifier.danger("Bot is not running.");

        let first = notifier.take_unseen();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].level, Level::Success);
        assert_eq!(first[1].message, "Bot is not running.");

        assert!(notifier.take_unseen().is_empty());

        notifier.success("again");
        let next = notifier.take_unseen();
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].message, "again");
    }

    #[test]
    fn notices_expire_after_ttl() {
        let mut notifier = Notifier::new(5);
        let t0 = Utc::now();
        notifier.push_at(Level::Info, "old", t0);
        notifier.push_at(Level::Info, "new", t0 + Duration::seconds(4));

        let later = t0 + Duration::seconds(6);
        let live: Vec<&str> = notifier.active(later).map(|n| n.message.as_str()).collect();
        assert_eq!(live, ["new"]);
    }

    #[test]
    fn prune_keeps_unseen_notices() {
        let mut notifier = Notifier::new(5);
        let t0 = Utc::now();
        notifier.push_at(Level::Info, "seen", t0);
        notifier.take_unseen();
        notifier.push_at(Level::Info, "unseen", t0);

        notifier.prune(t0 + Duration::seconds(60));
        assert_eq!(notifier.len(), 1);
        assert_eq!(notifier.take_unseen()[0].message, "unseen");
    }

    #[test]
    fn huge_ttl_saturates() {
        let mut notifier = Notifier::new(i64::MAX / 100);
        let t0 = Utc::now();
        notifier.push_at(Level::Info, "sticky", t0);
        notifier.take_unseen();

        let much_later = t0 + Duration::days(3650);
        assert_eq!(notifier.active(much_later).count(), 1);
        notifier.prune(much_later);
        assert_eq!(notifier.len(), 1);
    }

    #[test]
    fn negative_ttl_expires_immediately() {
        let mut notifier = Notifier::new(-5);
        let t0 = Utc::now();
        notifier.push_at(Level::Info, "gone", t0);
        assert_eq!(notifier.active(t0).count(), 0);
    }

    #[test]
    fn level_for_status() {
        assert_eq!(Level::for_status(true), Level::Success);
        assert_eq!(Level::for_status(false), Level::Danger);
    }
}
