use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use agora_types::SharePayload;

use crate::error::{BoardError, Result};

/// Lifetimes a share link may be issued with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShareTtl {
    OneDay,
    #[default]
    SevenDays,
    ThirtyDays,
}

impl ShareTtl {
    pub fn from_days(days: u64) -> Result<Self> {
        match days {
            1 => Ok(Self::OneDay),
            7 => Ok(Self::SevenDays),
            30 => Ok(Self::ThirtyDays),
            other => Err(BoardError::validation(format!(
                "link lifetime must be 1, 7 or 30 days, got {}",
                other
            ))),
        }
    }

    pub fn days(&self) -> i64 {
        match self {
            Self::OneDay => 1,
            Self::SevenDays => 7,
            Self::ThirtyDays => 30,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::days(self.days())
    }

    /// `(issuedAt, expiresAt)` for a link issued at `now`.
    pub fn stamp(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        (now, now + self.duration())
    }
}

/// Reject a decrypted payload whose link has run out.
///
/// Runs after successful decryption, so an expired link is reported as
/// `ExpiredLink`, never as a crypto failure.
pub fn check_payload(payload: &SharePayload, now: DateTime<Utc>) -> Result<()> {
    if payload.expires_at < payload.issued_at {
        return Err(BoardError::validation("link expires before it was issued"));
    }
    if payload.expires_at - payload.issued_at > ShareTtl::ThirtyDays.duration() {
        return Err(BoardError::validation("link lifetime exceeds 30 days"));
    }
    if now > payload.expires_at {
        debug!("Rejecting link that expired at {}", payload.expires_at);
        return Err(BoardError::ExpiredLink {
            expires_at: payload.expires_at,
        });
    }
    Ok(())
}

/// Clock drift tolerated on `savedAt` stamps from another writer.
pub const MAX_CACHE_CLOCK_SKEW: Duration = Duration::minutes(5);

/// True when a cache entry saved at `saved_at` is older than `ttl`, or is
/// stamped further in the future than clock skew explains.
pub fn cache_entry_expired(saved_at: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    let age = now - saved_at;
    age > ttl || -age > MAX_CACHE_CLOCK_SKEW
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn payload(issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> SharePayload {
        SharePayload {
            title: "Board".into(),
            creator: "Ada".into(),
            created_at: issued_at,
            participants: vec![],
            agenda_items: vec![],
            issued_at,
            expires_at,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn stamps_issue_and_expiry() {
        let (issued, expires) = ShareTtl::OneDay.stamp(t0());
        assert_eq!(issued, t0());
        assert_eq!(expires, t0() + Duration::days(1));
    }

    #[test]
    fn valid_until_expiry_instant() {
        let (issued, expires) = ShareTtl::SevenDays.stamp(t0());
        let p = payload(issued, expires);
        assert!(check_payload(&p, t0()).is_ok());
        assert!(check_payload(&p, expires).is_ok());
    }

    #[test]
    fn expired_after_deadline() {
        let (issued, expires) = ShareTtl::SevenDays.stamp(t0());
        let p = payload(issued, expires);
        let err = check_payload(&p, expires + Duration::seconds(1)).unwrap_err();
        assert!(matches!(err, BoardError::ExpiredLink { expires_at } if expires_at == expires));
    }

    #[test]
    fn inconsistent_stamps_are_invalid() {
        let p = payload(t0(), t0() - Duration::days(1));
        assert!(matches!(check_payload(&p, t0()), Err(BoardError::Validation(_))));

        let p = payload(t0(), t0() + Duration::days(365));
        assert!(matches!(check_payload(&p, t0()), Err(BoardError::Validation(_))));
    }

    #[test]
    fn cache_ttl_boundary() {
        let ttl = Duration::days(7);
        assert!(!cache_entry_expired(t0(), t0() + ttl, ttl));
        assert!(cache_entry_expired(t0(), t0() + ttl + Duration::seconds(1), ttl));
    }

    #[test]
    fn future_dated_cache_entries_are_stale() {
        let ttl = Duration::days(7);
        assert!(!cache_entry_expired(t0() + Duration::minutes(2), t0(), ttl));
        assert!(cache_entry_expired(t0() + Duration::days(365), t0(), ttl));
    }

    #[test]
    fn ttl_choices() {
        assert_eq!(ShareTtl::from_days(30).unwrap(), ShareTtl::ThirtyDays);
        assert!(ShareTtl::from_days(14).is_err());
        assert_eq!(ShareTtl::default().days(), 7);
    }
}
