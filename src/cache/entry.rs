//! Cache Entry Module
//!
//! Defines individual cache items and how a caller expresses their lifetime.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Value;

// == Expiration ==
/// Lifetime requested when storing a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expiration {
    /// Use the cache's default expiration
    #[default]
    Default,
    /// Keep the value until it is deleted or flushed
    Never,
    /// Expire once the duration has elapsed
    After(Duration),
}

impl Expiration {
    /// Maps a signed millisecond count onto an expiration: `0` selects the
    /// cache default and any negative value never expires.
    pub fn from_millis(millis: i64) -> Self {
        match millis {
            0 => Expiration::Default,
            m if m < 0 => Expiration::Never,
            m => Expiration::After(Duration::from_millis(m.unsigned_abs())),
        }
    }

    /// Resolves the expiration against a cache default. `None` means the item
    /// never expires.
    pub(crate) fn resolve(self, default: Option<Duration>) -> Option<Duration> {
        match self {
            Expiration::Default => default,
            Expiration::After(d) if d.is_zero() => default,
            Expiration::After(d) => Some(d),
            Expiration::Never => None,
        }
    }
}

impl From<Duration> for Expiration {
    fn from(d: Duration) -> Self {
        if d.is_zero() {
            Expiration::Default
        } else {
            Expiration::After(d)
        }
    }
}

// == Item ==
/// A stored value and its optional absolute deadline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// The stored value
    pub value: Value,
    /// Expiration timestamp, None = no expiration
    pub expires_at: Option<DateTime<Utc>>,
}

impl Item {
    // == Constructor ==
    /// Creates an item that expires `ttl` from now, or never if `ttl` is None.
    ///
    /// A ttl too large to represent as a timestamp never expires.
    pub fn new(value: Value, ttl: Option<Duration>) -> Self {
        let expires_at = ttl.and_then(|ttl| {
            chrono::Duration::from_std(ttl)
                .ok()
                .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        });

        Self { value, expires_at }
    }

    // == Is Expired ==
    /// Checks whether the item's deadline is strictly before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expires) if expires < now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    // == Time To Live ==
    /// Returns remaining lifetime, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` if the deadline has passed
    /// - `Some(remaining)` if the item has a deadline in the future
    /// - `None` if the item never expires
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|expires| (expires - Utc::now()).to_std().unwrap_or(Duration::ZERO))
    }
}
