//! Per-pass cache busting token.
//!
//! The token is the first [`CACHEBUST_LEN`] hex chars of the MD5 digest of
//! the current UTC time in ISO-8601 form with microseconds, e.g.
//! `2025-03-01T12:00:00.000042`. Not a security token, only unique in practice.

use chrono::{DateTime, Utc};
use std::fmt;

/// Number of hex characters kept from the digest (40 bits).
pub const CACHEBUST_LEN: usize = 10;

/// Placeholder key replaced by the token in every page.
pub const CACHEBUST_KEY: &str = "cachebust";

/// Timestamp layout hashed into the token.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheBust(String);

impl CacheBust {
    /// Token for the current instant.
    pub fn generate() -> Self {
        Self::at(Utc::now())
    }

    /// Token for a given instant. Same instant, same token.
    pub fn at(instant: DateTime<Utc>) -> Self {
        let timestamp = instant.format(TIMESTAMP_FORMAT).to_string();
        let digest = format!("{:x}", md5::compute(timestamp.as_bytes()));
        Self(digest[..CACHEBUST_LEN].to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheBust {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap() + Duration::microseconds(42)
    }

    #[test]
    fn test_token_shape() {
        let token = CacheBust::generate();
        assert_eq!(token.as_str().len(), CACHEBUST_LEN);
        assert!(token.as_str().chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
    }

    #[test]
    fn test_token_is_md5_prefix_of_iso_timestamp() {
        let expected = format!("{:x}", md5::compute(b"2025-03-01T12:00:00.000042"));
        assert_eq!(CacheBust::at(instant()).as_str(), &expected[..CACHEBUST_LEN]);
    }

    #[test]
    fn test_same_instant_same_token() {
        assert_eq!(CacheBust::at(instant()), CacheBust::at(instant()));
    }

    #[test]
    fn test_distinct_microseconds_distinct_tokens() {
        let a = CacheBust::at(instant());
        let b = CacheBust::at(instant() + Duration::microseconds(1));
        assert_ne!(a, b);
    }

    #[test]
    fn test_display() {
        let token = CacheBust::at(instant());
        assert_eq!(token.to_string(), token.as_str());
    }
}
