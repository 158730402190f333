//! Time-related utilities with clock abstraction for testability.

use chrono::{DateTime, Utc};

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// Current Unix timestamp in milliseconds (UTC)
    fn now_millis(&self) -> i64;
}

/// System clock implementation (uses actual system time)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        now_millis()
    }
}

/// Fixed clock implementation for testing (returns a fixed time)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    fixed_time: i64,
}

impl FixedClock {
    /// Create a new fixed clock with the given timestamp
    pub fn new(fixed_time_millis: i64) -> Self {
        Self {
            fixed_time: fixed_time_millis,
        }
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.fixed_time
    }
}

/// Current Unix timestamp in milliseconds (UTC)
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert a Unix timestamp in milliseconds to RFC 3339 (UTC).
///
/// Out-of-range values render as the Unix epoch instead of panicking.
pub fn millis_to_rfc3339(timestamp_millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp_millis)
        .unwrap_or_default()
        .to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_returns_fixed_time() {
        // テスト項目: FixedClock は常に同じ時刻を返す
        // given (前提条件):
        let clock = FixedClock::new(1_700_000_000_000);

        // when (操作):
        let first = clock.now_millis();
        let second = clock.now_millis();

        // then (期待する結果):
        assert_eq!(first, 1_700_000_000_000);
        assert_eq!(first, second);
    }

    #[test]
    fn test_system_clock_is_monotonic_enough() {
        // テスト項目: SystemClock は現在時刻に近い値を返す
        // given (前提条件):
        let clock = SystemClock;
        let before = now_millis();

        // when (操作):
        let value = clock.now_millis();

        // then (期待する結果):
        assert!(value >= before);
    }

    #[test]
    fn test_millis_to_rfc3339() {
        // テスト項目: ミリ秒タイムスタンプが RFC 3339 (UTC) に変換される
        // given (前提条件):
        let timestamp = 1_704_067_200_123; // 2024-01-01T00:00:00.123Z

        // when (操作):
        let result = millis_to_rfc3339(timestamp);

        // then (期待する結果):
        assert_eq!(result, "2024-01-01T00:00:00.123+00:00");
    }
}
