//! Time bucket arithmetic
//!
//! Buckets are half-open intervals `[start, start + interval)` aligned to
//! epoch-relative boundaries: with a 1-hour interval, buckets start at :00
//! of each hour regardless of when the process started.

use chrono::{DateTime, TimeZone, Utc};
use std::time::Duration;

/// Start of the bucket containing `now`
pub fn floor(now: DateTime<Utc>, interval: Duration) -> DateTime<Utc> {
    let ivl = interval.as_millis() as i64;
    if ivl <= 0 {
        return now;
    }
    let ts = now.timestamp_millis();
    let start = ts - ts.rem_euclid(ivl);
    // `start` lies in (ts - ivl, ts], so it is representable whenever
    // `now` is
    let floored = Utc.timestamp_millis_opt(start).single();
    debug_assert!(floored.is_some(), "floored timestamp out of chrono range");
    floored.unwrap_or(now)
}

/// Next bucket boundary at or after `now`; equals `now` when already aligned
pub fn next_boundary(now: DateTime<Utc>, interval: Duration) -> DateTime<Utc> {
    let start = floor(now, interval);
    if start == now {
        now
    } else {
        start + chrono::Duration::from_std(interval).unwrap_or_default()
    }
}

/// Wall-clock delay from `now` until the next bucket boundary; zero when
/// already aligned
pub fn delay_until_boundary(now: DateTime<Utc>, interval: Duration) -> Duration {
    (next_boundary(now, interval) - now)
        .to_std()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, h, m, s).unwrap()
    }

    #[test]
    fn test_floor_mid_bucket() {
        assert_eq!(floor(at(14, 23, 0), HOUR), at(14, 0, 0));
    }

    #[test]
    fn test_next_boundary_mid_bucket() {
        assert_eq!(next_boundary(at(14, 23, 0), HOUR), at(15, 0, 0));
    }

    #[test]
    fn test_aligned_time_is_its_own_boundary() {
        assert_eq!(floor(at(14, 0, 0), HOUR), at(14, 0, 0));
        assert_eq!(next_boundary(at(14, 0, 0), HOUR), at(14, 0, 0));
        assert_eq!(delay_until_boundary(at(14, 0, 0), HOUR), Duration::ZERO);
    }

    #[test]
    fn test_delay_until_boundary() {
        let delay = delay_until_boundary(at(14, 23, 0), HOUR);
        assert_eq!(delay, Duration::from_secs(37 * 60));
    }

    #[test]
    fn test_sub_hour_interval() {
        let fifteen = Duration::from_secs(900);
        assert_eq!(floor(at(14, 23, 0), fifteen), at(14, 15, 0));
        assert_eq!(next_boundary(at(14, 23, 0), fifteen), at(14, 30, 0));
    }

    #[test]
    fn test_floor_before_epoch() {
        // Negative millis exercise the euclidean remainder
        let now = Utc.with_ymd_and_hms(1969, 12, 31, 23, 30, 0).unwrap();
        assert_eq!(
            floor(now, HOUR),
            Utc.with_ymd_and_hms(1969, 12, 31, 23, 0, 0).unwrap()
        );
        assert_eq!(
            next_boundary(now, HOUR),
            Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_buckets_do_not_depend_on_start_time() {
        // Two observers inside the same hour agree on the bucket
        assert_eq!(floor(at(14, 1, 7), HOUR), floor(at(14, 59, 59), HOUR));
    }
}
