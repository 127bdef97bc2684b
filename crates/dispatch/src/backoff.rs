//! Retry backoff schedule.
//!
//! The delay before a job's next attempt doubles with every failure:
//! attempt 1 waits 2 minutes, attempt 2 waits 4, attempt 3 waits 8, and so
//! on. The exponent is keyed to the attempt count *after* the failed attempt
//! has been recorded.

use chrono::Duration;

/// Largest exponent applied to the backoff delay (2^10 minutes ≈ 17 hours).
/// Keeps a corrupted attempt counter from scheduling a job into next year.
const MAX_BACKOFF_EXPONENT: u32 = 10;

/// Delay to apply before the next attempt, given the number of attempts
/// recorded so far (including the one that just failed).
pub fn retry_delay(attempts: i32) -> Duration {
    let exp = attempts.clamp(1, MAX_BACKOFF_EXPONENT as i32) as u32;
    Duration::minutes(2_i64.pow(exp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles_per_attempt() {
        assert_eq!(retry_delay(1), Duration::minutes(2));
        assert_eq!(retry_delay(2), Duration::minutes(4));
        assert_eq!(retry_delay(3), Duration::minutes(8));
        assert_eq!(retry_delay(4), Duration::minutes(16));
    }

    #[test]
    fn test_delay_is_strictly_increasing_below_cap() {
        for n in 1..10 {
            assert!(retry_delay(n + 1) > retry_delay(n));
        }
    }

    #[test]
    fn test_delay_is_capped() {
        assert_eq!(retry_delay(10), Duration::minutes(1024));
        assert_eq!(retry_delay(11), Duration::minutes(1024));
        assert_eq!(retry_delay(i32::MAX), Duration::minutes(1024));
    }

    #[test]
    fn test_nonpositive_attempts_treated_as_first() {
        assert_eq!(retry_delay(0), Duration::minutes(2));
        assert_eq!(retry_delay(-3), Duration::minutes(2));
    }
}
