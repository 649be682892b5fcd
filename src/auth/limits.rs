//! Sign-in attempt limiting and inactivity tracking

use chrono::{DateTime, Duration, Utc};

use crate::error::Error;

/// Sign-in attempt policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    /// Attempts allowed before locking out
    pub max_attempts: u32,
    /// How long the lockout lasts after the last attempt
    pub lockout: std::time::Duration,
    /// Attempts older than this no longer count
    pub window: std::time::Duration,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lockout: std::time::Duration::from_secs(15 * 60),
            window: std::time::Duration::from_secs(60 * 60),
        }
    }
}

fn chrono_duration(d: std::time::Duration) -> Duration {
    Duration::from_std(d).unwrap_or_else(|_| Duration::weeks(52 * 100))
}

/// Counts sign-in attempts against a [`RateLimit`]
#[derive(Debug, Clone)]
pub struct SignInLimiter {
    limit: RateLimit,
    last_attempt: Option<DateTime<Utc>>,
    attempts: u32,
}

impl SignInLimiter {
    pub fn new(limit: RateLimit) -> Self {
        Self {
            limit,
            last_attempt: None,
            attempts: 0,
        }
    }

    /// Record an attempt at `now`, or refuse it while locked out
    pub fn check_and_record(&mut self, now: DateTime<Utc>) -> Result<(), Error> {
        if let Some(last) = self.last_attempt {
            let lockout_ends = last + chrono_duration(self.limit.lockout);
            if self.attempts >= self.limit.max_attempts && now < lockout_ends {
                let seconds_left = (lockout_ends - now).num_seconds();
                return Err(Error::RateLimited {
                    minutes_left: (seconds_left + 59) / 60,
                });
            }
        }

        let recent = self
            .last_attempt
            .map_or(false, |last| now - last < chrono_duration(self.limit.window));
        self.attempts = if recent { self.attempts + 1 } else { 1 };
        self.last_attempt = Some(now);
        Ok(())
    }

    /// Forget the attempt count after a successful sign-in
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

/// Tracks the last user activity of a signed-in session
#[derive(Debug, Clone)]
pub struct InactivityTimer {
    timeout: Duration,
    last_activity: Option<DateTime<Utc>>,
}

impl InactivityTimer {
    pub fn new(timeout: std::time::Duration) -> Self {
        Self {
            timeout: chrono_duration(timeout),
            last_activity: None,
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity = Some(now);
    }

    pub fn clear(&mut self) {
        self.last_activity = None;
    }

    /// True once `timeout` has passed since the last touch
    pub fn is_idle(&self, now: DateTime<Utc>) -> bool {
        self.last_activity
            .map_or(false, |last| now - last >= self.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locks_after_five_attempts() {
        let mut limiter = SignInLimiter::new(RateLimit::default());
        let start = Utc::now();

        for i in 0..5 {
            limiter.check_and_record(start + Duration::seconds(i)).unwrap();
        }
        assert_eq!(limiter.attempts(), 5);

        let err = limiter
            .check_and_record(start + Duration::minutes(1))
            .unwrap_err();
        match err {
            Error::RateLimited { minutes_left } => assert_eq!(minutes_left, 15),
            other => panic!("unexpected error: {:?}", other),
        }

        // lockout is measured from the last recorded attempt
        limiter
            .check_and_record(start + Duration::seconds(4) + Duration::minutes(15))
            .unwrap();
    }

    #[test]
    fn test_counter_restarts_after_window() {
        let mut limiter = SignInLimiter::new(RateLimit::default());
        let start = Utc::now();

        limiter.check_and_record(start).unwrap();
        limiter.check_and_record(start + Duration::minutes(1)).unwrap();
        assert_eq!(limiter.attempts(), 2);

        limiter.check_and_record(start + Duration::hours(2)).unwrap();
        assert_eq!(limiter.attempts(), 1);
    }

    #[test]
    fn test_reset_clears_lockout() {
        let mut limiter = SignInLimiter::new(RateLimit::default());
        let now = Utc::now();
        for _ in 0..5 {
            limiter.check_and_record(now).unwrap();
        }
        limiter.reset();
        assert!(limiter.check_and_record(now).is_ok());
    }

    #[test]
    fn test_inactivity() {
        let mut timer = InactivityTimer::new(std::time::Duration::from_secs(7200));
        let now = Utc::now();
        assert!(!timer.is_idle(now));

        timer.touch(now);
        assert!(!timer.is_idle(now + Duration::minutes(119)));
        assert!(timer.is_idle(now + Duration::hours(2)));

        timer.clear();
        assert!(!timer.is_idle(now + Duration::hours(3)));
    }
}
