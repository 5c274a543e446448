//! Fixed-window admission control keyed by client identity and route class.

use crate::constants::{DOWNLOAD_QUOTA_PER_WINDOW, RATE_WINDOW_SECS, SEARCH_QUOTA_PER_WINDOW};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Route classes with independent quotas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteClass {
    Search,
    Download,
}

impl RouteClass {
    /// Requests admitted per window for this class.
    pub fn quota(&self) -> u32 {
        match self {
            RouteClass::Search => SEARCH_QUOTA_PER_WINDOW,
            RouteClass::Download => DOWNLOAD_QUOTA_PER_WINDOW,
        }
    }

    /// Window duration for this class.
    pub fn window(&self) -> Duration {
        Duration::from_secs(RATE_WINDOW_SECS)
    }
}

/// Outcome of one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub allowed: bool,
    /// Requests left in the current window (0 when denied).
    pub remaining: u32,
    /// The quota for the route class, for client messaging.
    pub limit: u32,
    /// Seconds until the current window ends; a retry hint when denied.
    pub retry_after_secs: u64,
}

struct Bucket {
    count: u32,
    window_start: Instant,
}

/// In-process admission gate holding one counter per (client, route class).
///
/// Buckets are not persisted; a process restart clears all quota state.
/// This is a soft throttle, not a security control.
#[derive(Default)]
pub struct RateLimiter {
    buckets: Mutex<HashMap<(String, RouteClass), Bucket>>,
}

impl RateLimiter {
    fn state(&self) -> MutexGuard<'_, HashMap<(String, RouteClass), Bucket>> {
        // Buckets are plain counters, structurally valid even if a holder
        // panicked mid-update, so a poisoned guard is safe to reuse.
        match self.buckets.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("rate limiter mutex poisoned; continuing with existing buckets");
                poisoned.into_inner()
            }
        }
    }

    /// Check and consume one admission for `client_id` on `class`.
    ///
    /// Within a window the counter only increments; it resets when the
    /// window elapses. The read-modify-write is atomic under the bucket map
    /// mutex, so concurrent requests for the same client never undercount.
    ///
    /// # Arguments
    /// - `client_id`: Trusted client identity (callers derive it from the
    ///   forwarded address, with unidentifiable clients sharing `"unknown"`).
    /// - `class`: Route class whose quota applies.
    ///
    /// # Returns
    /// The [`Admission`] outcome, including the remaining quota.
    pub fn admit(&self, client_id: &str, class: RouteClass) -> Admission {
        self.admit_at(client_id, class, Instant::now())
    }

    /// [`RateLimiter::admit`] with an explicit clock, for window tests.
    pub fn admit_at(&self, client_id: &str, class: RouteClass, now: Instant) -> Admission {
        let quota = class.quota();
        let window = class.window();
        let mut buckets = self.state();

        let bucket = buckets
            .entry((client_id.to_string(), class))
            .and_modify(|bucket| {
                if now.duration_since(bucket.window_start) >= window {
                    bucket.count = 0;
                    bucket.window_start = now;
                }
            })
            .or_insert(Bucket {
                count: 0,
                window_start: now,
            });

        bucket.count += 1;
        let elapsed = now.duration_since(bucket.window_start);
        let retry_after_secs = window.saturating_sub(elapsed).as_secs().max(1);

        if bucket.count > quota {
            Admission {
                allowed: false,
                remaining: 0,
                limit: quota,
                retry_after_secs,
            }
        } else {
            Admission {
                allowed: true,
                remaining: quota - bucket.count,
                limit: quota,
                retry_after_secs,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Admission, RateLimiter, RouteClass};
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn quota_is_consumed_with_decreasing_remaining_then_denied() {
        let limiter = RateLimiter::default();
        let now = Instant::now();
        let quota = RouteClass::Search.quota();

        for call in 1..=quota {
            let admission = limiter.admit_at("10.0.0.1", RouteClass::Search, now);
            assert!(admission.allowed, "call {} should be admitted", call);
            assert_eq!(admission.remaining, quota - call);
        }

        let denied = limiter.admit_at("10.0.0.1", RouteClass::Search, now);
        assert_eq!(
            denied,
            Admission {
                allowed: false,
                remaining: 0,
                limit: quota,
                retry_after_secs: 60,
            }
        );
    }

    #[test]
    fn window_elapse_resets_the_bucket() {
        let limiter = RateLimiter::default();
        let start = Instant::now();
        let quota = RouteClass::Search.quota();

        for _ in 0..=quota {
            limiter.admit_at("10.0.0.1", RouteClass::Search, start);
        }
        let denied = limiter.admit_at("10.0.0.1", RouteClass::Search, start);
        assert!(!denied.allowed);

        let after_window = start + RouteClass::Search.window();
        let admission = limiter.admit_at("10.0.0.1", RouteClass::Search, after_window);
        assert!(admission.allowed);
        assert_eq!(admission.remaining, quota - 1);
    }

    #[test]
    fn counter_holds_until_the_window_actually_elapses() {
        let limiter = RateLimiter::default();
        let start = Instant::now();
        let quota = RouteClass::Download.quota();

        for _ in 0..quota {
            assert!(
                limiter
                    .admit_at("10.0.0.1", RouteClass::Download, start)
                    .allowed
            );
        }
        let one_second_short =
            start + RouteClass::Download.window() - Duration::from_secs(1);
        let denied = limiter.admit_at("10.0.0.1", RouteClass::Download, one_second_short);
        assert!(!denied.allowed);
        assert_eq!(denied.retry_after_secs, 1);
    }

    #[test]
    fn clients_and_route_classes_have_independent_buckets() {
        let limiter = RateLimiter::default();
        let now = Instant::now();
        let quota = RouteClass::Search.quota();

        for _ in 0..=quota {
            limiter.admit_at("10.0.0.1", RouteClass::Search, now);
        }
        assert!(!limiter.admit_at("10.0.0.1", RouteClass::Search, now).allowed);

        assert!(limiter.admit_at("10.0.0.2", RouteClass::Search, now).allowed);
        assert!(
            limiter
                .admit_at("10.0.0.1", RouteClass::Download, now)
                .allowed
        );
    }

    #[test]
    fn concurrent_admissions_never_exceed_quota() {
        let limiter = Arc::new(RateLimiter::default());
        let now = Instant::now();
        let quota = RouteClass::Search.quota() as usize;
        let attempts_per_thread = 10usize;

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                thread::spawn(move || {
                    (0..attempts_per_thread)
                        .filter(|_| limiter.admit_at("shared", RouteClass::Search, now).allowed)
                        .count()
                })
            })
            .collect();

        let admitted: usize = handles
            .into_iter()
            .map(|handle| handle.join().expect("thread"))
            .sum();
        assert_eq!(admitted, quota);
    }
}
