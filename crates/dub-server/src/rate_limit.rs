//! Inbound rate limiting, 10/min/address by default: a hand-rolled
//! fixed-window counter keyed by a capacity and a refill interval.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Bucket {
    count: u32,
    window_started_at: Instant,
}

/// Per-address fixed-window counter. `capacity` requests are allowed per
/// `window`; the window resets wholesale once it elapses rather than
/// sliding, trading precision at the edges for a single timestamp per
/// address.
pub struct RateLimiter {
    capacity: u32,
    window: Duration,
    buckets: Mutex<HashMap<IpAddr, Bucket>>,
}

impl RateLimiter {
    pub fn new(capacity: u32, window: Duration) -> Self {
        Self {
            capacity,
            window,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Returns `true` if the request is allowed, recording it against the
    /// address's current window as a side effect.
    pub fn check(&self, addr: IpAddr) -> bool {
        let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        let bucket = buckets.entry(addr).or_insert_with(|| Bucket {
            count: 0,
            window_started_at: now,
        });
        if now.duration_since(bucket.window_started_at) >= self.window {
            bucket.count = 0;
            bucket.window_started_at = now;
        }
        if bucket.count >= self.capacity {
            return false;
        }
        bucket.count += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_capacity_then_blocks() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let addr: IpAddr = "127.0.0.1".parse().unwrap();
        assert!(limiter.check(addr));
        assert!(limiter.check(addr));
        assert!(!limiter.check(addr));
    }

    #[test]
    fn tracks_addresses_independently() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let a: IpAddr = "127.0.0.1".parse().unwrap();
        let b: IpAddr = "127.0.0.2".parse().unwrap();
        assert!(limiter.check(a));
        assert!(limiter.check(b));
        assert!(!limiter.check(a));
    }

    #[test]
    fn window_reset_lets_traffic_through_again() {
        let limiter = RateLimiter::new(1, Duration::from_millis(20));
        let addr: IpAddr = "127.0.0.1".parse().unwrap();
        assert!(limiter.check(addr));
        assert!(!limiter.check(addr));
        std::thread::sleep(Duration::from_millis(25));
        assert!(limiter.check(addr));
    }
}
