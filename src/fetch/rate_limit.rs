//! Per-domain rate limiting
//!
//! A single [`RateLimiter`] is shared across every fetcher and crawl session
//! in the process. It guarantees that no two requests to one domain start
//! closer together than that domain's configured delay, regardless of which
//! task issues them.

use std::collections::HashMap;
use std::sync::Mutex as StdMutex;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Enforces a minimum interval between requests to each domain
///
/// `acquire` reserves the next send slot for a domain and sleeps until it
/// arrives. The reservation happens under the lock, so concurrent callers
/// for the same domain queue up behind each other; callers for other
/// domains are never blocked beyond the brief map access.
pub struct RateLimiter {
    last_request: Mutex<HashMap<String, Instant>>,
    overrides: StdMutex<HashMap<String, Duration>>,
    default_delay: Duration,
}

impl RateLimiter {
    /// Creates a limiter with the given default per-domain delay
    pub fn new(default_delay: Duration) -> Self {
        Self {
            last_request: Mutex::new(HashMap::new()),
            overrides: StdMutex::new(HashMap::new()),
            default_delay,
        }
    }

    /// Sets a per-domain delay override
    pub fn set_domain_delay(&self, domain: &str, delay: Duration) {
        self.overrides
            .lock()
            .expect("rate limiter override lock poisoned")
            .insert(domain.to_string(), delay);
    }

    /// The delay currently in force for a domain
    pub fn delay_for(&self, domain: &str) -> Duration {
        self.overrides
            .lock()
            .expect("rate limiter override lock poisoned")
            .get(domain)
            .copied()
            .unwrap_or(self.default_delay)
    }

    /// Waits until a request to `domain` may be sent, then records it
    pub async fn acquire(&self, domain: &str) {
        let delay = self.delay_for(domain);

        let wait = {
            let mut map = self.last_request.lock().await;
            let now = Instant::now();
            match map.get(domain) {
                Some(last) => {
                    // Reserve the next slot even if it is in the future, so
                    // queued callers space themselves a full delay apart.
                    let ready_at = *last + delay;
                    if ready_at <= now {
                        map.insert(domain.to_string(), now);
                        Duration::ZERO
                    } else {
                        map.insert(domain.to_string(), ready_at);
                        ready_at - now
                    }
                }
                None => {
                    map.insert(domain.to_string(), now);
                    Duration::ZERO
                }
            }
        };

        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_first_request_is_immediate() {
        let limiter = RateLimiter::new(Duration::from_secs(10));
        let start = Instant::now();
        limiter.acquire("example.com").await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_second_request_waits() {
        let limiter = RateLimiter::new(Duration::from_millis(100));
        let start = Instant::now();
        limiter.acquire("example.com").await;
        limiter.acquire("example.com").await;
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_domains_are_independent() {
        let limiter = RateLimiter::new(Duration::from_secs(5));
        let start = Instant::now();
        limiter.acquire("a.com").await;
        limiter.acquire("b.com").await;
        limiter.acquire("c.com").await;
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_override_applies() {
        let limiter = RateLimiter::new(Duration::from_secs(30));
        limiter.set_domain_delay("fast.com", Duration::from_millis(10));
        assert_eq!(limiter.delay_for("fast.com"), Duration::from_millis(10));
        assert_eq!(limiter.delay_for("slow.com"), Duration::from_secs(30));

        let start = Instant::now();
        limiter.acquire("fast.com").await;
        limiter.acquire("fast.com").await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(10));
        assert!(elapsed < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_concurrent_callers_are_spaced() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(50)));
        let start = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..3 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                limiter.acquire("example.com").await;
                Instant::now()
            }));
        }

        let mut times: Vec<Instant> = Vec::new();
        for handle in handles {
            times.push(handle.await.unwrap());
        }
        times.sort();

        // Three acquisitions at 50ms spacing need at least 100ms in total
        assert!(times[2].duration_since(start) >= Duration::from_millis(100));
    }
}
