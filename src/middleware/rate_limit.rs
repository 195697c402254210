//! Sliding-window throttle for credential endpoints. In-memory on purpose:
//! the store itself is in-memory, so there is no shared backend to lean on.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

pub struct LoginThrottle {
    attempts: Mutex<HashMap<String, VecDeque<Instant>>>,
    max_attempts: usize,
    window: Duration,
}

impl LoginThrottle {
    pub fn new(max_attempts: usize, window_secs: u64) -> Self {
        LoginThrottle {
            attempts: Mutex::new(HashMap::new()),
            max_attempts,
            window: Duration::from_secs(window_secs),
        }
    }

    /// Records an attempt for the key (normalized account email) and says
    /// whether it is still within the window's budget.
    pub async fn allow(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut attempts = self.attempts.lock().await;

        let history = attempts.entry(key.to_string()).or_default();
        while history
            .front()
            .is_some_and(|&at| now.duration_since(at) >= self.window)
        {
            history.pop_front();
        }

        if history.len() >= self.max_attempts {
            return false;
        }
        history.push_back(now);
        true
    }

    /// Successful login clears the account's failure budget.
    pub async fn reset(&self, key: &str) {
        self.attempts.lock().await.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_budget_per_key() {
        let throttle = LoginThrottle::new(3, 60);

        assert!(throttle.allow("a@x.dev").await);
        assert!(throttle.allow("a@x.dev").await);
        assert!(throttle.allow("a@x.dev").await);
        assert!(!throttle.allow("a@x.dev").await);

        // other accounts are unaffected
        assert!(throttle.allow("b@x.dev").await);
    }

    #[tokio::test]
    async fn test_reset_clears_budget() {
        let throttle = LoginThrottle::new(1, 60);

        assert!(throttle.allow("a@x.dev").await);
        assert!(!throttle.allow("a@x.dev").await);

        throttle.reset("a@x.dev").await;
        assert!(throttle.allow("a@x.dev").await);
    }
}
