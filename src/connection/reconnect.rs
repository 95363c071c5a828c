use std::time::Duration;
use tokio::time::Instant;

use crate::session::Session;

/// Exponential backoff with a bounded number of attempts
///
/// The delay for attempt `n` (0-based) is `base_delay * 2^n`. At most one
/// reconnect is pending at any time.
#[derive(Debug)]
pub struct ReconnectPolicy {
    max_attempts: u32,
    base_delay: Duration,
    pending: Option<Instant>,
}

impl ReconnectPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            pending: None,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Not connected, not connecting, and attempts left
    pub fn is_eligible(&self, session: &Session) -> bool {
        !session.state().is_active() && session.reconnect_attempts < self.max_attempts
    }

    pub fn is_exhausted(&self, session: &Session) -> bool {
        session.reconnect_attempts >= self.max_attempts
    }

    pub fn delay_for(&self, attempts: u32) -> Duration {
        let factor = 1u32.checked_shl(attempts).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Schedule the next attempt, replacing any pending one, and charge it
    /// against the session's budget
    pub fn schedule(&mut self, session: &mut Session, now: Instant) -> Duration {
        let delay = self.delay_for(session.reconnect_attempts);
        session.reconnect_attempts += 1;
        self.pending = Some(now + delay);
        delay
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Clear and report the pending attempt if it is due
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.pending {
            Some(deadline) if deadline <= now => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_sequence() {
        let policy = ReconnectPolicy::new(5, Duration::from_millis(1000));
        let delays: Vec<u128> = (0..5).map(|n| policy.delay_for(n).as_millis()).collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 16000]);
    }

    #[test]
    fn test_schedule_charges_budget_and_replaces_timer() {
        let mut policy = ReconnectPolicy::new(5, Duration::from_millis(1000));
        let mut session = Session::new();
        let now = Instant::now();

        policy.schedule(&mut session, now);
        policy.schedule(&mut session, now);

        assert_eq!(session.reconnect_attempts, 2);
        assert_eq!(policy.deadline(), Some(now + Duration::from_millis(2000)));
    }

    #[test]
    fn test_budget_exhaustion() {
        let mut policy = ReconnectPolicy::new(2, Duration::from_millis(10));
        let mut session = Session::new();
        let now = Instant::now();

        assert!(policy.is_eligible(&session));
        policy.schedule(&mut session, now);
        policy.schedule(&mut session, now);
        assert!(!policy.is_eligible(&session));
        assert!(policy.is_exhausted(&session));
    }

    #[test]
    fn test_huge_attempt_count_saturates() {
        let policy = ReconnectPolicy::new(100, Duration::from_millis(1000));
        assert!(policy.delay_for(64) >= policy.delay_for(31));
    }
}
