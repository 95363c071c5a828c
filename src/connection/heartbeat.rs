use std::time::Duration;
use tokio::time::Instant;

/// Periodic ping schedule, armed only while connected
///
/// Pongs are not tracked here; a half-open connection is only noticed once the
/// transport itself reports the close.
#[derive(Debug)]
pub struct Heartbeat {
    interval: Duration,
    next: Option<Instant>,
}

impl Heartbeat {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: None,
        }
    }

    pub fn start(&mut self, now: Instant) {
        self.next = Some(now + self.interval);
    }

    pub fn stop(&mut self) {
        self.next = None;
    }

    pub fn is_running(&self) -> bool {
        self.next.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.next
    }

    /// Report whether a ping is due and advance the schedule
    ///
    /// Missed ticks are skipped: a late driver sends one ping, not a burst.
    pub fn take_due(&mut self, now: Instant) -> bool {
        let Some(due) = self.next else {
            return false;
        };
        if due > now {
            return false;
        }

        let mut next = due + self.interval;
        while next <= now {
            next += self.interval;
        }
        self.next = Some(next);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_once_per_interval() {
        let interval = Duration::from_secs(30);
        let mut heartbeat = Heartbeat::new(interval);
        let start = Instant::now();
        heartbeat.start(start);

        assert!(!heartbeat.take_due(start + Duration::from_secs(29)));
        assert!(heartbeat.take_due(start + interval));
        assert!(!heartbeat.take_due(start + interval));
        assert!(heartbeat.take_due(start + interval * 2));
    }

    #[test]
    fn test_late_tick_does_not_burst() {
        let interval = Duration::from_secs(30);
        let mut heartbeat = Heartbeat::new(interval);
        let start = Instant::now();
        heartbeat.start(start);

        assert!(heartbeat.take_due(start + Duration::from_secs(95)));
        assert!(!heartbeat.take_due(start + Duration::from_secs(95)));
        assert_eq!(heartbeat.deadline(), Some(start + Duration::from_secs(120)));
    }

    #[test]
    fn test_stopped_never_ticks() {
        let mut heartbeat = Heartbeat::new(Duration::from_secs(30));
        let start = Instant::now();
        heartbeat.start(start);
        assert!(heartbeat.is_running());
        heartbeat.stop();

        assert!(!heartbeat.is_running());
        assert!(!heartbeat.take_due(start + Duration::from_secs(300)));
    }
}
