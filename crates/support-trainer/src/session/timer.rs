use chrono::{DateTime, Utc};

/// Start-of-simulation marker used to derive elapsed time for the speed score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimer {
    started_at: DateTime<Utc>,
}

impl SessionTimer {
    pub fn start(now: DateTime<Utc>) -> Self {
        Self { started_at: now }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Seconds since start; clock skew backwards yields zero.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> f64 {
        let millis = (now - self.started_at).num_milliseconds().max(0);
        millis as f64 / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn elapsed_counts_from_start() {
        let start = Utc::now();
        let timer = SessionTimer::start(start);
        assert_eq!(timer.elapsed_seconds(start), 0.0);
        assert_eq!(timer.elapsed_seconds(start + Duration::milliseconds(1_500)), 1.5);
        assert_eq!(timer.elapsed_seconds(start + Duration::minutes(5)), 300.0);
    }

    #[test]
    fn clock_going_backwards_is_zero() {
        let start = Utc::now();
        let timer = SessionTimer::start(start);
        assert_eq!(timer.elapsed_seconds(start - Duration::seconds(10)), 0.0);
    }
}
