//! Anomaly rules evaluated against a sensor's sliding window.
//!
//! A rule only sees the window after a valid temperature was pushed; readings
//! without a temperature never reach it.

use crate::errors::{Error, Result};
use crate::model::AlertDecision;
use crate::window::SlidingWindow;

/// Degrees the smoker may fall below any reading still in the window.
pub const SMOKER_DROP_THRESHOLD: f64 = 15.0;

/// Minimum rise expected from a food probe over a full window.
pub const FOOD_STALL_THRESHOLD: f64 = 1.0;

pub trait AnomalyRule: Send {
    fn name(&self) -> &str;

    /// Checks the window, `timestamp` being that of the newest reading.
    fn evaluate(&self, window: &SlidingWindow, timestamp: &str) -> Result<AlertDecision>;
}

/// Fires when any older value exceeds the newest by more than `threshold`.
///
/// Only older-minus-newest is compared, not consecutive deltas. Evaluates as
/// soon as two values are present.
#[derive(Debug, Clone)]
pub struct DropRule {
    pub threshold: f64,
    pub tag: String,
}

impl DropRule {
    pub fn new(tag: &str, threshold: f64) -> Self {
        Self {
            threshold,
            tag: tag.to_string(),
        }
    }
}

impl AnomalyRule for DropRule {
    fn name(&self) -> &str {
        "temperature-drop"
    }

    fn evaluate(&self, window: &SlidingWindow, timestamp: &str) -> Result<AlertDecision> {
        let newest = window.newest().ok_or_else(|| {
            Error::RuleEvaluation("drop rule evaluated on an empty window".to_string())
        })?;

        if window.len() < 2 {
            return Ok(AlertDecision::quiet());
        }

        let dropped = window
            .values()
            .iter()
            .take(window.len() - 1)
            .any(|older| older - newest > self.threshold);

        if dropped {
            Ok(AlertDecision::alert(format!(
                "{} ALERT: At {} your temperature dropped more than {} degrees.",
                self.tag, timestamp, self.threshold
            )))
        } else {
            Ok(AlertDecision::quiet())
        }
    }
}

/// Fires when a full window rose by less than `threshold` from oldest to newest.
///
/// Never evaluates a partially filled window. Once full it re-evaluates on
/// every push.
#[derive(Debug, Clone)]
pub struct StallRule {
    pub threshold: f64,
    pub tag: String,
    pub window_minutes: u64,
}

impl StallRule {
    pub fn new(tag: &str, threshold: f64, window_minutes: u64) -> Self {
        Self {
            threshold,
            tag: tag.to_string(),
            window_minutes,
        }
    }
}

impl AnomalyRule for StallRule {
    fn name(&self) -> &str {
        "temperature-stall"
    }

    fn evaluate(&self, window: &SlidingWindow, timestamp: &str) -> Result<AlertDecision> {
        if window.is_empty() {
            return Err(Error::RuleEvaluation(
                "stall rule evaluated on an empty window".to_string(),
            ));
        }

        if !window.is_full() {
            return Ok(AlertDecision::quiet());
        }

        let (oldest, newest) = match (window.oldest(), window.newest()) {
            (Some(oldest), Some(newest)) => (oldest, newest),
            _ => {
                return Err(Error::RuleEvaluation(
                    "full window without bounds".to_string(),
                ))
            }
        };

        if newest - oldest < self.threshold {
            Ok(AlertDecision::alert(format!(
                "{} ALERT: At {} your food temperature has stalled for {} minutes.",
                self.tag, timestamp, self.window_minutes
            )))
        } else {
            Ok(AlertDecision::quiet())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window_of(capacity: usize, values: &[f64]) -> SlidingWindow {
        let mut window = SlidingWindow::new(capacity);
        for v in values {
            window.push(*v);
        }
        window
    }

    fn smoker_rule() -> DropRule {
        DropRule::new("SMOKER", SMOKER_DROP_THRESHOLD)
    }

    fn food_rule() -> StallRule {
        StallRule::new("FOOD1", FOOD_STALL_THRESHOLD, 10)
    }

    #[test]
    fn test_drop_triggers() {
        let window = window_of(5, &[100.0, 90.0, 70.0]);
        let decision = smoker_rule().evaluate(&window, "13:01:30").unwrap();
        assert!(decision.triggered);
        assert!(decision.message.starts_with("SMOKER ALERT"));
        assert!(decision.message.contains("13:01:30"));
    }

    #[test]
    fn test_gradual_decline_does_not_trigger() {
        let window = window_of(5, &[100.0, 95.0, 90.0]);
        let decision = smoker_rule().evaluate(&window, "13:01:30").unwrap();
        assert!(!decision.triggered);
    }

    #[test]
    fn test_drop_exactly_at_threshold_does_not_trigger() {
        let window = window_of(5, &[100.0, 85.0]);
        assert!(!smoker_rule().evaluate(&window, "t").unwrap().triggered);
    }

    #[test]
    fn test_drop_fires_before_window_is_full() {
        let window = window_of(5, &[230.0, 210.0]);
        assert!(smoker_rule().evaluate(&window, "t").unwrap().triggered);
    }

    #[test]
    fn test_drop_single_value_is_quiet() {
        let window = window_of(5, &[230.0]);
        assert!(!smoker_rule().evaluate(&window, "t").unwrap().triggered);
    }

    #[test]
    fn test_drop_compares_against_newest_only() {
        // Every consecutive delta is 10, the first-to-newest gap is 20
        let window = window_of(5, &[120.0, 110.0, 100.0]);
        assert!(smoker_rule().evaluate(&window, "t").unwrap().triggered);

        // A past dip followed by recovery is not a drop
        let window = window_of(5, &[100.0, 60.0, 100.0]);
        assert!(!smoker_rule().evaluate(&window, "t").unwrap().triggered);
    }

    #[test]
    fn test_drop_forgets_evicted_values() {
        let window = window_of(5, &[200.0, 180.0, 180.0, 180.0, 180.0, 180.0]);
        assert!(!smoker_rule().evaluate(&window, "t").unwrap().triggered);
    }

    #[test]
    fn test_stall_triggers_on_full_window() {
        let mut values = vec![150.0; 19];
        values.push(150.5);
        let window = window_of(20, &values);
        let decision = food_rule().evaluate(&window, "14:10:00").unwrap();
        assert!(decision.triggered);
        assert!(decision.message.contains("FOOD1 ALERT"));
        assert!(decision.message.contains("14:10:00"));
    }

    #[test]
    fn test_rising_food_does_not_trigger() {
        let mut values = vec![150.0; 19];
        values.push(152.0);
        let window = window_of(20, &values);
        assert!(!food_rule().evaluate(&window, "t").unwrap().triggered);
    }

    #[test]
    fn test_stall_waits_for_full_window() {
        let window = window_of(20, &[150.0; 10]);
        assert!(!food_rule().evaluate(&window, "t").unwrap().triggered);
    }

    #[test]
    fn test_stall_is_rolling() {
        let rule = food_rule();
        let mut window = SlidingWindow::new(20);
        for _ in 0..20 {
            window.push(150.0);
        }
        assert!(rule.evaluate(&window, "t").unwrap().triggered);

        window.push(150.2);
        assert!(rule.evaluate(&window, "t").unwrap().triggered);

        window.push(155.0);
        assert!(!rule.evaluate(&window, "t").unwrap().triggered);
    }

    #[test]
    fn test_empty_window_is_an_error() {
        let window = SlidingWindow::new(5);
        assert!(matches!(
            smoker_rule().evaluate(&window, "t"),
            Err(Error::RuleEvaluation(_))
        ));
        assert!(matches!(
            food_rule().evaluate(&window, "t"),
            Err(Error::RuleEvaluation(_))
        ));
    }
}
