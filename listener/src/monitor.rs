use crate::errors::Result;
use crate::metrics::{ALERTS_TOTAL, MISSING_READINGS_TOTAL, READINGS_TOTAL};
use crate::model::{AckDecision, AlertDecision, Reading};
use crate::parse::parse_reading;
use crate::rules::AnomalyRule;
use crate::sensor::SensorKind;
use crate::window::SlidingWindow;
use tracing::{debug, info, warn};

/// Handles one delivery payload and decides how it is settled.
///
/// Per-message failures are returned as errors; the consumer loop decides
/// whether they are recoverable.
pub trait MessageHandler {
    fn handle(&mut self, payload: &[u8]) -> Result<AckDecision>;
}

/// What happened to a single payload
#[derive(Debug, Clone, PartialEq)]
pub enum Processed {
    /// Sentinel reading, the window was left untouched.
    Skipped(Reading),
    /// Temperature pushed and the rule evaluated.
    Evaluated {
        reading: Reading,
        decision: AlertDecision,
    },
}

/// Window and rule for one sensor stream, owned by a single consumer.
pub struct SensorMonitor {
    sensor: SensorKind,
    window: SlidingWindow,
    rule: Box<dyn AnomalyRule>,
}

impl SensorMonitor {
    pub fn new(sensor: SensorKind) -> Self {
        let window = SlidingWindow::new(sensor.window_capacity());
        Self::with_rule(sensor, window, sensor.rule())
    }

    pub fn with_rule(
        sensor: SensorKind,
        window: SlidingWindow,
        rule: Box<dyn AnomalyRule>,
    ) -> Self {
        Self {
            sensor,
            window,
            rule,
        }
    }

    pub fn window(&self) -> &SlidingWindow {
        &self.window
    }

    pub fn process(&mut self, payload: &[u8]) -> Result<Processed> {
        let reading = parse_reading(payload)?;

        let Some(temperature) = reading.temperature else {
            return Ok(Processed::Skipped(reading));
        };

        self.window.push(temperature);
        let decision = self.rule.evaluate(&self.window, &reading.timestamp)?;

        Ok(Processed::Evaluated { reading, decision })
    }
}

impl MessageHandler for SensorMonitor {
    fn handle(&mut self, payload: &[u8]) -> Result<AckDecision> {
        info!(
            "[{}] Received {}",
            self.sensor,
            String::from_utf8_lossy(payload)
        );

        match self.process(payload)? {
            Processed::Skipped(reading) => {
                MISSING_READINGS_TOTAL.inc();
                info!("[{}] No temperature recorded at {}", self.sensor, reading.timestamp);
            }
            Processed::Evaluated { reading, decision } => {
                READINGS_TOTAL.inc();
                debug!(
                    "[{}] Window {}/{} after {} at {}",
                    self.sensor,
                    self.window.len(),
                    self.window.capacity(),
                    reading.temperature.unwrap_or_default(),
                    reading.timestamp
                );
                if decision.triggered {
                    ALERTS_TOTAL.inc();
                    warn!(rule = self.rule.name(), "{}", decision.message);
                }
            }
        }

        info!("[{}] Processed reading", self.sensor);
        Ok(AckDecision::Ack)
    }
}
