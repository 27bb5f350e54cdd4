/// Sentinel the producer writes when a probe recorded no temperature.
pub const NO_TEMPERATURE: &str = "No Temperature";

/// One parsed queue message
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub timestamp: String,
    pub temperature: Option<f64>,
}

/// Outcome of evaluating an anomaly rule against the current window
#[derive(Debug, Clone, PartialEq)]
pub struct AlertDecision {
    pub triggered: bool,
    pub message: String,
}

impl AlertDecision {
    pub fn quiet() -> Self {
        Self {
            triggered: false,
            message: String::new(),
        }
    }

    pub fn alert(message: String) -> Self {
        Self {
            triggered: true,
            message,
        }
    }
}

/// How a delivery is settled with the broker once handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckDecision {
    /// Remove the message from the queue.
    Ack,
    /// Negative-acknowledge and hand the message back to the broker.
    Requeue,
}
