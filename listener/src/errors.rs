use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Connection to broker failed: {0}")]
    Connection(#[source] lapin::Error),

    #[error("Malformed reading: {0}")]
    MalformedReading(String),

    #[error("Rule evaluation error: {0}")]
    RuleEvaluation(String),

    #[error("AMQP error: {0}")]
    Amqp(#[from] lapin::Error),

    #[error("Not connected to broker")]
    NotConnected,

    #[error("Delivery stream closed by broker")]
    StreamClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Errors scoped to a single delivery. The consumer logs them and still
    /// acknowledges the message instead of aborting.
    pub fn is_per_message(&self) -> bool {
        match self {
            Error::MalformedReading(_) => true,
            Error::RuleEvaluation(_) => true,

            Error::Connection(_) => false,
            Error::Amqp(_) => false,
            Error::NotConnected => false,
            Error::StreamClosed => false,
            Error::Io(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_message_errors() {
        assert!(Error::MalformedReading("abc".to_string()).is_per_message());
        assert!(Error::RuleEvaluation("empty window".to_string()).is_per_message());
        assert!(!Error::StreamClosed.is_per_message());
    }
}
