use crate::sensor::SensorKind;
use clap::Parser;
use std::net::SocketAddr;

/// Listens on one sensor queue and logs an alert when the readings go wrong
#[derive(Debug, Clone, Parser)]
#[command(name = "listener", version)]
pub struct Config {
    /// Sensor stream to monitor
    #[arg(long, env = "SENSOR", value_enum)]
    pub sensor: SensorKind,

    /// Broker host
    #[arg(long, env = "AMQP_HOST", default_value = "localhost")]
    pub host: String,

    /// Broker port
    #[arg(long, env = "AMQP_PORT", default_value_t = 5672)]
    pub port: u16,

    /// Queue to consume, defaults to the sensor's queue
    #[arg(long, env = "QUEUE")]
    pub queue: Option<String>,

    /// Serve prometheus metrics on this address
    #[arg(long, env = "METRICS_ADDR")]
    pub metrics_addr: Option<SocketAddr>,
}

impl Config {
    pub fn amqp_uri(&self) -> String {
        format!("amqp://{}:{}/%2f", self.host, self.port)
    }

    pub fn queue_name(&self) -> &str {
        self.queue
            .as_deref()
            .unwrap_or_else(|| self.sensor.queue_name())
    }
}
