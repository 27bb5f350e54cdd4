//! Sliding-window temperature monitoring for smoker sensor queues.
//!
//! A [`monitor::SensorMonitor`] owns the window and anomaly rule for one
//! sensor; a [`consumer::QueueConsumer`] feeds it deliveries from a durable
//! AMQP queue one at a time.

pub mod config;
pub mod consumer;
pub mod errors;
pub mod metrics;
pub mod model;
pub mod monitor;
pub mod parse;
pub mod rules;
pub mod sensor;
pub mod window;
