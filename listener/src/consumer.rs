//! Durable, one-message-in-flight queue consumer.
//!
//! The consumer walks `Disconnected -> Connected -> Bound -> Consuming` and
//! ends in `Closed` (operator interrupt) or `Failed` (anything fatal). Each
//! delivery is handled and settled before the next one is pulled, and the
//! broker prefetch is 1, so at most one message is unacknowledged at a time.

use crate::errors::{Error, Result};
use crate::metrics::{MALFORMED_TOTAL, MESSAGES_TOTAL, RULE_ERRORS_TOTAL};
use crate::model::AckDecision;
use crate::monitor::MessageHandler;
use futures::{Stream, StreamExt};
use lapin::message::Delivery;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicQosOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{Channel, Connection, ConnectionProperties};
use std::future::Future;
use tracing::{debug, error, info, warn};

const PREFETCH_COUNT: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    Disconnected,
    Connected,
    Bound,
    Consuming,
    Closed,
    Failed,
}

/// Why the consume loop stopped
#[derive(Debug)]
pub enum Shutdown {
    Interrupted,
    Failed(Error),
}

impl Shutdown {
    pub fn exit_code(&self) -> i32 {
        match self {
            Shutdown::Interrupted => 0,
            Shutdown::Failed(_) => 1,
        }
    }
}

/// A delivery as seen by the consume loop
pub trait InboundMessage {
    fn payload(&self) -> &[u8];

    fn settle(&self, decision: AckDecision) -> impl Future<Output = Result<()>>;
}

impl InboundMessage for Delivery {
    fn payload(&self) -> &[u8] {
        &self.data
    }

    async fn settle(&self, decision: AckDecision) -> Result<()> {
        match decision {
            AckDecision::Ack => {
                self.acker.ack(BasicAckOptions::default()).await?;
            }
            AckDecision::Requeue => {
                self.acker
                    .nack(BasicNackOptions {
                        requeue: true,
                        ..Default::default()
                    })
                    .await?;
            }
        }
        Ok(())
    }
}

pub struct QueueConsumer {
    queue: String,
    consumer_tag: String,
    state: ConsumerState,
    connection: Option<Connection>,
    channel: Option<Channel>,
}

impl QueueConsumer {
    pub fn new(queue: impl Into<String>, consumer_tag: impl Into<String>) -> Self {
        Self {
            queue: queue.into(),
            consumer_tag: consumer_tag.into(),
            state: ConsumerState::Disconnected,
            connection: None,
            channel: None,
        }
    }

    pub fn state(&self) -> ConsumerState {
        self.state
    }

    fn transition(&mut self, next: ConsumerState) {
        debug!("Consumer {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Opens the broker connection. There is no retry; callers exit on failure.
    pub async fn connect(&mut self, uri: &str) -> Result<()> {
        let connection = Connection::connect(uri, ConnectionProperties::default())
            .await
            .map_err(Error::Connection)?;

        info!("Connected to broker");
        self.connection = Some(connection);
        self.transition(ConsumerState::Connected);
        Ok(())
    }

    /// Declares the durable queue, limits unacknowledged deliveries to one and
    /// registers a manual-ack consumer.
    pub async fn bind(&mut self) -> Result<lapin::Consumer> {
        let connection = self.connection.as_ref().ok_or(Error::NotConnected)?;

        let channel = connection.create_channel().await?;

        channel
            .queue_declare(
                &self.queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;

        channel
            .basic_qos(PREFETCH_COUNT, BasicQosOptions::default())
            .await?;

        let deliveries = channel
            .basic_consume(
                &self.queue,
                &self.consumer_tag,
                BasicConsumeOptions {
                    no_ack: false,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;

        info!(
            "Bound to durable queue {} with prefetch {}",
            self.queue, PREFETCH_COUNT
        );
        self.channel = Some(channel);
        self.transition(ConsumerState::Bound);
        Ok(deliveries)
    }

    /// Binds and consumes until `shutdown` completes (`Ok`) or the broker
    /// side fails (`Err`).
    pub async fn run<H, F>(&mut self, handler: &mut H, shutdown: F) -> Result<()>
    where
        H: MessageHandler,
        F: Future<Output = ()>,
    {
        let deliveries = self.bind().await?;

        self.transition(ConsumerState::Consuming);
        info!("Ready for work on {}. To exit press CTRL+C", self.queue);

        consume(deliveries, handler, shutdown).await
    }

    pub async fn close(&mut self, shutdown: &Shutdown) {
        match shutdown {
            Shutdown::Interrupted => {
                info!("User interrupted continuous listening process");
                self.transition(ConsumerState::Closed);
            }
            Shutdown::Failed(e) => {
                error!("Consumer failed: {}", e);
                self.transition(ConsumerState::Failed);
            }
        }

        self.channel = None;
        if let Some(connection) = self.connection.take() {
            info!("Closing connection");
            if let Err(e) = connection.close(200, "OK").await {
                warn!("Error while closing connection: {}", e);
            }
        }
    }
}

/// Handles and settles deliveries one at a time.
///
/// Per-message errors are logged and the message is still acknowledged so a
/// poison message is never redelivered. Any other error, or the stream
/// ending, stops the loop.
///
/// `shutdown` is only observed while waiting for the next delivery, so a
/// message that was handled is always settled before `Ok(())` is returned.
pub async fn consume<S, M, E, H, F>(deliveries: S, handler: &mut H, shutdown: F) -> Result<()>
where
    S: Stream<Item = std::result::Result<M, E>>,
    M: InboundMessage,
    Error: From<E>,
    H: MessageHandler,
    F: Future<Output = ()>,
{
    let mut deliveries = std::pin::pin!(deliveries);
    let mut shutdown = std::pin::pin!(shutdown);

    loop {
        let next = tokio::select! {
            biased;
            _ = &mut shutdown => return Ok(()),
            next = deliveries.next() => next,
        };

        let Some(delivery) = next else {
            return Err(Error::StreamClosed);
        };

        let message = delivery?;
        MESSAGES_TOTAL.inc();

        let decision = match handler.handle(message.payload()) {
            Ok(decision) => decision,
            Err(e) if e.is_per_message() => {
                match &e {
                    Error::MalformedReading(_) => MALFORMED_TOTAL.inc(),
                    _ => RULE_ERRORS_TOTAL.inc(),
                }
                error!("Error processing the temperature: {}", e);
                AckDecision::Ack
            }
            Err(e) => return Err(e),
        };

        message.settle(decision).await?;
    }
}
