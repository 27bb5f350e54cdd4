use crate::row::SmokerRow;
use lapin::options::BasicPublishOptions;
use lapin::{BasicProperties, Channel};
use std::future::Future;
use std::io;
use std::time::Duration;
use tracing::{info, warn};

/// Publishes one payload to a queue through the default exchange
pub trait Publisher {
    fn publish(&self, queue: &str, payload: &[u8]) -> impl Future<Output = anyhow::Result<()>>;
}

impl Publisher for Channel {
    async fn publish(&self, queue: &str, payload: &[u8]) -> anyhow::Result<()> {
        self.basic_publish(
            "",
            queue,
            BasicPublishOptions::default(),
            payload,
            BasicProperties::default().with_delivery_mode(2),
        )
        .await?
        .await?;
        Ok(())
    }
}

/// How a replay ended, with the number of rows fully published
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replay {
    Completed(u64),
    Interrupted(u64),
}

/// Replays every row of the log, waiting `delay` between rows.
///
/// `shutdown` is checked before each row, so a row is either published to all
/// three queues or not at all.
pub async fn replay<R, P, F>(
    mut reader: csv::Reader<R>,
    publisher: &P,
    delay: Duration,
    shutdown: F,
) -> anyhow::Result<Replay>
where
    R: io::Read,
    P: Publisher,
    F: Future<Output = ()>,
{
    let mut shutdown = std::pin::pin!(shutdown);
    let mut rows = 0u64;

    for record in reader.deserialize::<SmokerRow>() {
        let row = match record {
            Ok(row) => row,
            Err(e) => {
                warn!("Skipping unreadable row: {}", e);
                continue;
            }
        };

        let pause = if rows > 0 { delay } else { Duration::ZERO };
        tokio::select! {
            biased;
            _ = &mut shutdown => return Ok(Replay::Interrupted(rows)),
            _ = tokio::time::sleep(pause) => {}
        }

        info!("Publishing readings for {}", row.timestamp());
        for (queue, payload) in row.messages() {
            publisher.publish(queue, payload.as_bytes()).await?;
            info!("Sent {} to {}", payload, queue);
        }

        rows += 1;
    }

    Ok(Replay::Completed(rows))
}
