mod replay;
mod row;

use anyhow::Context;
use clap::Parser;
use lapin::options::QueueDeclareOptions;
use lapin::types::FieldTable;
use lapin::{Channel, Connection, ConnectionProperties};
use replay::{replay, Replay};
use row::QUEUES;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Replays a smoker temperature log onto the sensor queues
#[derive(Debug, Parser)]
#[command(name = "producer", version)]
struct Args {
    /// Broker host
    #[arg(long, env = "AMQP_HOST", default_value = "localhost")]
    host: String,

    /// Broker port
    #[arg(long, env = "AMQP_PORT", default_value_t = 5672)]
    port: u16,

    /// CSV log with timestamp, smoker, food 1 and food 2 columns
    #[arg(long, env = "INPUT_FILE", default_value = "smoker-temps.csv")]
    input: PathBuf,

    /// Seconds to wait between two rows
    #[arg(long, env = "DELAY_SECS", default_value_t = 30)]
    delay_secs: u64,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting smoker producer");
    info!(
        "Broker: {}:{}, input: {}, delay: {}s",
        args.host,
        args.port,
        args.input.display(),
        args.delay_secs
    );

    let uri = format!("amqp://{}:{}/%2f", args.host, args.port);
    let (conn, channel) = match connect(&uri).await {
        Ok(pair) => pair,
        Err(e) => {
            error!("{:#}", e);
            error!("Verify the server is running on host={}", args.host);
            std::process::exit(1);
        }
    };

    let outcome = run(&args, &channel).await;

    info!("Closing connection");
    if let Err(e) = conn.close(200, "OK").await {
        warn!("Error while closing connection: {}", e);
    }

    match outcome {
        Ok(Replay::Completed(rows)) => info!("Published {} rows", rows),
        Ok(Replay::Interrupted(rows)) => {
            info!("Received shutdown signal after {} rows", rows)
        }
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    }
}

async fn connect(uri: &str) -> anyhow::Result<(Connection, Channel)> {
    let conn = Connection::connect(uri, ConnectionProperties::default())
        .await
        .context("Connection to broker failed")?;
    let channel = conn.create_channel().await?;

    for queue in QUEUES {
        channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .with_context(|| format!("Failed to declare queue {}", queue))?;
    }

    Ok((conn, channel))
}

async fn run(args: &Args, channel: &Channel) -> anyhow::Result<Replay> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;

    let delay = Duration::from_secs(args.delay_secs);
    replay(reader, channel, delay, interrupted()).await
}

/// Completes on Ctrl-C. Never completes if the signal handler can't be installed.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
