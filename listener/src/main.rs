use axum::{routing::get, Router};
use clap::Parser;
use listener::config::Config;
use listener::consumer::{QueueConsumer, Shutdown};
use listener::metrics;
use listener::monitor::SensorMonitor;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let config = Config::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let queue = config.queue_name().to_string();

    info!("Starting {} listener", config.sensor);
    info!("Broker: {}:{}", config.host, config.port);
    info!(
        "Queue: {}, window: {} readings",
        queue,
        config.sensor.window_capacity()
    );

    if let Err(e) = metrics::init_metrics() {
        error!("Failed to register metrics: {}", e);
        std::process::exit(1);
    }

    if let Some(addr) = config.metrics_addr {
        tokio::spawn(serve_metrics(addr));
    }

    let consumer_tag = format!("{}-{}", config.sensor, uuid::Uuid::new_v4());
    let mut consumer = QueueConsumer::new(queue, consumer_tag);

    if let Err(e) = consumer.connect(&config.amqp_uri()).await {
        error!("{}", e);
        error!("Verify the server is running on host={}", config.host);
        std::process::exit(1);
    }

    let mut monitor = SensorMonitor::new(config.sensor);

    let shutdown = match consumer.run(&mut monitor, interrupted()).await {
        Ok(()) => Shutdown::Interrupted,
        Err(e) => Shutdown::Failed(e),
    };

    consumer.close(&shutdown).await;

    info!("Shutting down");
    std::process::exit(shutdown.exit_code());
}

/// Completes on Ctrl-C. Never completes if the signal handler can't be installed.
async fn interrupted() {
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn serve_metrics(addr: SocketAddr) {
    let app = Router::new().route("/metrics", get(metrics_handler));

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind metrics server to {}: {}", addr, e);
            return;
        }
    };

    info!("Metrics server listening on {}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        error!("Metrics server error: {}", e);
    }
}

async fn metrics_handler() -> String {
    metrics::gather_metrics()
}
