use lazy_static::lazy_static;
use prometheus::{Counter, Encoder, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref MESSAGES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "listener_messages_total",
        "Total messages delivered by the broker"
    ))
    .unwrap();
    pub static ref READINGS_TOTAL: Counter = Counter::with_opts(Opts::new(
        "listener_readings_total",
        "Total temperatures pushed into the window"
    ))
    .unwrap();
    pub static ref MISSING_READINGS_TOTAL: Counter = Counter::with_opts(Opts::new(
        "listener_missing_readings_total",
        "Total messages carrying the no-temperature sentinel"
    ))
    .unwrap();
    pub static ref MALFORMED_TOTAL: Counter = Counter::with_opts(Opts::new(
        "listener_malformed_total",
        "Total malformed payloads acknowledged and dropped"
    ))
    .unwrap();
    pub static ref RULE_ERRORS_TOTAL: Counter = Counter::with_opts(Opts::new(
        "listener_rule_errors_total",
        "Total failures while evaluating the anomaly rule"
    ))
    .unwrap();
    pub static ref ALERTS_TOTAL: Counter = Counter::with_opts(Opts::new(
        "listener_alerts_total",
        "Total alerts raised"
    ))
    .unwrap();
}

pub fn init_metrics() -> prometheus::Result<()> {
    REGISTRY.register(Box::new(MESSAGES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(READINGS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(MISSING_READINGS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(MALFORMED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RULE_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(ALERTS_TOTAL.clone()))?;
    Ok(())
}

pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return format!("# failed to encode metrics: {}\n", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
