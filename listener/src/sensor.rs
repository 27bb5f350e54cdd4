use crate::rules::{AnomalyRule, DropRule, StallRule, FOOD_STALL_THRESHOLD, SMOKER_DROP_THRESHOLD};
use clap::ValueEnum;
use std::fmt;

/// Seconds between two readings from the smoker log.
pub const READING_INTERVAL_SECS: u64 = 30;

/// The three sensor streams the producer publishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SensorKind {
    Smoker,
    Food1,
    Food2,
}

impl SensorKind {
    pub fn queue_name(&self) -> &'static str {
        match self {
            SensorKind::Smoker => "Smoker_Temp_Queue",
            SensorKind::Food1 => "Temp_Food1_Queue",
            SensorKind::Food2 => "Temp_Food2_Queue",
        }
    }

    /// 2.5 minutes of smoker readings, 10 minutes of food readings.
    pub fn window_capacity(&self) -> usize {
        match self {
            SensorKind::Smoker => 5,
            SensorKind::Food1 | SensorKind::Food2 => 20,
        }
    }

    pub fn alert_tag(&self) -> &'static str {
        match self {
            SensorKind::Smoker => "SMOKER",
            SensorKind::Food1 => "FOOD1",
            SensorKind::Food2 => "FOOD2",
        }
    }

    pub fn rule(&self) -> Box<dyn AnomalyRule> {
        match self {
            SensorKind::Smoker => Box::new(DropRule::new(self.alert_tag(), SMOKER_DROP_THRESHOLD)),
            SensorKind::Food1 | SensorKind::Food2 => Box::new(StallRule::new(
                self.alert_tag(),
                FOOD_STALL_THRESHOLD,
                self.window_capacity() as u64 * READING_INTERVAL_SECS / 60,
            )),
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SensorKind::Smoker => "smoker",
            SensorKind::Food1 => "food1",
            SensorKind::Food2 => "food2",
        };
        f.write_str(name)
    }
}
