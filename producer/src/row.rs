use serde::Deserialize;

pub const NO_TEMPERATURE: &str = "No Temperature";

pub const SMOKER_QUEUE: &str = "Smoker_Temp_Queue";
pub const FOOD1_QUEUE: &str = "Temp_Food1_Queue";
pub const FOOD2_QUEUE: &str = "Temp_Food2_Queue";

pub const QUEUES: [&str; 3] = [SMOKER_QUEUE, FOOD1_QUEUE, FOOD2_QUEUE];

/// One line of the smoker log: timestamp, smoker, food 1 and food 2 temperatures.
///
/// Columns are read by position, the header names are not checked.
#[derive(Debug, Clone, Deserialize)]
pub struct SmokerRow(pub String, pub String, pub String, pub String);

impl SmokerRow {
    pub fn timestamp(&self) -> &str {
        &self.0
    }

    /// One `(queue, payload)` pair per sensor column.
    pub fn messages(&self) -> [(&'static str, String); 3] {
        [
            (SMOKER_QUEUE, self.payload(&self.1)),
            (FOOD1_QUEUE, self.payload(&self.2)),
            (FOOD2_QUEUE, self.payload(&self.3)),
        ]
    }

    fn payload(&self, temperature: &str) -> String {
        let temperature = temperature.trim();
        if temperature.is_empty() {
            format!("{},{}", self.0, NO_TEMPERATURE)
        } else {
            format!("{},{}", self.0, temperature)
        }
    }
}
