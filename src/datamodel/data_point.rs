use super::Gateway;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// All field values reconstructed for one timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct DataPoint {
    /// Unix milliseconds, assigned by the server at ingest time.
    pub timestamp: i64,
    pub gravity: f64,
    pub tilt: f64,
    pub temp: f64,
    pub volt: f64,
    pub interval: i64,
}

impl DataPoint {
    /// A point with every field at its zero value.
    pub fn empty(timestamp: i64) -> Self {
        Self {
            timestamp,
            ..Default::default()
        }
    }
}

/// History of one sensor over a query window.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorData {
    pub sensor_id: String,
    /// `None` when no gateway identity could be determined, typically
    /// because the window holds no data.
    pub gateway: Option<Gateway>,
    /// Ascending by timestamp.
    pub data_points: Vec<DataPoint>,
}

impl SensorData {
    pub fn empty(sensor_id: impl Into<String>) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            gateway: None,
            data_points: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data_points.is_empty()
    }
}
