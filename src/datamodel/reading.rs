use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// One decoded hydrometer sample, as relayed by a gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub sensor_id: String,
    pub gravity: f64,
    pub tilt: f64,
    pub temp: f64,
    pub volt: f64,
    /// Sampling interval of the sensor, in seconds.
    pub interval: i64,
}

/// A relay gateway. Both fields form the identity: the same gateway id
/// paired with a new name is a different gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct Gateway {
    pub id: String,
    pub name: String,
}

impl Gateway {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Body of `POST /api/readings`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    pub reading: Reading,
    pub gateway_id: String,
    pub gateway_name: String,
}

impl SensorReading {
    pub fn gateway(&self) -> Gateway {
        Gateway::new(self.gateway_id.clone(), self.gateway_name.clone())
    }

    /// Rejects payloads that would not identify a sensor.
    pub fn validate(&self) -> Result<()> {
        if self.reading.sensor_id.trim().is_empty() {
            bail!("Sensor ID is required");
        }
        if self.reading.interval < 0 {
            bail!("Interval must not be negative");
        }
        let fields = [
            ("gravity", self.reading.gravity),
            ("tilt", self.reading.tilt),
            ("temp", self.reading.temp),
            ("volt", self.reading.volt),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                bail!("Field {} must be a finite number", name);
            }
        }
        Ok(())
    }
}
