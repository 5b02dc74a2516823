use crate::datamodel::{Gateway, Reading, SensorReading};
use serde_json::{Value, json};

/// 2024-01-01T00:00:00Z in Unix milliseconds.
pub const T0: i64 = 1_704_067_200_000;

pub fn reading(sensor_id: &str, gravity: f64) -> Reading {
    Reading {
        sensor_id: sensor_id.to_string(),
        gravity,
        tilt: 30.0,
        temp: 20.5,
        volt: 3.9,
        interval: 900,
    }
}

pub fn cellar_gateway() -> Gateway {
    Gateway::new("gw-1", "Cellar")
}

pub fn sensor_reading(sensor_id: &str, gravity: f64) -> SensorReading {
    let gateway = cellar_gateway();
    SensorReading {
        reading: reading(sensor_id, gravity),
        gateway_id: gateway.id,
        gateway_name: gateway.name,
    }
}

/// A `POST /api/readings` body as a gateway sends it.
pub fn reading_payload(sensor_id: &str, gravity: f64) -> Value {
    json!({
        "reading": {
            "sensorId": sensor_id,
            "gravity": gravity,
            "tilt": 30.0,
            "temp": 20.5,
            "volt": 3.9,
            "interval": 900
        },
        "gatewayId": "gw-1",
        "gatewayName": "Cellar"
    })
}
