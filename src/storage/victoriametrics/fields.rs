use crate::datamodel::{DataPoint, Reading};

/// The reading fields, each stored as an independent series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Gravity,
    Tilt,
    Temp,
    Volt,
    Interval,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Gravity,
        Field::Tilt,
        Field::Temp,
        Field::Volt,
        Field::Interval,
    ];

    pub fn metric_name(&self) -> &'static str {
        match self {
            Field::Gravity => "tilted_gravity",
            Field::Tilt => "tilted_tilt",
            Field::Temp => "tilted_temp",
            Field::Volt => "tilted_volt",
            Field::Interval => "tilted_interval",
        }
    }

    pub fn value_of(&self, reading: &Reading) -> f64 {
        match self {
            Field::Gravity => reading.gravity,
            Field::Tilt => reading.tilt,
            Field::Temp => reading.temp,
            Field::Volt => reading.volt,
            Field::Interval => reading.interval as f64,
        }
    }

    pub fn apply(&self, point: &mut DataPoint, value: f64) {
        match self {
            Field::Gravity => point.gravity = value,
            Field::Tilt => point.tilt = value,
            Field::Temp => point.temp = value,
            Field::Volt => point.volt = value,
            Field::Interval => point.interval = value.round() as i64,
        }
    }
}
