use super::fields::Field;
use super::query_response::FieldSeries;
use crate::datamodel::{DataPoint, SensorData};
use std::collections::HashMap;

/// Rebuilds per-timestamp data points from independent per-field series.
///
/// A timestamp present in any field yields a point. Fields with no sample at
/// that exact timestamp keep their zero value. The gateway comes from the
/// first field, in the given order, whose query returned a series.
pub fn merge_field_series(sensor_id: &str, series: Vec<(Field, FieldSeries)>) -> SensorData {
    let mut gateway = None;
    let mut points: HashMap<i64, DataPoint> = HashMap::new();

    for (field, field_series) in series {
        if gateway.is_none() {
            gateway = field_series.gateway;
        }
        for (timestamp, value) in field_series.samples {
            let point = points
                .entry(timestamp)
                .or_insert_with(|| DataPoint::empty(timestamp));
            field.apply(point, value);
        }
    }

    let mut data_points: Vec<DataPoint> = points.into_values().collect();
    data_points.sort_by_key(|point| point.timestamp);

    SensorData {
        sensor_id: sensor_id.to_string(),
        gateway,
        data_points,
    }
}
