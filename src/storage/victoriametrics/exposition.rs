use super::fields::Field;
use crate::datamodel::{Gateway, Reading};
use std::fmt::Write;

pub const SENSOR_ID_LABEL: &str = "sensor_id";
pub const GATEWAY_ID_LABEL: &str = "gateway_id";
pub const GATEWAY_NAME_LABEL: &str = "gateway_name";

/// Escapes a label value for both the text exposition format and PromQL
/// double-quoted strings.
pub fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Formats a sample value at full precision.
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        value.to_string()
    }
}

/// One exposition line per field, all sharing labels and timestamp.
pub fn format_reading(reading: &Reading, gateway: &Gateway, timestamp_ms: i64) -> String {
    let labels = format!(
        r#"{{{}="{}",{}="{}",{}="{}"}}"#,
        SENSOR_ID_LABEL,
        escape_label_value(&reading.sensor_id),
        GATEWAY_ID_LABEL,
        escape_label_value(&gateway.id),
        GATEWAY_NAME_LABEL,
        escape_label_value(&gateway.name),
    );

    let mut body = String::new();
    for field in Field::ALL {
        let value = match field {
            Field::Interval => reading.interval.to_string(),
            _ => format_value(field.value_of(reading)),
        };
        // Writing to a String cannot fail
        let _ = writeln!(
            body,
            "{}{} {} {}",
            field.metric_name(),
            labels,
            value,
            timestamp_ms
        );
    }
    body
}

/// Range selector for one field of one sensor, covering the closed window
/// that ends at the query evaluation time.
pub fn range_selector(field: Field, sensor_id: &str, window_ms: i64) -> String {
    // Range selectors exclude their left bound, widen by one millisecond
    format!(
        r#"{}{{{}="{}"}}[{}ms]"#,
        field.metric_name(),
        SENSOR_ID_LABEL,
        escape_label_value(sensor_id),
        window_ms.saturating_add(1)
    )
}
