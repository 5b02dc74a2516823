use super::exposition::{GATEWAY_ID_LABEL, GATEWAY_NAME_LABEL};
use crate::datamodel::{Gateway, TimeWindow};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// Body of `/api/v1/query`.
#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    pub status: String,
    #[serde(default)]
    pub data: Option<QueryData>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QueryData {
    #[serde(rename = "resultType")]
    pub result_type: String,
    #[serde(default)]
    pub result: Vec<SeriesResult>,
}

#[derive(Debug, Deserialize)]
pub struct SeriesResult {
    #[serde(default)]
    pub metric: HashMap<String, String>,
    /// `[unix_seconds, "value"]` pairs. Kept loose so one malformed sample
    /// does not reject the whole response.
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

/// Body of `/api/v1/label/<name>/values`.
#[derive(Debug, Deserialize)]
pub struct LabelValuesResponse {
    pub status: String,
    #[serde(default)]
    pub data: Vec<String>,
}

/// Samples of one field, keyed by Unix milliseconds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSeries {
    pub samples: HashMap<i64, f64>,
    /// Labels of the first series that kept a sample inside the window.
    pub gateway: Option<Gateway>,
}

/// Flattens every series of a range query response into timestamp → value.
///
/// Samples with a non-numeric timestamp or value are skipped, as are samples
/// outside the window.
pub fn decode_field_series(response: QueryResponse, window: &TimeWindow) -> Result<FieldSeries, String> {
    if response.status != "success" {
        return Err(response
            .error
            .unwrap_or_else(|| format!("status {}", response.status)));
    }
    let data = response
        .data
        .ok_or_else(|| "missing data section".to_string())?;
    if data.result_type != "matrix" && !data.result.is_empty() {
        return Err(format!("unexpected result type {}", data.result_type));
    }

    let mut series = FieldSeries::default();
    for result in data.result {
        let mut kept = false;
        for sample in &result.values {
            if let Some((timestamp_ms, value)) = decode_sample(sample) {
                if window.contains(timestamp_ms) {
                    series.samples.insert(timestamp_ms, value);
                    kept = true;
                }
            }
        }
        if kept && series.gateway.is_none() {
            series.gateway = Some(gateway_from_labels(&result.metric));
        }
    }
    Ok(series)
}

fn gateway_from_labels(labels: &HashMap<String, String>) -> Gateway {
    Gateway::new(
        labels.get(GATEWAY_ID_LABEL).cloned().unwrap_or_default(),
        labels.get(GATEWAY_NAME_LABEL).cloned().unwrap_or_default(),
    )
}

fn decode_sample(sample: &[Value]) -> Option<(i64, f64)> {
    let [timestamp, value, ..] = sample else {
        return None;
    };
    let seconds = timestamp.as_f64()?;
    let value = match value {
        Value::String(text) => text.parse::<f64>().ok()?,
        Value::Number(number) => number.as_f64()?,
        _ => return None,
    };
    Some(((seconds * 1000.0).round() as i64, value))
}
