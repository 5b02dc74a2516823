mod common;

use anyhow::Result;
use serde_json::{Value, json};
use tilted::datamodel::{DataPoint, Gateway, TimeWindow};
use tilted::storage::victoriametrics::VictoriaMetricsStorage;
use tilted::storage::{StorageError, StorageInstance};
use tilted::test_utils::fixtures::{T0, cellar_gateway, reading};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn storage_for(server: &MockServer) -> Result<VictoriaMetricsStorage> {
    let connection_string = server.uri().replacen("http://", "victoriametrics://", 1);
    VictoriaMetricsStorage::connect(&format!("{}?timeout_seconds=2", connection_string))
}

fn matrix(metric: &str, samples: &[(f64, &str)]) -> Value {
    let values: Vec<Value> = samples
        .iter()
        .map(|(seconds, value)| json!([seconds, value]))
        .collect();
    json!({
        "status": "success",
        "data": {
            "resultType": "matrix",
            "result": [{
                "metric": {
                    "__name__": metric,
                    "sensor_id": "tilt-red",
                    "gateway_id": "gw-1",
                    "gateway_name": "Cellar"
                },
                "values": values
            }]
        }
    })
}

fn empty_matrix() -> Value {
    json!({"status": "success", "data": {"resultType": "matrix", "result": []}})
}

/// Mounts the range query of one field over `[T0, T0 + 2000]`.
async fn mount_field(server: &MockServer, metric: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/api/v1/query"))
        .and(query_param(
            "query",
            format!(r#"{}{{sensor_id="tilt-red"}}[2001ms]"#, metric),
        ))
        .and(query_param("time", "1704067202.000"))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

fn window() -> TimeWindow {
    TimeWindow {
        start_ms: T0,
        end_ms: T0 + 2000,
    }
}

mod ingest_tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_pushes_five_series() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/import/prometheus"))
            .and(header("content-type", "text/plain"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        let storage = storage_for(&server)?;

        storage
            .publish_reading(&reading("tilt-red", 1.052), &cellar_gateway(), T0)
            .await?;

        let requests = server.received_requests().await.unwrap_or_default();
        assert_eq!(requests.len(), 1);
        let body = String::from_utf8(requests[0].body.clone())?;
        let labels = r#"{sensor_id="tilt-red",gateway_id="gw-1",gateway_name="Cellar"}"#;
        let expected: Vec<String> = [
            ("tilted_gravity", "1.052"),
            ("tilted_tilt", "30"),
            ("tilted_temp", "20.5"),
            ("tilted_volt", "3.9"),
            ("tilted_interval", "900"),
        ]
        .iter()
        .map(|(metric, value)| format!("{}{} {} {}", metric, labels, value, T0))
        .collect();
        assert_eq!(body.lines().collect::<Vec<_>>(), expected);
        Ok(())
    }

    #[tokio::test]
    async fn test_publish_escapes_label_values() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/import/prometheus"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        let storage = storage_for(&server)?;

        storage
            .publish_reading(
                &reading("tilt-red", 1.05),
                &Gateway::new("gw-1", "Brewer's \"cave\"\nnorth"),
                T0,
            )
            .await?;

        let requests = server.received_requests().await.unwrap_or_default();
        let body = String::from_utf8(requests[0].body.clone())?;
        assert_eq!(body.lines().count(), 5);
        assert!(body.contains(r#"gateway_name="Brewer's \"cave\"\nnorth""#));
        Ok(())
    }

    #[tokio::test]
    async fn test_publish_failure_status() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/import/prometheus"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let storage = storage_for(&server)?;

        let error = storage
            .publish_reading(&reading("tilt-red", 1.05), &cellar_gateway(), T0)
            .await
            .unwrap_err();

        let storage_error = error.downcast_ref::<StorageError>();
        assert!(matches!(
            storage_error,
            Some(StorageError::UpstreamStatus { status: 500, .. })
        ));
        assert!(storage_error.is_some_and(StorageError::is_upstream));
        Ok(())
    }

    #[tokio::test]
    async fn test_unreachable_server() -> Result<()> {
        let server = MockServer::start().await;
        let storage = storage_for(&server)?;
        drop(server);

        let error = storage
            .publish_reading(&reading("tilt-red", 1.05), &cellar_gateway(), T0)
            .await
            .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<StorageError>(),
            Some(StorageError::Upstream { .. })
        ));
        Ok(())
    }
}

mod merge_tests {
    use super::*;

    #[tokio::test]
    async fn test_query_merges_five_fields() -> Result<()> {
        let server = MockServer::start().await;
        let t0 = T0 as f64 / 1000.0;
        mount_field(
            &server,
            "tilted_gravity",
            ResponseTemplate::new(200)
                .set_body_json(matrix("tilted_gravity", &[(t0, "1.05"), (t0 + 1.0, "1.049")])),
        )
        .await;
        mount_field(
            &server,
            "tilted_tilt",
            ResponseTemplate::new(200).set_body_json(matrix("tilted_tilt", &[(t0, "30")])),
        )
        .await;
        mount_field(
            &server,
            "tilted_temp",
            ResponseTemplate::new(200)
                .set_body_json(matrix("tilted_temp", &[(t0, "not-a-number"), (t0 + 1.0, "19.5")])),
        )
        .await;
        mount_field(
            &server,
            "tilted_volt",
            ResponseTemplate::new(200).set_body_json(empty_matrix()),
        )
        .await;
        mount_field(
            &server,
            "tilted_interval",
            ResponseTemplate::new(200)
                // The sample one second before the window is dropped
                .set_body_json(matrix("tilted_interval", &[(t0 - 1.0, "900"), (t0 + 1.0, "900")])),
        )
        .await;
        let storage = storage_for(&server)?;

        let data = storage.query_readings("tilt-red", window()).await?;

        assert_eq!(data.sensor_id, "tilt-red");
        assert_eq!(data.gateway, Some(cellar_gateway()));
        assert_eq!(
            data.data_points,
            vec![
                DataPoint {
                    timestamp: T0,
                    gravity: 1.05,
                    tilt: 30.0,
                    temp: 0.0,
                    volt: 0.0,
                    interval: 0,
                },
                DataPoint {
                    timestamp: T0 + 1000,
                    gravity: 1.049,
                    tilt: 0.0,
                    temp: 19.5,
                    volt: 0.0,
                    interval: 900,
                },
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_sensor_is_empty() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(empty_matrix()))
            .expect(5)
            .mount(&server)
            .await;
        let storage = storage_for(&server)?;

        let data = storage.query_readings("tilt-red", window()).await?;
        assert!(data.is_empty());
        assert_eq!(data.gateway, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_one_failing_field_aborts_the_merge() -> Result<()> {
        let server = MockServer::start().await;
        let t0 = T0 as f64 / 1000.0;
        for metric in ["tilted_gravity", "tilted_tilt", "tilted_temp", "tilted_interval"] {
            Mock::given(method("GET"))
                .and(path("/api/v1/query"))
                .and(query_param(
                    "query",
                    format!(r#"{}{{sensor_id="tilt-red"}}[2001ms]"#, metric),
                ))
                .respond_with(ResponseTemplate::new(200).set_body_json(matrix(metric, &[(t0, "1")])))
                .mount(&server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path("/api/v1/query"))
            .and(query_param("query", r#"tilted_volt{sensor_id="tilt-red"}[2001ms]"#))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let storage = storage_for(&server)?;

        let error = storage
            .query_readings("tilt-red", window())
            .await
            .unwrap_err();
        match error.downcast_ref::<StorageError>() {
            Some(StorageError::UpstreamStatus { operation, status }) => {
                assert_eq!(*status, 503);
                assert_eq!(operation, "query tilted_volt");
            }
            other => panic!("unexpected error {:?}", other),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_error_status_in_body() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "error",
                "errorType": "bad_data",
                "error": "cannot parse query"
            })))
            .mount(&server)
            .await;
        let storage = storage_for(&server)?;

        let error = storage
            .query_readings("tilt-red", window())
            .await
            .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<StorageError>(),
            Some(StorageError::InvalidResponse { .. })
        ));
        Ok(())
    }
}

mod window_tests {
    use super::*;
    use axum::http::StatusCode;
    use crate::common::http::TestApp;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_unbounded_range_is_rejected_before_querying() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(empty_matrix()))
            .expect(0)
            .mount(&server)
            .await;

        let app = TestApp::new(Arc::new(storage_for(&server)?));

        let response = app
            .get("/api/readings/tilt-red?startTime=0&endTime=9223372036854775807")
            .await?;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json()?;
        assert!(body["error"].is_string());
        Ok(())
    }

    #[tokio::test]
    async fn test_widest_window_builds_a_valid_selector() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/query"))
            .and(query_param(
                "query",
                format!(r#"tilted_gravity{{sensor_id="tilt-red"}}[{}ms]"#, i64::MAX),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(empty_matrix()))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(empty_matrix()))
            .mount(&server)
            .await;
        let storage = storage_for(&server)?;

        let data = storage
            .query_readings("tilt-red", TimeWindow::new(i64::MIN, i64::MAX)?)
            .await?;
        assert!(data.is_empty());
        Ok(())
    }
}

mod listing_tests {
    use super::*;

    #[tokio::test]
    async fn test_list_sensors_sorted_and_distinct() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/label/sensor_id/values"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "data": ["tilt-red", "tilt-black", "tilt-red", "tilt-blue"]
            })))
            .mount(&server)
            .await;
        let storage = storage_for(&server)?;

        assert_eq!(
            storage.list_sensors().await?,
            vec!["tilt-black", "tilt-blue", "tilt-red"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_health_check() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
            .mount(&server)
            .await;
        let storage = storage_for(&server)?;

        storage.health_check().await?;
        storage.create_or_migrate().await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_health_check_failure() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let storage = storage_for(&server)?;

        assert!(storage.health_check().await.is_err());
        assert!(storage.create_or_migrate().await.is_err());
        Ok(())
    }
}
