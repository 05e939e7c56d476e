use chama_types::{DataEnvelope, LogEntry};

use crate::client::ApiClient;
use crate::error::Result;

impl ApiClient {
    /// `GET /logs`, answered as `{ "data": [...] }`
    pub async fn list_logs(&self) -> Result<Vec<LogEntry>> {
        let envelope: DataEnvelope<Vec<LogEntry>> = self.get("/logs").await?;
        Ok(envelope.data)
    }
}

#[cfg(test)]
mod tests {
    use crate::client::tests::test_client;
    use chama_logs::{DateRange, LogFilterSpec, filter};
    use chama_types::LogLevel;
    use chrono::{TimeZone, Utc};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_list_logs() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/logs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {"id": "1", "timestamp": "2024-01-15T10:00:00Z", "level": 0,
                     "levelName": "ERROR", "source": "db.js", "message": "disk full"},
                    {"timestamp": "2024-01-15T10:01:00Z", "levelName": "info", "message": "ok"}
                ]
            })))
            .mount(&server)
            .await;

        let (client, _) = test_client(&server.uri());
        let logs = client.list_logs().await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].level_name, LogLevel::Error);
        assert_eq!(logs[1].level_name, LogLevel::Info);
        assert_eq!(logs[1].key(1), "1");
    }

    #[tokio::test]
    async fn test_loose_log_payload_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/logs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {"level": "ERROR", "message": "disk full", "source": "db.js",
                     "timestamp": null, "date": "2024-01-15T10:00:00Z"},
                    {"level": "INFO", "message": "disk ok", "source": "api.js",
                     "date": "2024-01-15T11:00:00Z"},
                    {"level": 3, "levelName": null, "message": "disk slow", "source": null,
                     "timestamp": "2024-01-17T10:00:00Z"}
                ]
            })))
            .mount(&server)
            .await;

        let (client, _) = test_client(&server.uri());
        let logs = client.list_logs().await.unwrap();
        assert_eq!(logs.len(), 3);

        let day = DateRange::new(
            Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 15, 23, 59, 59).unwrap(),
        );
        let spec = LogFilterSpec {
            level: "ERROR".parse().unwrap(),
            search: "disk".to_string(),
            date_range: Some(day),
        };
        assert_eq!(filter(&logs, &spec), vec![logs[0].clone()]);

        let by_code = LogFilterSpec {
            level: "3".parse().unwrap(),
            ..LogFilterSpec::default()
        };
        let result = filter(&logs, &by_code);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].level_name, LogLevel::Unknown);
        assert_eq!(result[0].message(), "disk slow");
    }
}
