//! Calendar and settings endpoints. Their payloads are passed through as JSON.

use serde_json::Value;

use crate::client::ApiClient;
use crate::error::Result;

impl ApiClient {
    pub async fn calendar_events(&self) -> Result<Value> {
        // The backend route is spelled this way
        self.get("/calender").await
    }

    pub async fn complete_event(&self, event_id: &str) -> Result<Value> {
        self.put(&format!("/calendar/events/{event_id}/complete"), &Value::Null)
            .await
    }

    pub async fn fines(&self) -> Result<Value> {
        self.get("/calendar/fines").await
    }

    pub async fn waive_fine(&self, fine_id: &str) -> Result<Value> {
        self.put(&format!("/calendar/fines/{fine_id}/waive"), &Value::Null)
            .await
    }

    pub async fn settings(&self) -> Result<Value> {
        self.get("/settings").await
    }

    pub async fn update_settings(&self, settings: &Value) -> Result<Value> {
        self.put("/settings", settings).await
    }

    pub async fn reset_settings(&self) -> Result<Value> {
        self.get("/settings/reset").await
    }

    pub async fn server_info(&self) -> Result<Value> {
        self.get("/settings/server-info").await
    }

    pub async fn db_info(&self) -> Result<Value> {
        self.get("/settings/db-info").await
    }
}
