use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use chama_api::ApiClient;

use crate::effects::fetch_logs;
use crate::store::Store;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(5000);

/// Re-fetches the log list on a fixed interval while auto-refresh is on.
///
/// Each tick spawns its own fetch, so a slow response never delays the next
/// one. Overlapping fetches are not coalesced; the request tracker drops
/// whichever resolves after a newer one was issued.
pub struct LogPoller {
    /// Cancellation token for the timer and its fetches
    cancel: CancellationToken,

    /// Timer task
    task: Option<JoinHandle<()>>,
}

impl LogPoller {
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            task: None,
        }
    }

    /// Start polling, replacing any running timer
    pub fn start(&mut self, store: Store, api: ApiClient, interval: Duration) {
        self.stop();

        let cancel = self.cancel.clone();
        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,

                    _ = ticker.tick() => {
                        if !store.read(|s| s.logs.auto_refresh) {
                            continue;
                        }

                        let store = store.clone();
                        let api = api.clone();
                        let cancel = cancel.clone();
                        tokio::spawn(async move {
                            tokio::select! {
                                _ = cancel.cancelled() => {}
                                result = fetch_logs(&store, &api) => match result {
                                    Ok(count) => debug!(count, "log refresh"),
                                    Err(e) => warn!(error = %e, "log refresh failed"),
                                },
                            }
                        });
                    }
                }
            }
        }));
    }

    /// Stop the timer and abandon in-flight refreshes
    pub fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
        // Fresh token for the next start
        self.cancel = CancellationToken::new();
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Default for LogPoller {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LogPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chama_api::{ApiConfig, LoggingHooks, TokenStore};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::Action;

    async fn logs_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/logs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"timestamp": "2024-01-02T10:00:00Z", "levelName": "INFO", "message": "tick"}]
            })))
            .mount(&server)
            .await;
        server
    }

    fn api(server: &MockServer) -> ApiClient {
        ApiClient::new(
            ApiConfig::new(server.uri()),
            TokenStore::in_memory(),
            Arc::new(LoggingHooks),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_polls_while_auto_refresh_on() {
        let server = logs_server().await;
        let store = Store::default();
        store.dispatch(Action::SetAutoRefresh(true));

        let mut poller = LogPoller::new();
        poller.start(store.clone(), api(&server), Duration::from_millis(20));
        assert!(poller.is_running());

        tokio::time::sleep(Duration::from_millis(150)).await;
        poller.stop();
        assert!(!poller.is_running());

        let requests = server.received_requests().await.unwrap_or_default();
        assert!(requests.len() >= 2);
        assert_eq!(store.read(|s| s.logs.entries.data.len()), 1);
    }

    #[tokio::test]
    async fn test_idle_when_auto_refresh_off() {
        let server = logs_server().await;
        let store = Store::default();

        let mut poller = LogPoller::new();
        poller.start(store, api(&server), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(100)).await;
        drop(poller);

        let requests = server.received_requests().await.unwrap_or_default();
        assert!(requests.is_empty());
    }
}
