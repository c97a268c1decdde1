//! Remote sandbox backend
//!
//! Talks to the sandbox provider's file API over HTTPS:
//! - `POST /dirs/create` `{path}` creates a directory (409 means it
//!   already exists, treated as success)
//! - `POST /files/read` `{path}` -> `{contents}`
//! - `POST /files/write` `{path, contents}` creates or overwrites
//! - `POST /files/list` `{path}` -> `{entries: [{name, size, modified_ms}]}`
//!
//! The provider pushes no events, so [`RemoteSandbox::watch_dir`]
//! polls the listing on an interval and diffs `(size, modified_ms)`
//! snapshots into change events.

use crate::error::StorageError;
use crate::gateway::{ChangeEvent, DirEntry, FileOperation, StorageGateway, WatchSubscription};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Default provider endpoint
const DEFAULT_BASE_URL: &str = "https://api.sandbox.dev/v1";

/// Default listing poll interval for directory watches
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Capacity of the change-event channel per subscription
const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Storage gateway backed by the remote sandbox file API
#[derive(Debug, Clone)]
pub struct RemoteSandbox {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    poll_interval: Duration,
}

#[derive(Serialize)]
struct PathBody<'a> {
    path: &'a str,
}

#[derive(Serialize)]
struct WriteBody<'a> {
    path: &'a str,
    contents: &'a str,
}

#[derive(Deserialize)]
struct ReadResponse {
    contents: String,
}

#[derive(Deserialize)]
struct ListResponse {
    entries: Vec<WireEntry>,
}

#[derive(Deserialize)]
struct WireEntry {
    name: String,
    size: u64,
    modified_ms: i64,
}

impl RemoteSandbox {
    /// Create a gateway against the default provider endpoint
    ///
    /// `SANDBOX_API_URL` overrides the endpoint when set.
    #[must_use]
    pub fn new(api_key: String) -> Self {
        let base_url =
            std::env::var("SANDBOX_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::with_base_url(api_key, base_url)
    }

    /// Create a gateway against an explicit endpoint
    #[must_use]
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override the watch poll interval
    #[inline]
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    async fn post<B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<reqwest::Response, StorageError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, endpoint))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;
        Ok(response)
    }

    async fn check(
        response: reqwest::Response,
        path: &str,
    ) -> Result<reqwest::Response, StorageError> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StorageError::Provider {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl StorageGateway for RemoteSandbox {
    async fn make_dir(&self, path: &str) -> Result<(), StorageError> {
        let response = self.post("/dirs/create", &PathBody { path }).await?;
        // 409 means the directory already exists; make_dir is idempotent
        if response.status() == StatusCode::CONFLICT {
            return Ok(());
        }
        Self::check(response, path).await?;
        Ok(())
    }

    async fn read_file(&self, path: &str) -> Result<String, StorageError> {
        let response = self.post("/files/read", &PathBody { path }).await?;
        let response = Self::check(response, path).await?;
        let body: ReadResponse = response
            .json()
            .await
            .map_err(|e| StorageError::MalformedResponse(e.to_string()))?;
        Ok(body.contents)
    }

    async fn write_file(&self, path: &str, contents: &str) -> Result<(), StorageError> {
        let response = self.post("/files/write", &WriteBody { path, contents }).await?;
        Self::check(response, path).await?;
        Ok(())
    }

    async fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>, StorageError> {
        let response = self.post("/files/list", &PathBody { path }).await?;
        let response = Self::check(response, path).await?;
        let body: ListResponse = response
            .json()
            .await
            .map_err(|e| StorageError::MalformedResponse(e.to_string()))?;
        Ok(body
            .entries
            .into_iter()
            .map(|e| DirEntry {
                name: e.name,
                size: e.size,
                modified_ms: e.modified_ms,
            })
            .collect())
    }

    async fn watch_dir(&self, path: &str) -> Result<WatchSubscription, StorageError> {
        // The initial listing doubles as subscription validation:
        // if the directory cannot be listed, no watch exists.
        let initial = self
            .list_dir(path)
            .await
            .map_err(|e| StorageError::WatchFailed(e.to_string()))?;
        let mut snapshot = snapshot_of(&initial);

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (stop_tx, mut stop_rx) = oneshot::channel();

        let gateway = self.clone();
        let dir = path.to_string();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(gateway.poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        let entries = match gateway.list_dir(&dir).await {
                            Ok(entries) => entries,
                            Err(e) => {
                                // Transient listing failures keep the
                                // previous snapshot; the next tick retries.
                                tracing::warn!("poll of {} failed: {}", dir, e);
                                continue;
                            }
                        };
                        let next = snapshot_of(&entries);
                        for event in diff_snapshots(&dir, &snapshot, &next) {
                            if tx.send(event).await.is_err() {
                                return;
                            }
                        }
                        snapshot = next;
                    }
                }
            }
        });

        Ok(WatchSubscription::new(rx, stop_tx))
    }
}

/// Entry metadata the watcher compares between polls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EntryMeta {
    size: u64,
    modified_ms: i64,
}

fn snapshot_of(entries: &[DirEntry]) -> BTreeMap<String, EntryMeta> {
    entries
        .iter()
        .map(|e| {
            (
                e.name.clone(),
                EntryMeta {
                    size: e.size,
                    modified_ms: e.modified_ms,
                },
            )
        })
        .collect()
}

fn join(dir: &str, name: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), name)
}

/// Diff two listing snapshots into change events
///
/// New names become `Create`, changed metadata becomes `Write`,
/// vanished names become `Remove`. Ordering follows the sorted entry
/// names, removals last.
fn diff_snapshots(
    dir: &str,
    prev: &BTreeMap<String, EntryMeta>,
    next: &BTreeMap<String, EntryMeta>,
) -> Vec<ChangeEvent> {
    let mut events = Vec::new();

    for (name, meta) in next {
        match prev.get(name) {
            None => events.push(ChangeEvent::new(join(dir, name), FileOperation::Create)),
            Some(old) if old != meta => {
                events.push(ChangeEvent::new(join(dir, name), FileOperation::Write));
            }
            Some(_) => {}
        }
    }

    for name in prev.keys() {
        if !next.contains_key(name) {
            events.push(ChangeEvent::new(join(dir, name), FileOperation::Remove));
        }
    }

    events
}
