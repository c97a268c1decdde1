//! Testing utilities for the tutor pipeline workspace
//!
//! Shared fakes: an in-memory storage gateway and a scripted
//! completion gateway.

#![allow(missing_docs)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use tokio::sync::{broadcast, mpsc, oneshot};
use tutor_completion::{CompletionError, CompletionGateway};
use tutor_sandbox::{
    ChangeEvent, DirEntry, FileOperation, StorageError, StorageGateway, WatchSubscription,
};

/// In-memory storage gateway
///
/// Files live in a map; every `write_file` emits a change event so
/// watcher tests can drive the trigger loop. `writes()` exposes the
/// full write log for no-op assertions.
pub struct MemorySandbox {
    files: Mutex<HashMap<String, String>>,
    stamps: Mutex<HashMap<String, i64>>,
    writes: Mutex<Vec<(String, String)>>,
    fail_writes_under: Mutex<Option<String>>,
    events: broadcast::Sender<ChangeEvent>,
    clock: AtomicI64,
}

impl MemorySandbox {
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            files: Mutex::new(HashMap::new()),
            stamps: Mutex::new(HashMap::new()),
            writes: Mutex::new(Vec::new()),
            fail_writes_under: Mutex::new(None),
            events,
            clock: AtomicI64::new(1),
        }
    }

    /// Make every `write_file` under `prefix` fail with a provider error
    pub fn fail_writes_under(&self, prefix: &str) {
        *self.fail_writes_under.lock().unwrap() = Some(prefix.to_string());
    }

    /// Current contents of a file, if present
    #[must_use]
    pub fn file(&self, path: &str) -> Option<String> {
        self.files.lock().unwrap().get(path).cloned()
    }

    /// Every successful `(path, contents)` write, in order
    #[must_use]
    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes.lock().unwrap().clone()
    }

    /// Names of files directly under `dir`, sorted
    #[must_use]
    pub fn names_under(&self, dir: &str) -> Vec<String> {
        let prefix = format!("{}/", dir.trim_end_matches('/'));
        let mut names: Vec<String> = self
            .files
            .lock()
            .unwrap()
            .keys()
            .filter_map(|path| path.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/'))
            .map(ToString::to_string)
            .collect();
        names.sort();
        names
    }
}

impl Default for MemorySandbox {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageGateway for MemorySandbox {
    async fn make_dir(&self, _path: &str) -> Result<(), StorageError> {
        Ok(())
    }

    async fn read_file(&self, path: &str) -> Result<String, StorageError> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn write_file(&self, path: &str, contents: &str) -> Result<(), StorageError> {
        if let Some(prefix) = self.fail_writes_under.lock().unwrap().as_deref() {
            if path.starts_with(prefix) {
                return Err(StorageError::Provider {
                    status: 500,
                    message: "injected write failure".to_string(),
                });
            }
        }

        let existed = {
            let mut files = self.files.lock().unwrap();
            files.insert(path.to_string(), contents.to_string()).is_some()
        };
        let stamp = self.clock.fetch_add(1, Ordering::SeqCst);
        self.stamps.lock().unwrap().insert(path.to_string(), stamp);
        self.writes
            .lock()
            .unwrap()
            .push((path.to_string(), contents.to_string()));

        let operation = if existed {
            FileOperation::Write
        } else {
            FileOperation::Create
        };
        let _ = self.events.send(ChangeEvent::new(path, operation));
        Ok(())
    }

    async fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>, StorageError> {
        let prefix = format!("{}/", path.trim_end_matches('/'));
        let files = self.files.lock().unwrap();
        let stamps = self.stamps.lock().unwrap();
        let mut entries: Vec<DirEntry> = files
            .iter()
            .filter_map(|(full, contents)| {
                let rest = full.strip_prefix(&prefix)?;
                if rest.contains('/') {
                    return None;
                }
                Some(DirEntry {
                    name: rest.to_string(),
                    size: contents.len() as u64,
                    modified_ms: stamps.get(full).copied().unwrap_or(0),
                })
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn watch_dir(&self, path: &str) -> Result<WatchSubscription, StorageError> {
        let mut source = self.events.subscribe();
        let prefix = format!("{}/", path.trim_end_matches('/'));

        let (tx, rx) = mpsc::channel(256);
        let (stop_tx, mut stop_rx) = oneshot::channel();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    event = source.recv() => {
                        let Ok(event) = event else { break };
                        if !event.path.starts_with(&prefix) {
                            continue;
                        }
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Ok(WatchSubscription::new(rx, stop_tx))
    }
}

/// What the fake completion gateway does with each prompt
enum FakeMode {
    /// Answer every question with a canned derivation of its text
    Echo,
    /// Return `Ok("")` for everything
    AlwaysEmpty,
    /// Return a provider error for everything
    AlwaysFailing,
    /// Pop scripted responses in order; empty once exhausted
    Scripted(Mutex<VecDeque<Result<String, u16>>>),
}

/// Scripted completion gateway recording prompt order
pub struct FakeCompletion {
    mode: FakeMode,
    delay: Option<std::time::Duration>,
    prompts: Mutex<Vec<String>>,
}

impl FakeCompletion {
    /// Gateway that answers every question
    #[must_use]
    pub fn new() -> Self {
        Self {
            mode: FakeMode::Echo,
            delay: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Gateway that returns an empty completion for every question
    #[must_use]
    pub fn always_empty() -> Self {
        Self {
            mode: FakeMode::AlwaysEmpty,
            delay: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Gateway that fails every call with a provider error
    #[must_use]
    pub fn always_failing() -> Self {
        Self {
            mode: FakeMode::AlwaysFailing,
            delay: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Gateway that plays back `responses` in order
    ///
    /// `Ok(text)` completes with `text`; `Err(status)` fails with a
    /// provider error carrying that status.
    #[must_use]
    pub fn scripted(responses: Vec<Result<String, u16>>) -> Self {
        Self {
            mode: FakeMode::Scripted(Mutex::new(responses.into())),
            delay: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Sleep before answering each prompt, to hold a pass in flight
    #[must_use]
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Prompts received so far, in call order
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Default for FakeCompletion {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionGateway for FakeCompletion {
    async fn complete(&self, question: &str) -> Result<String, CompletionError> {
        self.prompts.lock().unwrap().push(question.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.mode {
            FakeMode::Echo => Ok(format!("Explanation for: {question}")),
            FakeMode::AlwaysEmpty => Ok(String::new()),
            FakeMode::AlwaysFailing => Err(CompletionError::Provider {
                status: 500,
                message: "injected completion failure".to_string(),
            }),
            FakeMode::Scripted(responses) => {
                match responses.lock().unwrap().pop_front() {
                    Some(Ok(text)) => Ok(text),
                    Some(Err(status)) => Err(CompletionError::Provider {
                        status,
                        message: "scripted failure".to_string(),
                    }),
                    None => Ok(String::new()),
                }
            }
        }
    }
}
