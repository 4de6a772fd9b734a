//! Recording fakes for the pipeline's collaborators.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use crate::auth::{Session, SessionVerifier};
use crate::clients::{
    BlobStore, ClientError, FeedbackGenerator, FileBlob, KvStore, Rasterizer, UploadedFile,
    PNG_MEDIA_TYPE,
};
use crate::pipeline::analyzer::Analyzer;
use crate::pipeline::critique::FeedbackResponse;
use crate::pipeline::status::{PipelineState, StatusTracker};

/// Shared, ordered log of collaborator calls and the pipeline state each saw.
#[derive(Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<(&'static str, PipelineState)>>>,
    status: StatusTracker,
}

impl CallLog {
    fn record(&self, name: &'static str) {
        let state = self.status.current().state;
        self.entries.lock().expect("call log lock").push((name, state));
    }
}

fn record(log: &Option<CallLog>, name: &'static str) {
    if let Some(log) = log {
        log.record(name);
    }
}

fn refused(what: &str) -> ClientError {
    ClientError::S3(format!("{what} refused by test"))
}

#[derive(Default)]
pub struct RecordingBlobStore {
    log: Option<CallLog>,
    calls: AtomicUsize,
    fail_on: Mutex<Option<usize>>,
    none_on: Mutex<Option<usize>>,
    objects: Mutex<Vec<(String, String, Bytes)>>,
}

impl RecordingBlobStore {
    /// Makes the `n`th upload (1-based) return an error.
    pub fn fail_on_call(&self, n: usize) {
        *self.fail_on.lock().expect("lock") = Some(n);
    }

    /// Makes the `n`th upload (1-based) return no reference.
    pub fn answer_none_on_call(&self, n: usize) {
        *self.none_on.lock().expect("lock") = Some(n);
    }

    /// `(path, file name)` of every stored upload, in order.
    pub fn uploaded(&self) -> Vec<(String, String)> {
        self.objects
            .lock()
            .expect("lock")
            .iter()
            .map(|(path, name, _)| (path.clone(), name.clone()))
            .collect()
    }
}

#[async_trait]
impl BlobStore for RecordingBlobStore {
    async fn upload(&self, files: &[FileBlob]) -> Result<Option<UploadedFile>, ClientError> {
        record(&self.log, "upload");
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if *self.fail_on.lock().expect("lock") == Some(n) {
            return Err(refused("upload"));
        }
        if *self.none_on.lock().expect("lock") == Some(n) {
            return Ok(None);
        }

        let mut objects = self.objects.lock().expect("lock");
        let mut uploaded = None;
        for file in files {
            let path = format!("blobs/{}/{}", objects.len() + 1, file.name);
            objects.push((path.clone(), file.name.clone(), file.data.clone()));
            uploaded = Some(UploadedFile { path });
        }
        Ok(uploaded)
    }

    async fn download(&self, path: &str) -> Result<Bytes, ClientError> {
        record(&self.log, "download");
        self.objects
            .lock()
            .expect("lock")
            .iter()
            .find(|(p, _, _)| p == path)
            .map(|(_, _, data)| data.clone())
            .ok_or_else(|| refused("download"))
    }
}

#[derive(Default)]
pub struct MemoryKv {
    log: Option<CallLog>,
    values: Mutex<HashMap<String, String>>,
    writes: Mutex<Vec<(String, String)>>,
    reject: AtomicBool,
}

impl MemoryKv {
    /// Subsequent `set` calls report `false` and store nothing.
    pub fn reject_writes(&self) {
        self.reject.store(true, Ordering::SeqCst);
    }

    /// Every accepted `(key, value)` write, in order.
    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes.lock().expect("lock").clone()
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn set(&self, key: &str, value: &str) -> Result<bool, ClientError> {
        record(&self.log, "set");
        if self.reject.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.values
            .lock()
            .expect("lock")
            .insert(key.to_string(), value.to_string());
        self.writes
            .lock()
            .expect("lock")
            .push((key.to_string(), value.to_string()));
        Ok(true)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        Ok(self.values.lock().expect("lock").get(key).cloned())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, ClientError> {
        Ok(self
            .values
            .lock()
            .expect("lock")
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(_, v)| v.clone())
            .collect())
    }
}

#[derive(Default)]
pub struct FakeRasterizer {
    log: Option<CallLog>,
    empty: AtomicBool,
}

impl FakeRasterizer {
    pub fn produce_nothing(&self) {
        self.empty.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Rasterizer for FakeRasterizer {
    async fn rasterize(&self, document: &FileBlob) -> Result<Option<FileBlob>, ClientError> {
        record(&self.log, "rasterize");
        if self.empty.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(Some(FileBlob::new(
            document.name.replace(".pdf", ".png"),
            PNG_MEDIA_TYPE,
            b"\x89PNG\r\n\x1a\n".to_vec(),
        )))
    }
}

#[derive(Default)]
pub struct FakeFeedback {
    log: Option<CallLog>,
    response: Mutex<Option<FeedbackResponse>>,
    paths: Mutex<Vec<String>>,
}

impl FakeFeedback {
    pub fn respond_with(&self, response: FeedbackResponse) {
        *self.response.lock().expect("lock") = Some(response);
    }

    pub fn requested_paths(&self) -> Vec<String> {
        self.paths.lock().expect("lock").clone()
    }
}

#[async_trait]
impl FeedbackGenerator for FakeFeedback {
    async fn feedback(
        &self,
        document_path: &str,
        _instructions: &str,
    ) -> Result<Option<FeedbackResponse>, ClientError> {
        record(&self.log, "feedback");
        self.paths
            .lock()
            .expect("lock")
            .push(document_path.to_string());
        Ok(self.response.lock().expect("lock").clone())
    }
}

/// Token → subject table.
#[derive(Default)]
pub struct StaticSessions(pub HashMap<String, String>);

impl StaticSessions {
    pub fn with(token: &str, subject: &str) -> Self {
        Self(HashMap::from([(token.to_string(), subject.to_string())]))
    }
}

#[async_trait]
impl SessionVerifier for StaticSessions {
    async fn verify(&self, token: &str) -> Result<Option<Session>, ClientError> {
        Ok(self.0.get(token).map(|subject| Session {
            subject: subject.clone(),
        }))
    }
}

/// All fakes wired to one call log and one status tracker.
pub struct Harness {
    pub status: StatusTracker,
    pub blobs: Arc<RecordingBlobStore>,
    pub kv: Arc<MemoryKv>,
    pub rasterizer: Arc<FakeRasterizer>,
    pub feedback: Arc<FakeFeedback>,
    log: CallLog,
}

impl Harness {
    pub fn new() -> Self {
        let status = StatusTracker::new();
        let log = CallLog {
            entries: Arc::default(),
            status: status.clone(),
        };
        Self {
            blobs: Arc::new(RecordingBlobStore {
                log: Some(log.clone()),
                ..Default::default()
            }),
            kv: Arc::new(MemoryKv {
                log: Some(log.clone()),
                ..Default::default()
            }),
            rasterizer: Arc::new(FakeRasterizer {
                log: Some(log.clone()),
                ..Default::default()
            }),
            feedback: Arc::new(FakeFeedback {
                log: Some(log.clone()),
                ..Default::default()
            }),
            status,
            log,
        }
    }

    pub fn analyzer(&self) -> Arc<Analyzer> {
        Arc::new(Analyzer::new(
            self.blobs.clone(),
            self.kv.clone(),
            self.rasterizer.clone(),
            self.feedback.clone(),
        ))
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls_with_state().into_iter().map(|(name, _)| name).collect()
    }

    pub fn calls_with_state(&self) -> Vec<(&'static str, PipelineState)> {
        self.log.entries.lock().expect("call log lock").clone()
    }
}
