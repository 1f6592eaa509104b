use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;
use twbulk::{Identity, RecordSink, RemoteApi, RemoteApiError, WorkError};

/// What the fake remote service does for one identity.
#[derive(Debug, Clone)]
pub enum Script {
    /// Return these record ids, filtered by `since_id`.
    Records(Vec<u64>),
    /// Write these records, then fail.
    FailAfter(Vec<u64>, RemoteApiError),
}

/// Remote client whose answers are scripted per identity basename.
///
/// Identities without a script get two records, ids 1 and 2.
#[derive(Debug, Default)]
pub struct ScriptedApi {
    scripts: HashMap<String, Script>,
    calls: Mutex<Vec<(Identity, Option<u64>)>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(mut self, basename: &str, script: Script) -> Self {
        self.scripts.insert(basename.to_string(), script);
        self
    }

    pub fn failing(self, basename: &str) -> Self {
        self.script(
            basename,
            Script::FailAfter(
                Vec::new(),
                RemoteApiError::Http {
                    status: 503,
                    message: "over capacity".to_string(),
                },
            ),
        )
    }

    pub fn calls(&self) -> Vec<(Identity, Option<u64>)> {
        self.calls.lock().unwrap().clone()
    }

    async fn serve(
        &self,
        sink: &mut RecordSink,
        identity: &Identity,
        since_id: Option<u64>,
    ) -> Result<(), WorkError> {
        self.calls
            .lock()
            .unwrap()
            .push((identity.clone(), since_id));

        let script = self
            .scripts
            .get(&identity.basename())
            .cloned()
            .unwrap_or(Script::Records(vec![1, 2]));
        let (ids, failure) = match script {
            Script::Records(ids) => (ids, None),
            Script::FailAfter(ids, error) => (ids, Some(error)),
        };

        for id in ids.into_iter().filter(|id| since_id.map_or(true, |s| *id > s)) {
            sink.write_record(&json!({"id": id, "user": identity.basename()}))
                .await?;
        }

        match failure {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteApi for ScriptedApi {
    async fn user_timeline(
        &self,
        sink: &mut RecordSink,
        identity: &Identity,
        since_id: Option<u64>,
    ) -> Result<(), WorkError> {
        self.serve(sink, identity, since_id).await
    }

    async fn followers_ids(
        &self,
        sink: &mut RecordSink,
        identity: &Identity,
        since_id: Option<u64>,
    ) -> Result<(), WorkError> {
        self.serve(sink, identity, since_id).await
    }

    async fn friends_ids(
        &self,
        sink: &mut RecordSink,
        identity: &Identity,
        since_id: Option<u64>,
    ) -> Result<(), WorkError> {
        self.serve(sink, identity, since_id).await
    }
}

/// Record ids in an output file, in file order.
pub fn ids_in(path: &Path) -> Vec<u64> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            value["id"].as_u64().unwrap()
        })
        .collect()
}

pub fn write_records(path: &Path, ids: &[u64]) {
    let contents: String = ids
        .iter()
        .map(|id| format!("{}\n", json!({"id": id})))
        .collect();
    std::fs::write(path, contents).unwrap();
}
