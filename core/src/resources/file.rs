//! `opencga_file`: links an existing file on a mounted filesystem into a
//! study's catalog.
//!
//! OpenCGA races when two links sharing a destination path are created at
//! the same time, so `create` holds the client's file-link lock for its whole
//! duration. No other operation takes that lock.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::client::{params, OpencgaClient};
use crate::error::{OpencgaError, Result};
use crate::resources::{require, ManagedResource};
use crate::state::ResourceState;
use crate::types::File;

const URI_SCHEME: &str = "file://";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLinkConfig {
    pub study: Option<String>,
    /// Absolute location of the file, e.g. `/genomes/sample/A00001.cram`.
    pub uri: String,
    /// Catalog directory; must end with `/`.
    pub path: String,
}

impl FileLinkConfig {
    pub fn validate_path(&self) -> Result<()> {
        if self.path.ends_with('/') {
            Ok(())
        } else {
            Err(OpencgaError::Validation(format!(
                "path parameter must be a dir path and end in /, got: {}",
                self.path
            )))
        }
    }
}

pub struct FileResource;

impl FileResource {
    pub(crate) fn state(id: &str, file: &File) -> ResourceState {
        ResourceState::new(id)
            .with("name", file.name.as_str())
            .with("uri", file.uri.replacen(URI_SCHEME, "", 1))
            .with("path", format!("{}/", parent_dir(&file.path)))
    }
}

impl ManagedResource for FileResource {
    type Config = FileLinkConfig;

    const TYPE_NAME: &'static str = "opencga_file";

    fn create(client: &OpencgaClient, config: &FileLinkConfig) -> Result<ResourceState> {
        config.validate_path()?;
        let study = require(config.study.as_deref(), "must supply study id for file linking")?;

        let _guard = client.lock_file_links();

        let path = "files/link";
        let payload = json!({
            "description": "",
            "relatedFiles": [],
            "uri": config.uri,
            "path": config.path,
        });
        let query = params([
            ("study", study),
            ("type", "FILE"),
            ("parents", "true"),
            ("createFolder", "false"),
        ]);
        let response = client.post(path, &query, &payload)?;
        let file: File = response.decode_first(path, "file")?;
        info!(id = file.id, uri = %config.uri, study, "linked file");

        Self::read(client, &file.id.to_string(), config)
    }

    fn read(client: &OpencgaClient, id: &str, _config: &FileLinkConfig) -> Result<ResourceState> {
        let path = format!("files/{id}/info");
        let response = client.get(&path, &params([]))?;
        let file: File = response.decode_single(&path, "file")?;
        Ok(Self::state(id, &file))
    }

    /// Re-links the file and reads it back.
    fn update(client: &OpencgaClient, _id: &str, config: &FileLinkConfig) -> Result<ResourceState> {
        Self::create(client, config)
    }

    fn in_sync(config: &FileLinkConfig, state: &ResourceState) -> bool {
        state.get_str("uri") == Some(config.uri.as_str())
            && state.get_str("path") == Some(config.path.as_str())
    }
}

/// Directory part of a catalog path: everything before the last `/`, `/` for
/// a top-level entry and `.` when there is no separator.
fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(idx) => &path[..idx],
        None => ".",
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::client::testing::{ok, RecordingTransport};
    use crate::http::{HttpRequest, HttpResponse, Transport};

    fn config() -> FileLinkConfig {
        FileLinkConfig {
            study: Some("s1".to_string()),
            uri: "/genomes/sample/A00001.cram".to_string(),
            path: "sample/".to_string(),
        }
    }

    #[test]
    fn parent_dir_cases() {
        assert_eq!(parent_dir("sample/A00001.cram"), "sample");
        assert_eq!(parent_dir("a/b/c.vcf"), "a/b");
        assert_eq!(parent_dir("/top.bam"), "/");
        assert_eq!(parent_dir("loose.txt"), ".");
    }

    #[test]
    fn path_must_be_a_directory() {
        let transport = RecordingTransport::default();
        let client = OpencgaClient::with_transport("http://h", transport.clone());
        let mut cfg = config();
        cfg.path = "sample/A00001.cram".to_string();
        let err = FileResource::create(&client, &cfg).unwrap_err();
        assert!(matches!(err, OpencgaError::Validation(_)));

        cfg = config();
        cfg.study = None;
        let err = FileResource::create(&client, &cfg).unwrap_err();
        assert!(err.to_string().contains("must supply study id"));
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn link_then_read_normalizes_uri_and_path() {
        let transport = RecordingTransport::default();
        transport.reply(ok(json!([{"id": 31}]))).reply(ok(json!([{
            "id": 31,
            "name": "A00001.cram",
            "uri": "file:///genomes/sample/A00001.cram",
            "path": "sample/A00001.cram"
        }])));
        let client = OpencgaClient::with_transport("http://h", transport.clone());

        let state = FileResource::create(&client, &config()).unwrap();
        assert_eq!(state.id, "31");
        assert_eq!(state.get_str("uri"), Some("/genomes/sample/A00001.cram"));
        assert_eq!(state.get_str("path"), Some("sample/"));
        assert!(FileResource::in_sync(&config(), &state));

        let sent = transport.sent();
        assert_eq!(sent[0].query_param("type"), Some("FILE"));
        assert_eq!(sent[0].query_param("parents"), Some("true"));
        assert_eq!(sent[0].query_param("createFolder"), Some("false"));
        let body: serde_json::Value = serde_json::from_str(sent[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body["relatedFiles"], json!([]));
    }

    /// Answers every call after a pause and tracks how many calls overlap.
    #[derive(Clone, Default)]
    struct SlowTransport {
        in_flight: Arc<AtomicUsize>,
        max_in_flight: Arc<AtomicUsize>,
        next_id: Arc<AtomicUsize>,
    }

    impl Transport for SlowTransport {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(20));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let id = if request.url.ends_with("files/link") {
                self.next_id.fetch_add(1, Ordering::SeqCst)
            } else {
                0
            };
            let body = ok(json!([{"id": id, "uri": "file:///x/y", "path": "x/y"}]));
            Ok(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: body.to_string(),
            })
        }
    }

    #[test]
    fn concurrent_links_are_serialized() {
        let transport = SlowTransport::default();
        let client = Arc::new(OpencgaClient::with_transport("http://h", transport.clone()));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let client = Arc::clone(&client);
                thread::spawn(move || FileResource::create(&client, &config()))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        assert_eq!(transport.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reads_do_not_wait_for_the_link_lock() {
        let transport = SlowTransport::default();
        let client = Arc::new(OpencgaClient::with_transport("http://h", transport));

        let _guard = client.lock_file_links();
        let reader = {
            let client = Arc::clone(&client);
            thread::spawn(move || FileResource::read(&client, "1", &config()))
        };
        let state = reader.join().unwrap().unwrap();
        assert_eq!(state.get_str("path"), Some("x/"));
    }
}
