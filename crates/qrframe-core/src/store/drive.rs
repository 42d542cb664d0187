//! Google Drive v3 store over the REST API.
//!
//! Authentication is delegated: the store is handed an already-issued OAuth
//! bearer token (read from the credentials file) and sends it on every call.

use super::{FileDescriptor, RemoteStore, UploadedFile};
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const API_BASE: &str = "https://www.googleapis.com/drive/v3";
const UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";
const MULTIPART_BOUNDARY: &str = "qrframe_multipart_boundary";

/// Google Drive store.
pub struct DriveStore {
    access_token: String,
    api_base: String,
    upload_base: String,
    client: reqwest::Client,
}

impl DriveStore {
    pub fn new(access_token: &str, timeout: Duration) -> StoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Request {
                message: format!("Failed to build HTTP client: {e}"),
                status_code: None,
            })?;
        Ok(Self {
            access_token: access_token.to_string(),
            api_base: API_BASE.to_string(),
            upload_base: UPLOAD_BASE.to_string(),
            client,
        })
    }

    /// Point the store at different API hosts (test servers, proxies).
    pub fn with_base_urls(mut self, api_base: &str, upload_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self.upload_base = upload_base.trim_end_matches('/').to_string();
        self
    }
}

#[derive(Deserialize)]
struct Credentials {
    access_token: String,
}

/// Read the bearer token from a `{"access_token": "..."}` JSON file.
pub(crate) fn read_access_token(path: &Path) -> StoreResult<String> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        StoreError::Auth(format!(
            "Cannot read credentials file {}: {e}",
            path.display()
        ))
    })?;
    let creds: Credentials = serde_json::from_str(&content).map_err(|e| {
        StoreError::Auth(format!(
            "Credentials file {} is not valid: {e}",
            path.display()
        ))
    })?;
    if creds.access_token.trim().is_empty() {
        return Err(StoreError::Auth(format!(
            "Credentials file {} has an empty access_token",
            path.display()
        )));
    }
    Ok(creds.access_token.trim().to_string())
}

// --- Request / response types ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct DriveFile {
    id: String,
    name: String,
}

#[derive(Deserialize)]
struct CreatedFile {
    id: String,
}

#[derive(Serialize)]
struct FileMetadata<'a> {
    name: &'a str,
    parents: [&'a str; 1],
}

/// Search expression for the direct, non-trashed children of a folder.
pub(crate) fn children_query(folder_id: &str) -> String {
    let escaped = folder_id.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}' in parents and trashed = false")
}

/// Public download link for an uploaded file.
pub(crate) fn public_link(file_id: &str) -> String {
    format!("https://drive.google.com/uc?id={file_id}")
}

/// Build a `multipart/related` upload body: JSON metadata part, then media.
pub(crate) fn multipart_body(
    name: &str,
    folder_id: &str,
    mime_type: &str,
    bytes: &[u8],
) -> StoreResult<Vec<u8>> {
    let metadata = serde_json::to_string(&FileMetadata {
        name,
        parents: [folder_id],
    })
    .map_err(|e| StoreError::MalformedResponse(format!("Cannot encode metadata: {e}")))?;

    let mut body = Vec::with_capacity(bytes.len() + metadata.len() + 256);
    body.extend_from_slice(
        format!(
            "--{MULTIPART_BOUNDARY}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!("--{MULTIPART_BOUNDARY}\r\nContent-Type: {mime_type}\r\n\r\n").as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
    Ok(body)
}

/// Map a non-success response to a store error.
async fn status_error(resp: reqwest::Response, what: &str) -> StoreError {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    match status.as_u16() {
        401 | 403 => StoreError::Auth(format!("Drive rejected {what} (HTTP {status}): {text}")),
        404 => StoreError::NotFound(format!("{what}: {text}")),
        code => StoreError::Request {
            message: format!("Drive {what} HTTP {status}: {text}"),
            status_code: Some(code),
        },
    }
}

fn transport_error(e: reqwest::Error, what: &str) -> StoreError {
    StoreError::Request {
        message: format!("Drive {what} request failed: {e}"),
        status_code: e.status().map(|s| s.as_u16()),
    }
}

#[async_trait]
impl RemoteStore for DriveStore {
    fn name(&self) -> &str {
        "drive"
    }

    async fn list(&self, folder_id: &str) -> StoreResult<Vec<FileDescriptor>> {
        let query = children_query(folder_id);
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params: Vec<(&str, &str)> = vec![
                ("q", query.as_str()),
                ("fields", "nextPageToken, files(id, name)"),
                ("pageSize", "1000"),
            ];
            if let Some(ref token) = page_token {
                params.push(("pageToken", token.as_str()));
            }

            let resp = self
                .client
                .get(format!("{}/files", self.api_base))
                .bearer_auth(&self.access_token)
                .query(&params)
                .send()
                .await
                .map_err(|e| transport_error(e, "list"))?;

            if !resp.status().is_success() {
                return Err(status_error(resp, "list").await);
            }

            let page: FileList = resp.json().await.map_err(|e| {
                StoreError::MalformedResponse(format!("Failed to parse file listing: {e}"))
            })?;
            files.extend(
                page.files
                    .into_iter()
                    .map(|f| FileDescriptor::new(f.id, f.name)),
            );

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        tracing::debug!("Listed {} file(s) in folder {folder_id}", files.len());
        Ok(files)
    }

    async fn download(&self, file_id: &str) -> StoreResult<Vec<u8>> {
        let resp = self
            .client
            .get(format!("{}/files/{file_id}", self.api_base))
            .bearer_auth(&self.access_token)
            .query(&[("alt", "media")])
            .send()
            .await
            .map_err(|e| transport_error(e, "download"))?;

        if !resp.status().is_success() {
            return Err(status_error(resp, "download").await);
        }

        let total = resp.content_length();
        let mut bytes = Vec::with_capacity(total.unwrap_or(0) as usize);
        let mut stream = resp.bytes_stream();
        let mut last_pct = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| transport_error(e, "download"))?;
            bytes.extend_from_slice(&chunk);
            if let Some(total) = total.filter(|t| *t > 0) {
                let pct = bytes.len() as u64 * 100 / total;
                if pct >= last_pct + 25 {
                    tracing::debug!("Download {file_id}: {pct}%");
                    last_pct = pct;
                }
            }
        }

        Ok(bytes)
    }

    async fn upload(
        &self,
        bytes: Vec<u8>,
        name: &str,
        folder_id: &str,
        mime_type: &str,
    ) -> StoreResult<UploadedFile> {
        let body = multipart_body(name, folder_id, mime_type, &bytes)?;

        let resp = self
            .client
            .post(format!("{}/files", self.upload_base))
            .bearer_auth(&self.access_token)
            .query(&[("uploadType", "multipart"), ("fields", "id")])
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={MULTIPART_BOUNDARY}"),
            )
            .body(body)
            .send()
            .await
            .map_err(|e| transport_error(e, "upload"))?;

        if !resp.status().is_success() {
            return Err(status_error(resp, "upload").await);
        }

        let created: CreatedFile = resp.json().await.map_err(|e| {
            StoreError::MalformedResponse(format!("Failed to parse upload response: {e}"))
        })?;

        let public_link = public_link(&created.id);
        tracing::info!("Uploaded '{name}' to folder {folder_id}: {public_link}");
        Ok(UploadedFile {
            id: created.id,
            public_link,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_query() {
        assert_eq!(
            children_query("1yMt9hQ5"),
            "'1yMt9hQ5' in parents and trashed = false"
        );
    }

    #[test]
    fn test_children_query_escapes_quotes() {
        assert_eq!(
            children_query("it's"),
            "'it\\'s' in parents and trashed = false"
        );
    }

    #[test]
    fn test_public_link_format() {
        assert_eq!(public_link("abc123"), "https://drive.google.com/uc?id=abc123");
    }

    #[test]
    fn test_multipart_body_layout() {
        let body = multipart_body("photo1.png_with_frame.png", "dest", "image/png", b"PNGDATA")
            .unwrap();
        let text = String::from_utf8_lossy(&body);

        assert!(text.starts_with(&format!("--{MULTIPART_BOUNDARY}\r\n")));
        assert!(text.contains(r#""name":"photo1.png_with_frame.png""#));
        assert!(text.contains(r#""parents":["dest"]"#));
        assert!(text.contains("Content-Type: image/png\r\n\r\nPNGDATA\r\n"));
        assert!(text.ends_with(&format!("--{MULTIPART_BOUNDARY}--\r\n")));
    }

    #[test]
    fn test_file_list_parsing() {
        let json = r#"{"nextPageToken":"p2","files":[{"id":"a","name":"one.jpg"}]}"#;
        let list: FileList = serde_json::from_str(json).unwrap();
        assert_eq!(list.files.len(), 1);
        assert_eq!(list.next_page_token.as_deref(), Some("p2"));

        let list: FileList = serde_json::from_str("{}").unwrap();
        assert!(list.files.is_empty());
        assert!(list.next_page_token.is_none());
    }

    #[test]
    fn test_read_access_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");

        std::fs::write(&path, r#"{"access_token": " tok \n"}"#).unwrap();
        assert_eq!(read_access_token(&path).unwrap(), "tok");

        std::fs::write(&path, r#"{"access_token": ""}"#).unwrap();
        assert!(matches!(read_access_token(&path), Err(StoreError::Auth(_))));

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(read_access_token(&path), Err(StoreError::Auth(_))));
    }

    #[test]
    fn test_with_base_urls_trims_slash() {
        let store = DriveStore::new("tok", Duration::from_secs(5))
            .unwrap()
            .with_base_urls("http://localhost:9/api/", "http://localhost:9/up/");
        assert_eq!(store.api_base, "http://localhost:9/api");
        assert_eq!(store.upload_base, "http://localhost:9/up");
    }

    mod http {
        use super::*;
        use std::sync::{Arc, Mutex};
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::{TcpListener, TcpStream};

        type Seen = Arc<Mutex<Vec<String>>>;

        /// Serve `responses` in order, one connection each, recording requests.
        async fn serve(responses: Vec<(u16, &'static str)>) -> (String, Seen) {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let base = format!("http://{}", listener.local_addr().unwrap());
            let seen: Seen = Arc::new(Mutex::new(Vec::new()));
            let log = seen.clone();

            tokio::spawn(async move {
                for (status, body) in responses {
                    let (mut socket, _) = listener.accept().await.unwrap();
                    let request = read_request(&mut socket).await;
                    log.lock().unwrap().push(request);
                    let response = format!(
                        "HTTP/1.1 {status} Stub\r\nContent-Type: application/json\r\n\
                         Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    socket.write_all(response.as_bytes()).await.unwrap();
                    let _ = socket.shutdown().await;
                }
            });
            (base, seen)
        }

        async fn read_request(socket: &mut TcpStream) -> String {
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                    let body_len = head
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if buf.len() >= end + 4 + body_len {
                        break;
                    }
                }
            }
            String::from_utf8_lossy(&buf).into_owned()
        }

        fn store_at(base: &str) -> DriveStore {
            DriveStore {
                access_token: "tok".into(),
                api_base: base.to_string(),
                upload_base: format!("{base}/upload"),
                client: reqwest::Client::builder().no_proxy().build().unwrap(),
            }
        }

        #[tokio::test]
        async fn test_list_follows_page_tokens() {
            let (base, seen) = serve(vec![
                (200, r#"{"nextPageToken":"p2","files":[{"id":"a","name":"one.jpg"}]}"#),
                (200, r#"{"files":[{"id":"b","name":"two.jpg"}]}"#),
            ])
            .await;

            let files = store_at(&base).list("folder1").await.unwrap();
            assert_eq!(
                files,
                vec![
                    FileDescriptor::new("a", "one.jpg"),
                    FileDescriptor::new("b", "two.jpg")
                ]
            );

            let seen = seen.lock().unwrap();
            assert_eq!(seen.len(), 2);
            assert!(seen[0].starts_with("GET /files?"));
            assert!(seen[0].contains("q=%27folder1%27+in+parents+and+trashed+%3D+false"));
            assert!(!seen[0].contains("pageToken"));
            assert!(seen[1].contains("pageToken=p2"));
            assert!(seen[0].to_lowercase().contains("authorization: bearer tok"));
        }

        #[tokio::test]
        async fn test_status_codes_map_to_errors() {
            let (base, _) = serve(vec![
                (403, r#"{"error":"forbidden"}"#),
                (401, r#"{"error":"expired"}"#),
                (404, r#"{"error":"missing"}"#),
                (503, r#"{"error":"busy"}"#),
            ])
            .await;
            let store = store_at(&base);

            let err = store.list("folder1").await.unwrap_err();
            assert!(matches!(err, StoreError::Auth(_)), "{err:?}");
            let err = store.download("f1").await.unwrap_err();
            assert!(matches!(err, StoreError::Auth(_)), "{err:?}");
            let err = store.download("f1").await.unwrap_err();
            assert!(matches!(err, StoreError::NotFound(_)), "{err:?}");

            let err = store
                .upload(b"x".to_vec(), "a.png", "dest", "image/png")
                .await
                .unwrap_err();
            assert!(
                matches!(err, StoreError::Request { status_code: Some(503), .. }),
                "{err:?}"
            );
            assert!(err.is_transient());
        }

        #[tokio::test]
        async fn test_download_reads_media_body() {
            let (base, seen) = serve(vec![(200, "RAWBYTES")]).await;

            let bytes = store_at(&base).download("file9").await.unwrap();
            assert_eq!(bytes, b"RAWBYTES");
            assert!(seen.lock().unwrap()[0].starts_with("GET /files/file9?alt=media"));
        }

        #[tokio::test]
        async fn test_upload_posts_multipart_and_returns_public_link() {
            let (base, seen) = serve(vec![(200, r#"{"id":"new1"}"#)]).await;

            let uploaded = store_at(&base)
                .upload(b"PNGDATA".to_vec(), "a.png_with_frame.png", "dest", "image/png")
                .await
                .unwrap();
            assert_eq!(uploaded.id, "new1");
            assert_eq!(uploaded.public_link, "https://drive.google.com/uc?id=new1");

            let seen = seen.lock().unwrap();
            let request = &seen[0];
            assert!(request.starts_with("POST /upload/files?uploadType=multipart&fields=id"));
            assert!(request.to_lowercase().contains(&format!(
                "content-type: multipart/related; boundary={MULTIPART_BOUNDARY}"
            )));
            assert!(request.contains(r#""name":"a.png_with_frame.png""#));
            assert!(request.contains(r#""parents":["dest"]"#));
            assert!(request.contains("Content-Type: image/png\r\n\r\nPNGDATA\r\n"));
        }

        #[tokio::test]
        async fn test_unparseable_listing_is_malformed() {
            let (base, _) = serve(vec![(200, "<html>oops</html>")]).await;

            let err = store_at(&base).list("folder1").await.unwrap_err();
            assert!(matches!(err, StoreError::MalformedResponse(_)), "{err:?}");
        }
    }
}
