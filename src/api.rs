// API client module: a small blocking HTTP client for the Yandex Disk REST
// API. Every operation is one or two synchronous round-trips; uploads and
// downloads first ask the API for a one-time transfer URL and then move the
// bytes against that URL.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use reqwest::blocking::{multipart, Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::error::{DiskError, Result};
use crate::settings::Settings;
use crate::walk::{remote_join, walk_local_tree};

/// Page size requested by [`DiskClient::list_files`]. Larger folders are
/// truncated.
pub const LIST_LIMIT: u32 = 1000;

/// Chunk size used when streaming a download to disk.
pub const DOWNLOAD_CHUNK_SIZE: usize = 8 * 1024;

const DISK_ROOT_PREFIX: &str = "disk:/";

const EXISTING_FOLDER_ERROR: &str = "DiskPathPointsToExistentDirectoryError";

/// Status code and body text of a finished API call.
#[derive(Debug, Clone)]
pub struct DiskResponse {
    pub status: StatusCode,
    pub body: String,
}

impl DiskResponse {
    fn read(res: Response) -> Result<Self> {
        let status = res.status();
        let body = res.text()?;
        Ok(DiskResponse { status, body })
    }

    /// 200 OK or 201 Created.
    pub fn is_success(&self) -> bool {
        matches!(self.status, StatusCode::OK | StatusCode::CREATED)
    }

    /// 409 from a folder create whose target is already a directory.
    pub fn is_existing_folder(&self) -> bool {
        self.status == StatusCode::CONFLICT
            && serde_json::from_str::<ApiErrorBody>(&self.body)
                .ok()
                .and_then(|b| b.error)
                .is_some_and(|e| e == EXISTING_FOLDER_ERROR)
    }
}

/// Kind of a remote resource.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    File,
    Dir,
}

/// One child of a listed folder, as found in `_embedded.items`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ResourceEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub size: Option<u64>,
    pub path: Option<String>,
    pub mime_type: Option<String>,
    pub modified: Option<String>,
}

impl ResourceEntry {
    pub fn is_dir(&self) -> bool {
        self.resource_type == ResourceType::Dir
    }
}

/// Outcome of [`DiskClient::list_files`].
#[derive(Debug)]
pub enum Listing {
    /// 200 OK with the folder's children (possibly none).
    Found {
        response: DiskResponse,
        items: Vec<ResourceEntry>,
    },
    /// Any other status; the body is left for the caller to inspect.
    Failed { response: DiskResponse },
}

impl Listing {
    pub fn response(&self) -> &DiskResponse {
        match self {
            Listing::Found { response, .. } | Listing::Failed { response } => response,
        }
    }

    /// `None` when the listing failed, `Some(&[])` for an empty folder.
    pub fn files(&self) -> Option<&[ResourceEntry]> {
        match self {
            Listing::Found { items, .. } => Some(items),
            Listing::Failed { .. } => None,
        }
    }
}

/// Result of a completed download.
#[derive(Debug, Clone)]
pub struct Downloaded {
    /// Status of the content request.
    pub status: StatusCode,
    pub path: PathBuf,
    pub bytes: u64,
}

#[derive(Deserialize)]
struct TransferLink {
    href: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct ResourceBody {
    #[serde(rename = "_embedded")]
    embedded: Option<EmbeddedItems>,
}

#[derive(Deserialize)]
struct EmbeddedItems {
    #[serde(default)]
    items: Vec<ResourceEntry>,
}

/// Blocking client for the Disk REST API. Holds the reqwest client, the
/// settings it was built from and the prepared auth headers.
#[derive(Clone)]
pub struct DiskClient {
    client: Client,
    settings: Settings,
    headers: HeaderMap,
}

impl DiskClient {
    /// Build a client. Fails with a configuration error when the token
    /// cannot be used as a header value.
    pub fn new(settings: Settings) -> Result<Self> {
        let auth = HeaderValue::from_str(&format!("OAuth {}", settings.access_token))
            .map_err(|_| DiskError::Config("access token is not a valid header value".into()))?;
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder().build()?;
        Ok(DiskClient {
            client,
            settings,
            headers,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// GET the base URL with the auth headers. 200 means the token works.
    pub fn check_access(&self) -> Result<DiskResponse> {
        debug!(url = %self.settings.base_url, "checking disk access");
        let res = self
            .client
            .get(&self.settings.base_url)
            .headers(self.headers.clone())
            .send()?;
        DiskResponse::read(res)
    }

    /// True iff the metadata endpoint answers 200 for `path`. Any other
    /// status, including server errors, reads as "does not exist".
    pub fn path_exists(&self, path: &str) -> Result<bool> {
        if path.is_empty() {
            return Ok(false);
        }
        let res = self.api_call(
            Method::GET,
            &self.settings.resources_endpoint,
            &[("path", path)],
        )?;
        Ok(res.status == StatusCode::OK)
    }

    /// Create a folder at `path` without checking whether it exists.
    pub fn create_folder(&self, path: &str) -> Result<DiskResponse> {
        self.api_call(
            Method::PUT,
            &self.settings.resources_endpoint,
            &[("path", path)],
        )
    }

    /// Create every missing folder from the root down to `path`. Returns the
    /// responses of the create calls that were issued; the first create that
    /// is neither 200 nor 201 aborts with an error.
    pub fn ensure_path_exists(&self, path: &str) -> Result<Vec<DiskResponse>> {
        let mut created = Vec::new();
        for prefix in path_prefixes(path) {
            if self.path_exists(&prefix)? {
                continue;
            }
            let res = self.create_folder(&prefix)?;
            if !res.is_success() {
                return Err(DiskError::Status {
                    status: res.status.as_u16(),
                    message: format!("failed to create folder {}: {}", prefix, res.body),
                });
            }
            debug!(path = %prefix, "created folder");
            created.push(res);
        }
        Ok(created)
    }

    /// Upload one file. A non-200 answer from the upload endpoint is returned
    /// as-is; the caller decides what to do with it.
    pub fn upload_file(
        &self,
        local_path: &Path,
        remote_path: &str,
        create_new_version: bool,
    ) -> Result<DiskResponse> {
        if create_new_version {
            return Err(DiskError::VersioningUnsupported);
        }
        if local_path.as_os_str().is_empty() {
            return Err(DiskError::MissingPath("local"));
        }
        if !local_path.exists() {
            return Err(DiskError::LocalNotFound(local_path.to_path_buf()));
        }

        let res = self.api_call(
            Method::GET,
            &self.settings.upload_endpoint,
            &[("path", remote_path), ("overwrite", "true")],
        )?;
        if res.status != StatusCode::OK {
            return Ok(res);
        }
        let href = extract_href(&res, "upload")?;

        let file = File::open(local_path)?;
        let length = file.metadata()?.len();
        let file_name = local_path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("file")
            .to_string();
        let part = multipart::Part::reader_with_length(file, length).file_name(file_name);
        let form = multipart::Form::new().part("file", part);

        debug!(local = %local_path.display(), remote = remote_path, bytes = length, "uploading file");
        let res = self.client.put(&href).multipart(form).send()?;
        DiskResponse::read(res)
    }

    /// Upload a local folder recursively. The destination root is created
    /// with [`ensure_path_exists`](Self::ensure_path_exists); every walked
    /// sub-folder is then created unconditionally and every file uploaded.
    /// Failed items do not stop the walk: all responses are returned, root
    /// creations first, then items in walk order.
    pub fn upload_folder(&self, local_folder: &Path, remote_folder: &str) -> Result<Vec<DiskResponse>> {
        if local_folder.as_os_str().is_empty() {
            return Err(DiskError::MissingPath("local folder"));
        }
        if !local_folder.is_dir() {
            return Err(DiskError::NotADirectory(local_folder.to_path_buf()));
        }

        let mut responses = self.ensure_path_exists(remote_folder)?;
        for entry in walk_local_tree(local_folder)? {
            let remote = remote_join(remote_folder, &entry.relative);
            let res = if entry.is_dir {
                self.create_folder(&remote)?
            } else {
                self.upload_file(&local_folder.join(&entry.relative), &remote, false)?
            };
            if !res.is_success() {
                warn!(remote = %remote, status = res.status.as_u16(), "folder item failed");
            }
            responses.push(res);
        }
        Ok(responses)
    }

    /// Download `remote_path` to `local_path`, or to the remote base name in
    /// the working directory. Every failure is logged and returned as an
    /// error.
    pub fn download_file(&self, remote_path: &str, local_path: Option<&Path>) -> Result<Downloaded> {
        self.try_download(remote_path, local_path).map_err(|e| {
            error!(remote = remote_path, error = %e, "download failed");
            e
        })
    }

    fn try_download(&self, remote_path: &str, local_path: Option<&Path>) -> Result<Downloaded> {
        if remote_path.is_empty() {
            return Err(DiskError::MissingPath("remote"));
        }

        let res = self.api_call(
            Method::GET,
            &self.settings.download_endpoint,
            &[("path", remote_path)],
        )?;
        if res.status != StatusCode::OK {
            return Err(DiskError::Status {
                status: res.status.as_u16(),
                message: format!("Yandex Disk returned an error: {}", api_error_message(&res.body)),
            });
        }
        let href = extract_href(&res, "download")?;

        let content = self.client.get(&href).send()?;
        let status = content.status();
        if status != StatusCode::OK {
            return Err(DiskError::Status {
                status: status.as_u16(),
                message: "failed to fetch file content".into(),
            });
        }

        let dest = match local_path {
            Some(p) => p.to_path_buf(),
            None => default_download_path(remote_path)?,
        };
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let bytes = stream_to_file(content, &dest)?;

        info!(remote = remote_path, local = %dest.display(), bytes, "file downloaded");
        Ok(Downloaded {
            status,
            path: dest,
            bytes,
        })
    }

    /// List the children of `remote_path` (empty string for the root), up
    /// to [`LIST_LIMIT`] entries.
    pub fn list_files(&self, remote_path: &str) -> Result<Listing> {
        let limit = LIST_LIMIT.to_string();
        let response = self.api_call(
            Method::GET,
            &self.settings.resources_endpoint,
            &[("path", remote_path), ("limit", &limit)],
        )?;
        if response.status != StatusCode::OK {
            return Ok(Listing::Failed { response });
        }

        let body: ResourceBody = serde_json::from_str(&response.body)?;
        let items = body.embedded.map(|e| e.items).unwrap_or_default();
        Ok(Listing::Found { response, items })
    }

    /// Authenticated call against one of the API endpoints.
    fn api_call(&self, method: Method, endpoint: &str, query: &[(&str, &str)]) -> Result<DiskResponse> {
        let url = format!("{}{}", self.settings.base_url, endpoint);
        debug!(%method, %url, ?query, "api request");
        let res = self
            .client
            .request(method, &url)
            .headers(self.headers.clone())
            .query(query)
            .send()?;
        let response = DiskResponse::read(res)?;
        debug!(status = response.status.as_u16(), "api response");
        Ok(response)
    }
}

/// Accumulated prefixes of `path`, root first: `/a/b` gives `/a`, `/a/b`.
fn path_prefixes(path: &str) -> Vec<String> {
    let (root, rest) = if let Some(rest) = path.strip_prefix(DISK_ROOT_PREFIX) {
        (DISK_ROOT_PREFIX, rest)
    } else if let Some(rest) = path.strip_prefix('/') {
        ("/", rest)
    } else {
        ("", path)
    };

    let mut prefixes = Vec::new();
    let mut current = String::from(root);
    for segment in rest.split('/').filter(|s| !s.is_empty()) {
        if !current.is_empty() && !current.ends_with('/') {
            current.push('/');
        }
        current.push_str(segment);
        prefixes.push(current.clone());
    }
    prefixes
}

fn extract_href(res: &DiskResponse, purpose: &'static str) -> Result<String> {
    let link: TransferLink = serde_json::from_str(&res.body)?;
    link.href
        .filter(|h| !h.is_empty())
        .ok_or(DiskError::MissingHref(purpose))
}

fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| "error".to_string())
}

fn default_download_path(remote_path: &str) -> Result<PathBuf> {
    let trimmed = remote_path.trim_end_matches('/');
    let name = trimmed
        .rsplit('/')
        .next()
        .map(|n| n.strip_prefix("disk:").unwrap_or(n))
        .unwrap_or_default();
    if name.is_empty() {
        return Err(DiskError::MissingPath("local"));
    }
    Ok(PathBuf::from(name))
}

fn stream_to_file<R: Read>(mut reader: R, dest: &Path) -> Result<u64> {
    let mut file = File::create(dest)?;
    let mut buf = [0u8; DOWNLOAD_CHUNK_SIZE];
    let mut written = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        file.write_all(&buf[..n])?;
        written += n as u64;
    }
    file.flush()?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> DiskResponse {
        DiskResponse {
            status: StatusCode::from_u16(status).unwrap(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_path_prefixes() {
        assert!(path_prefixes("").is_empty());
        assert!(path_prefixes("/").is_empty());
        assert_eq!(path_prefixes("a/b/c"), vec!["a", "a/b", "a/b/c"]);
        assert_eq!(path_prefixes("/x//y/"), vec!["/x", "/x/y"]);
        assert_eq!(path_prefixes("disk:/photos/2024"), vec!["disk:/photos", "disk:/photos/2024"]);
    }

    #[test]
    fn test_extract_href() {
        let ok = response(200, r#"{"href":"https://upload.example/abc","method":"PUT"}"#);
        assert_eq!(extract_href(&ok, "upload").unwrap(), "https://upload.example/abc");

        let missing = response(200, r#"{"method":"PUT"}"#);
        assert!(matches!(extract_href(&missing, "upload"), Err(DiskError::MissingHref("upload"))));

        let empty = response(200, r#"{"href":""}"#);
        assert!(matches!(extract_href(&empty, "download"), Err(DiskError::MissingHref("download"))));
    }

    #[test]
    fn test_api_error_message() {
        assert_eq!(
            api_error_message(r#"{"message":"Resource not found.","error":"DiskNotFoundError"}"#),
            "Resource not found."
        );
        assert_eq!(api_error_message("<html>"), "error");
        assert_eq!(api_error_message("{}"), "error");
    }

    #[test]
    fn test_is_existing_folder() {
        let exists = response(
            409,
            r#"{"message":"Resource already exists.","error":"DiskPathPointsToExistentDirectoryError"}"#,
        );
        assert!(exists.is_existing_folder());
        assert!(!exists.is_success());

        let missing_parent = response(409, r#"{"error":"DiskPathDoesntExistsError"}"#);
        assert!(!missing_parent.is_existing_folder());
        assert!(!response(409, "not json").is_existing_folder());
        assert!(!response(201, "{}").is_existing_folder());
    }

    #[test]
    fn test_default_download_path() {
        assert_eq!(default_download_path("/docs/report.pdf").unwrap(), PathBuf::from("report.pdf"));
        assert_eq!(default_download_path("disk:/a.txt").unwrap(), PathBuf::from("a.txt"));
        assert_eq!(default_download_path("plain").unwrap(), PathBuf::from("plain"));
        assert!(default_download_path("/").is_err());
    }

    #[test]
    fn test_resource_body_parsing() {
        let body: ResourceBody = serde_json::from_str(
            r#"{"name":"docs","type":"dir","_embedded":{"items":[
                {"name":"a.txt","type":"file","size":12,"path":"disk:/docs/a.txt","mime_type":"text/plain"},
                {"name":"sub","type":"dir","path":"disk:/docs/sub"}
            ],"limit":1000,"offset":0,"total":2}}"#,
        )
        .unwrap();
        let items = body.embedded.unwrap().items;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].size, Some(12));
        assert!(!items[0].is_dir());
        assert!(items[1].is_dir());
        assert_eq!(items[1].size, None);

        let file_body: ResourceBody = serde_json::from_str(r#"{"name":"a.txt","type":"file"}"#).unwrap();
        assert!(file_body.embedded.is_none());
    }

    #[test]
    fn test_listing_accessors() {
        let found = Listing::Found {
            response: response(200, "{}"),
            items: Vec::new(),
        };
        assert_eq!(found.files().map(<[ResourceEntry]>::len), Some(0));

        let failed = Listing::Failed {
            response: response(404, "{}"),
        };
        assert!(failed.files().is_none());
        assert_eq!(failed.response().status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_stream_to_file_copies_all_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.bin");
        let data: Vec<u8> = (0..17_000u32).map(|i| (i % 251) as u8).collect();
        let written = stream_to_file(io::Cursor::new(data.clone()), &dest).unwrap();
        assert_eq!(written, 17_000);
        assert_eq!(fs::read(&dest).unwrap(), data);
    }

    #[test]
    fn test_invalid_token_is_config_error() {
        let err = DiskClient::new(Settings::with_token("bad\ntoken")).err().unwrap();
        assert!(matches!(err, DiskError::Config(_)));
    }
}
