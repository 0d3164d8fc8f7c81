// UI layer: console handlers for the `upload`, `download` and `list`
// commands. Each handler is a thin pass-through to one `DiskClient` call
// that prints human-readable lines and turns failures into errors for
// `main` to report.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};

use crate::api::{DiskClient, DiskResponse, Listing, ResourceEntry};
use crate::error::DiskError;

/// What `upload` should send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UploadKind {
    File,
    Folder,
}

/// Check the token against the API before running a command.
pub fn ensure_access(client: &DiskClient) -> Result<()> {
    let res = client.check_access().context("Failed to reach Yandex Disk")?;
    if res.status.as_u16() != 200 {
        println!("Yandex Disk access error: {}", res.status.as_u16());
        println!("{}", res.body);
        return Err(status_error(&res, "access check failed").into());
    }
    Ok(())
}

/// Upload a local file or folder.
pub fn upload(client: &DiskClient, source: &str, destination: &str, kind: Option<UploadKind>) -> Result<()> {
    let expanded = expand_home(source);
    if !expanded.exists() {
        return Err(DiskError::LocalNotFound(expanded).into());
    }
    let source = fs::canonicalize(&expanded).unwrap_or(expanded);
    let destination = strip_quotes(destination);

    let kind = kind.unwrap_or(if source.is_dir() {
        UploadKind::Folder
    } else {
        UploadKind::File
    });

    match kind {
        UploadKind::Folder => {
            println!("Uploading folder '{}' to '{}'...", source.display(), destination);
            let pb = spinner("Uploading folder...");
            let result = client.upload_folder(&source, destination);
            pb.finish_and_clear();
            let responses = result?;

            println!("Uploaded {} items", responses.len());
            let failed: Vec<&DiskResponse> = responses
                .iter()
                .filter(|r| !r.is_success() && !r.is_existing_folder())
                .collect();
            if let Some(first) = failed.first() {
                println!("{} of {} items failed", failed.len(), responses.len());
                return Err(status_error(first, "folder upload incomplete").into());
            }
        }
        UploadKind::File => {
            println!("Uploading file '{}' to '{}'...", source.display(), destination);
            let pb = spinner("Uploading file...");
            let result = client.upload_file(&source, destination, false);
            pb.finish_and_clear();
            let res = result?;

            if res.is_success() {
                println!("File uploaded successfully!");
            } else {
                println!("Upload error: {}", res.status.as_u16());
                println!("{}", res.body);
                return Err(status_error(&res, "upload failed").into());
            }
        }
    }
    Ok(())
}

/// Download a remote file to a local destination.
pub fn download(client: &DiskClient, source: &str, destination: &str) -> Result<()> {
    let source = strip_quotes(source);
    let destination = expand_home(destination);

    println!("Downloading '{}' to '{}'...", source, destination.display());
    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let pb = spinner("Downloading...");
    let result = client.download_file(source, Some(&destination));
    pb.finish_and_clear();
    let downloaded = result?;

    println!(
        "File downloaded successfully: {} -> {} ({} bytes)",
        source,
        downloaded.path.display(),
        downloaded.bytes
    );
    Ok(())
}

/// List a remote folder; the root when `path` is empty.
pub fn list(client: &DiskClient, path: &str) -> Result<()> {
    let path = match strip_quotes(path) {
        "" => "/",
        p => p,
    };
    println!("Contents of '{}' on Yandex Disk:", path);

    match client.list_files(path)? {
        Listing::Failed { response } => {
            println!("Failed to list files: {}", response.status.as_u16());
            println!("{}", response.body);
            Err(status_error(&response, "listing failed").into())
        }
        Listing::Found { items, .. } if items.is_empty() => {
            println!("folder is empty");
            Ok(())
        }
        Listing::Found { items, .. } => {
            for item in &items {
                println!("{}", format_entry(item));
            }
            Ok(())
        }
    }
}

/// One listing line: kind, name and size.
pub fn format_entry(entry: &ResourceEntry) -> String {
    let kind = if entry.is_dir() { "dir" } else { "file" };
    let size = entry
        .size
        .map(|s| s.to_string())
        .unwrap_or_else(|| "N/A".to_string());
    format!("{:<4} {} ({} bytes)", kind, entry.name, size)
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(raw: &str) -> PathBuf {
    let raw = strip_quotes(raw);
    if raw == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(raw));
    }
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    Path::new(raw).to_path_buf()
}

/// Paths may arrive with the shell quotes still attached.
pub fn strip_quotes(raw: &str) -> &str {
    raw.trim_matches(|c| c == '"' || c == '\'')
}

fn status_error(res: &DiskResponse, what: &str) -> DiskError {
    DiskError::Status {
        status: res.status.as_u16(),
        message: what.to_string(),
    }
}

fn spinner(msg: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()));
    pb.set_message(msg);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ResourceType;

    fn entry(name: &str, resource_type: ResourceType, size: Option<u64>) -> ResourceEntry {
        ResourceEntry {
            name: name.into(),
            resource_type,
            size,
            path: None,
            mime_type: None,
            modified: None,
        }
    }

    #[test]
    fn test_format_entry() {
        assert_eq!(
            format_entry(&entry("a.txt", ResourceType::File, Some(42))),
            "file a.txt (42 bytes)"
        );
        assert_eq!(
            format_entry(&entry("photos", ResourceType::Dir, None)),
            "dir  photos (N/A bytes)"
        );
    }

    #[test]
    fn test_strip_quotes() {
        assert_eq!(strip_quotes("\"/My Docs/a b.txt\""), "/My Docs/a b.txt");
        assert_eq!(strip_quotes("'x'"), "x");
        assert_eq!(strip_quotes("plain"), "plain");
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
        assert_eq!(expand_home("rel"), PathBuf::from("rel"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/dl/a.txt"), home.join("dl/a.txt"));
            assert_eq!(expand_home("~"), home);
        }
    }
}
