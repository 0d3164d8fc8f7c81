// Library root
// -----------
// The crate exposes a small library surface for the `yadisk` binary.
//
// Module responsibilities:
// - `api`: the blocking Disk REST client (access check, listing, uploads,
//   downloads).
// - `settings`: `YANDEX_*` configuration from an env file and the process
//   environment.
// - `walk`: local folder traversal used by folder uploads.
// - `error`: the error taxonomy shared by all of the above.
// - `ui`: console handlers used by `main.rs`.
pub mod api;
pub mod error;
pub mod settings;
pub mod ui;
pub mod walk;

pub use api::{DiskClient, DiskResponse, Downloaded, Listing, ResourceEntry, ResourceType};
pub use error::{DiskError, ErrorKind, Result};
pub use settings::Settings;
