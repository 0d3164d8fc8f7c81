//! Shared helpers for the disk client integration tests.
//!
//! The client under test is blocking, so the mock server is driven from a
//! dedicated tokio runtime and the client is called from the plain test
//! thread.

#![allow(dead_code)]

use tokio::runtime::Runtime;
use wiremock::{Mock, MockServer, Request};

use yadisk_cli::{DiskClient, Settings};

pub const TOKEN: &str = "test-access-token";
pub const RESOURCES: &str = "/v1/disk/resources";
pub const UPLOAD: &str = "/v1/disk/resources/upload";
pub const DOWNLOAD: &str = "/v1/disk/resources/download";

pub struct TestServer {
    // Dropped first so expectations are verified while the runtime lives.
    pub server: MockServer,
    pub rt: Runtime,
}

impl TestServer {
    pub fn start() -> Self {
        let rt = Runtime::new().unwrap();
        let server = rt.block_on(MockServer::start());
        TestServer { server, rt }
    }

    pub fn mount(&self, mock: Mock) {
        self.rt.block_on(mock.mount(&self.server));
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn base_url(&self) -> String {
        format!("{}/v1/disk", self.server.uri())
    }

    pub fn settings(&self) -> Settings {
        let mut settings = Settings::with_token(TOKEN);
        settings.base_url = self.base_url();
        settings
    }

    pub fn client(&self) -> DiskClient {
        DiskClient::new(self.settings()).unwrap()
    }

    pub fn requests(&self) -> Vec<Request> {
        self.rt
            .block_on(self.server.received_requests())
            .unwrap_or_default()
    }
}

/// `METHOD path?path=...` for each received request, for order assertions.
pub fn describe(requests: &[Request]) -> Vec<String> {
    requests
        .iter()
        .map(|r| {
            let target = r
                .url
                .query_pairs()
                .find(|(k, _)| k == "path")
                .map(|(_, v)| v.into_owned())
                .unwrap_or_default();
            format!("{} {} {}", r.method, r.url.path(), target)
        })
        .collect()
}
