#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output};

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Isolated HOME and data directory pointed at a mock API.
pub struct Sandbox {
    home: TempDir,
    api_url: String,
}

impl Sandbox {
    pub fn new(server: &MockServer) -> Self {
        Self::at(&format!("http://127.0.0.1:{}", server.address().port()))
    }

    pub fn at(api_url: &str) -> Self {
        Self {
            home: TempDir::new().expect("Failed to create temp dir"),
            api_url: api_url.to_string(),
        }
    }

    /// Run the CLI binary with arguments.
    pub async fn run(&self, args: &[&str]) -> Output {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_magicstream"));
        cmd.args(args);
        cmd.env("HOME", self.home.path());
        cmd.env("XDG_DATA_HOME", self.home.path().join("data"));
        cmd.env("MAGICSTREAM_API_URL", &self.api_url);
        cmd.env("NO_COLOR", "1");
        cmd.env_remove("RUST_LOG");

        tokio::task::spawn_blocking(move || cmd.output().expect("Failed to execute CLI"))
            .await
            .unwrap()
    }

    /// Run the CLI and expect success.
    pub async fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args).await;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    /// Run the CLI and expect failure.
    pub async fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args).await;
        if output.status.success() {
            panic!("CLI command should have failed: {:?}", args);
        }
        String::from_utf8_lossy(&output.stderr).to_string()
    }

    /// Session file location on Linux.
    pub fn session_file(&self) -> PathBuf {
        self.home
            .path()
            .join("data")
            .join("magicstream")
            .join("session.json")
    }

    pub async fn login(&self) {
        self.run_success(&[
            "login",
            "--email",
            "alice@example.com",
            "--password",
            "secret123",
        ])
        .await;
    }
}

/// Mount a login endpoint that sets the refresh cookie.
pub async fn mount_login(server: &MockServer, role: &str) {
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "refresh_token=abc; Path=/; HttpOnly")
                .set_body_json(json!({
                    "user_id": "u-1",
                    "email": "alice@example.com",
                    "first_name": "Alice",
                    "last_name": "Liddell",
                    "role": role,
                    "favourite_genres": [{"genre_id": 2, "genre_name": "Drama"}]
                })),
        )
        .mount(server)
        .await;
}
