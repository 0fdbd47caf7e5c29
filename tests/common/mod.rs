use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

/// A server process owned by one test; killed and reaped on drop.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn(overrides: &[(&str, &str)]) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_godplan-api"));
        cmd.arg("serve")
            .env("PORT", port.to_string())
            .env("DB_AUTO_MIGRATE", "true")
            .envs(overrides.iter().copied())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit());

        // Inherit environment so the server sees DATABASE_URL and JWT_SECRET
        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/api/v1/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    #[allow(dead_code)]
    pub fn pid(&self) -> u32 {
        self.child.id()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Start a server for this test, or `None` when no database is configured.
pub async fn ensure_server() -> Result<Option<TestServer>> {
    ensure_server_with(&[]).await
}

/// Like [`ensure_server`], with extra environment for the server process.
pub async fn ensure_server_with(overrides: &[(&str, &str)]) -> Result<Option<TestServer>> {
    let _ = dotenvy::dotenv();
    if std::env::var("DATABASE_URL").is_err() && std::env::var("DB_HOST").is_err() {
        eprintln!("skipping: DATABASE_URL is not set");
        return Ok(None);
    }

    let server = TestServer::spawn(overrides)?;
    server.wait_ready(Duration::from_secs(20)).await?;
    Ok(Some(server))
}

/// Register a fresh user in `tenant` and return its bearer token.
#[allow(dead_code)]
pub async fn register(server: &TestServer, client: &reqwest::Client, tenant: &str) -> Result<String> {
    let suffix = &uuid::Uuid::new_v4().simple().to_string()[..8];
    let res = client
        .post(server.url("/auth/register"))
        .header("X-Tenant-ID", tenant)
        .json(&json!({
            "username": format!("user_{suffix}"),
            "full_name": "Integration User",
            "email": format!("user_{suffix}@example.test"),
            "password": "P@ssword12",
        }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "register failed: {}", res.status());

    let body = res.json::<Value>().await?;
    body["data"]["token"]
        .as_str()
        .map(str::to_string)
        .context("register response carries no token")
}

/// A random tenant id in canonical UUID form.
#[allow(dead_code)]
pub fn tenant_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
