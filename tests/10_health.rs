mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn health_reports_database() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };

    let res = reqwest::get(server.url("/health")).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["database"], "ok");
    Ok(())
}

#[tokio::test]
async fn unknown_route_is_enveloped_404() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };

    let res = reqwest::get(format!("{}/nope", server.base_url)).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], false);
    assert!(body.get("error").is_some(), "404 should carry 'error': {}", body);
    Ok(())
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn server_process_is_reaped_on_drop() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let proc_dir = std::path::PathBuf::from(format!("/proc/{}", server.pid()));
    assert!(proc_dir.exists());

    drop(server);
    assert!(!proc_dir.exists(), "server process outlived its test");
    Ok(())
}
