use serde_json::json;
use uuid::Uuid;

use crate::auth::TokenService;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::AppConfig;

pub fn handle(config: &AppConfig, user_id: Uuid, email: &str, role: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let issued = TokenService::from_config(&config.security).issue(user_id, email, role)?;
    tracing::debug!(%user_id, expires_at = %issued.expires_at, "Minted token from CLI");

    output_success(
        &output_format,
        "Token issued",
        Some(json!({
            "token": issued.token,
            "expires_at": issued.expires_at,
        })),
    )
}
