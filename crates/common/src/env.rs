//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use tracing::warn;

/// Ensure the data directory exists, creating it when missing.
/// Returns an error only when creation itself fails; a pre-existing file
/// at the path is reported as an error by `create_dir_all`.
pub async fn ensure_data_dir(data_dir: &str) -> anyhow::Result<()> {
    if data_dir.trim().is_empty() {
        warn!("data directory not configured; store will run ephemeral");
        return Ok(());
    }
    tokio::fs::create_dir_all(data_dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {data_dir}: {e}"))?;
    Ok(())
}
