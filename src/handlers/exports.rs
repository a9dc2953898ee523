use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use tracing::warn;

use crate::errors::ServiceError;
use crate::services::exports::ExportRequest;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/channel/:channel", post(export_channel_catalog))
}

/// Renders a channel catalog and streams it back as a CSV download. A copy
/// is archived under the configured export directory; a failed archive write
/// does not fail the download.
async fn export_channel_catalog(
    State(state): State<AppState>,
    Path(channel): Path<String>,
    Json(payload): Json<ExportRequest>,
) -> Result<Response, ServiceError> {
    let catalog = state
        .services
        .exporter
        .export_products(&state.db, &channel, &payload)
        .await?;

    let filename = format!(
        "{}_products_{}.csv",
        channel.to_lowercase(),
        Utc::now().format("%Y%m%d%H%M%S")
    );

    if let Err(e) = archive_copy(&state.config.export.export_dir, &filename, &catalog.bytes).await
    {
        warn!(error = %e, filename = %filename, "Failed to archive export copy");
    }

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ),
    ];
    Ok((headers, catalog.bytes).into_response())
}

async fn archive_copy(dir: &str, filename: &str, bytes: &[u8]) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(std::path::Path::new(dir).join(filename), bytes).await
}
