//! Upload-process-download endpoint.

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use axum_extra::extract::Query;
use futures::StreamExt;
use serde::Deserialize;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

use vidforge_av::JobWorkspace;
use vidforge_common::{parse_ops, Error};

use super::error::AppError;
use super::AppContext;

/// Name of the multipart field carrying the upload.
pub const FILE_FIELD: &str = "file";

/// Repeated `op` and `ops` query keys.
#[derive(Debug, Default, Deserialize)]
pub struct ProcessParams {
    #[serde(default)]
    pub op: Vec<String>,
    #[serde(default)]
    pub ops: Vec<String>,
}

impl ProcessParams {
    /// Raw operation strings, `op` values first.
    pub fn raw_ops(&self) -> impl Iterator<Item = &str> {
        self.op.iter().chain(self.ops.iter()).map(String::as_str)
    }
}

pub fn video_routes() -> Router<AppContext> {
    Router::new()
        .route("/video/process", post(process))
        // Uploads are streamed to disk, so no in-memory cap applies.
        .layer(DefaultBodyLimit::disable())
}

async fn process(
    State(ctx): State<AppContext>,
    Query(params): Query<ProcessParams>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let started = Instant::now();
    let operations = parse_ops(params.raw_ops());

    let workspace = JobWorkspace::new(ctx.config.server.work_dir.as_deref())?;

    let mut received = None;
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Validation(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let mut file = tokio::fs::File::create(workspace.input_path()).await?;
        let mut bytes = 0u64;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| Error::Validation(format!("upload interrupted: {e}")))?
        {
            file.write_all(&chunk).await?;
            bytes += chunk.len() as u64;
        }
        file.flush().await?;
        received = Some(bytes);
        break;
    }

    let Some(bytes) = received else {
        return Err(Error::Validation(format!("missing '{FILE_FIELD}' field")).into());
    };
    tracing::info!(
        "Received upload of {} bytes in {:.2?}, {} operations",
        bytes,
        started.elapsed(),
        operations.len()
    );

    let deliverable = ctx.transcoder.run(&workspace.job(operations)).await?;

    let file = tokio::fs::File::open(&deliverable.path).await?;
    let len = file.metadata().await?.len();
    tracing::info!(
        "Job complete in {:.2?}, returning {} ({} bytes)",
        started.elapsed(),
        deliverable.file_name,
        len
    );

    // The workspace rides along with the body and is removed once the
    // stream is dropped.
    let stream = ReaderStream::new(file).map(move |chunk| {
        let _keep = &workspace;
        chunk
    });

    let disposition = format!("attachment; filename=\"{}\"", deliverable.file_name);
    let mut response = Body::from_stream(stream).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(deliverable.media_type),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok(response)
}
