//! `POST /process`

use crate::cors::PHASE_HEADER;
use crate::{ApiError, AppState};
use axum::body::Bytes;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use medphase_core::Error;
use medphase_image::{processed_filename, Phase, ProcessedImage};
use medphase_telemetry::{metrics, Timer};
use std::any::Any;

/// The file part of the form.
#[derive(Debug)]
struct Upload {
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Bytes,
}

/// Parts of the multipart form we care about, before validation.
#[derive(Debug, Default)]
struct ProcessForm {
    phase: Option<String>,
    image: Option<Upload>,
}

/// What is known about a request so far, for the failure log line.
#[derive(Debug, Default)]
struct RequestLog {
    phase: Option<String>,
    filename: Option<String>,
    size_bytes: Option<usize>,
}

/// Handle an upload: validate, run the pipeline off the async runtime,
/// answer with PNG bytes.
pub async fn process_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    metrics().increment("requests.process");
    let limit = state.config().server.max_upload_bytes;

    let mut log = RequestLog::default();
    let result = handle(multipart, limit, &mut log).await;
    match &result {
        Ok(_) => metrics().increment("responses.process.ok"),
        Err(err) => {
            log_failure(err, &log);
            if err.0.code.is_client_error() {
                metrics().increment("responses.process.client_error")
            } else {
                metrics().increment("responses.process.server_error")
            }
        }
    }
    result
}

fn log_failure(err: &ApiError, log: &RequestLog) {
    let code = err.code();
    let status = err.status().as_u16();
    let phase = log.phase.as_deref();
    let filename = log.filename.as_deref();
    let detail = err.0.message.as_str();

    if err.0.code.is_client_error() {
        tracing::warn!(%code, status, phase, filename, size_bytes = log.size_bytes, detail, "Process request rejected");
    } else {
        tracing::error!(%code, status, phase, filename, size_bytes = log.size_bytes, detail, "Process request failed");
    }
}

async fn handle(
    multipart: Result<Multipart, MultipartRejection>,
    limit: usize,
    log: &mut RequestLog,
) -> Result<Response, ApiError> {
    let multipart =
        multipart.map_err(|rejection| Error::malformed_request(rejection.body_text()))?;
    let form = read_form(multipart, limit, log).await?;

    // Validation happens before any pixel work.
    let raw_phase = form.phase.ok_or_else(|| Error::missing_field("phase"))?;
    let upload = form.image.ok_or_else(|| Error::missing_field("image"))?;
    tracing::info!(phase = %raw_phase, "Processing request received");

    let phase: Phase = raw_phase.parse().map_err(|_| Error::invalid_phase())?;

    let is_image = upload
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.trim().to_ascii_lowercase().starts_with("image/"));
    if !is_image {
        let content_type = upload.content_type.as_deref().unwrap_or("<none>");
        return Err(Error::unsupported_media_type()
            .with_context(format!("Uploaded content type: {}", content_type))
            .into());
    }

    tracing::info!(
        filename = upload.file_name.as_deref().unwrap_or("<none>"),
        size_bytes = upload.bytes.len(),
        "File received"
    );

    metrics().increment(&format!("requests.process.{}", phase));
    let timer = Timer::start(format!("process.{}.duration_ms", phase));
    let bytes = upload.bytes;
    let outcome = tokio::task::spawn_blocking(move || medphase_image::process(&bytes, phase)).await;
    timer.stop();

    let output = match outcome {
        Ok(Ok(output)) => output,
        Ok(Err(err)) => return Err(err.into()),
        Err(join_err) => {
            let reason = if join_err.is_panic() {
                panic_message(join_err.into_panic())
            } else {
                join_err.to_string()
            };
            return Err(Error::internal(format!("Error processing image: {}", reason)).into());
        }
    };

    png_response(output, upload.file_name.as_deref())
}

/// Drain the multipart stream, keeping the `phase` and `image` parts.
async fn read_form(
    mut multipart: Multipart,
    limit: usize,
    log: &mut RequestLog,
) -> Result<ProcessForm, ApiError> {
    let mut form = ProcessForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        match field.name() {
            Some("phase") => {
                let text = field.text().await.map_err(|e| multipart_error(e, limit))?;
                log.phase = Some(text.clone());
                form.phase = Some(text);
            }
            Some("image") => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                log.filename = file_name.clone();
                let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
                log.size_bytes = Some(bytes.len());
                form.image = Some(Upload {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            _ => {}
        }
    }

    Ok(form)
}

fn multipart_error(err: MultipartError, limit: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::payload_too_large(limit).into()
    } else {
        Error::malformed_request(format!("Malformed multipart body: {}", err.body_text())).into()
    }
}

fn png_response(output: ProcessedImage, original_name: Option<&str>) -> Result<Response, ApiError> {
    let disposition = format!("inline; filename=\"{}\"", processed_filename(original_name));
    let disposition = HeaderValue::from_str(&disposition)
        .map_err(|e| Error::internal(format!("Error processing image: {}", e)))?;

    let headers = [
        (CONTENT_TYPE, HeaderValue::from_static("image/png")),
        (CONTENT_DISPOSITION, disposition),
        (
            HeaderName::from_static(PHASE_HEADER),
            HeaderValue::from_static(output.phase.as_str()),
        ),
    ];

    Ok((StatusCode::OK, headers, output.png).into_response())
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "internal fault".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message() {
        assert_eq!(panic_message(Box::new("boom")), "boom");
        assert_eq!(panic_message(Box::new(String::from("bang"))), "bang");
        assert_eq!(panic_message(Box::new(42u8)), "internal fault");
    }

    #[test]
    fn test_png_response_headers() {
        let output = ProcessedImage {
            png: vec![0x89, b'P', b'N', b'G'],
            width: 1,
            height: 1,
            phase: Phase::Venous,
            source_format: medphase_image::ImageFormat::Jpeg,
        };
        let response = png_response(output, Some("uploads/ct.jpg")).unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[CONTENT_TYPE], "image/png");
        assert_eq!(headers[CONTENT_DISPOSITION], "inline; filename=\"processed_ct.jpg\"");
        assert_eq!(headers[PHASE_HEADER], "venous");
    }
}
