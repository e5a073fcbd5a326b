//! Router-level tests driven through `tower::ServiceExt::oneshot`.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use medphase_core::config::ConfigSchema;
use medphase_server::{app, AppState};
use serde_json::Value;
use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

const BOUNDARY: &str = "medphase-test-boundary";

/// One part of a hand-built multipart body.
enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                filename,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, filename, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn process_request(parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/process")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn encode(img: RgbImage, format: ImageOutputFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img).write_to(&mut out, format).unwrap();
    out.into_inner()
}

fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let v = 110 + ((x * 7 + y * 13) % 21) as u8;
        Rgb([v, v.saturating_sub(10), v.saturating_add(5)])
    });
    encode(img, ImageOutputFormat::Png)
}

fn gray_jpeg(width: u32, height: u32) -> Vec<u8> {
    encode(
        RgbImage::from_pixel(width, height, Rgb([128, 128, 128])),
        ImageOutputFormat::Jpeg(90),
    )
}

fn router() -> Router {
    app(AppState::default())
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Log sink shared between the subscriber and the test.
#[derive(Clone, Default)]
struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl CaptureWriter {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

/// Send one request with an INFO-level subscriber installed on this thread.
async fn send_capturing_logs(router: Router, request: Request<Body>) -> (StatusCode, String) {
    let sink = CaptureWriter::default();
    let writer = sink.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let response = router.oneshot(request).await.unwrap();
    (response.status(), sink.contents())
}

#[tokio::test]
async fn test_root_describes_service() {
    let response = router()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "online");
    assert!(json["endpoints"]["/process"].is_string());
    assert_eq!(json["phases"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_health_reports_versions() {
    let response = router()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["image_version_req"], medphase_image::CODEC_VERSION_REQ);
    assert!(json["metrics"]["counters"].is_object());
}

#[tokio::test]
async fn test_arterial_png_round_trip() {
    let png = sample_png(64, 48);
    let request = process_request(&[
        Part::File {
            name: "image",
            filename: "scan.png",
            content_type: "image/png",
            data: &png,
        },
        Part::Text("phase", "arterial"),
    ]);

    let response = router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "image/png");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "inline; filename=\"processed_scan.png\""
    );
    assert_eq!(headers["x-processing-phase"], "arterial");

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let out = image::load_from_memory(&bytes).unwrap();
    assert_eq!((out.width(), out.height()), (64, 48));
}

#[tokio::test]
async fn test_venous_jpeg_stays_flat() {
    let jpeg = gray_jpeg(40, 40);
    let request = process_request(&[
        Part::Text("phase", "venous"),
        Part::File {
            name: "image",
            filename: "ct.jpg",
            content_type: "image/jpeg",
            data: &jpeg,
        },
    ]);

    let response = router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-processing-phase"], "venous");

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let out = image::load_from_memory(&bytes).unwrap().to_rgb8();
    assert_eq!(out.dimensions(), (40, 40));
    for px in out.pixels() {
        for c in px.0 {
            assert!(c.abs_diff(128) <= 2, "{px:?}");
        }
    }
}

#[tokio::test]
async fn test_unknown_phase_is_rejected() {
    let png = sample_png(8, 8);
    let request = process_request(&[
        Part::File {
            name: "image",
            filename: "scan.png",
            content_type: "image/png",
            data: &png,
        },
        Part::Text("phase", "capillary"),
    ]);

    let response = router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["detail"], "Invalid phase. Must be 'arterial' or 'venous'");
}

#[tokio::test]
async fn test_unknown_phase_wins_over_corrupt_bytes() {
    let request = process_request(&[
        Part::File {
            name: "image",
            filename: "broken.png",
            content_type: "image/png",
            data: b"\x89PNG\r\n\x1a\nthis is not a real png",
        },
        Part::Text("phase", "capillary"),
    ]);

    let response = router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["code"], "E4001");
}

#[tokio::test]
async fn test_non_image_upload_is_rejected() {
    let request = process_request(&[
        Part::File {
            name: "image",
            filename: "notes.txt",
            content_type: "text/plain",
            data: b"not an image",
        },
        Part::Text("phase", "venous"),
    ]);

    let response = router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["detail"], "File must be an image (JPG/PNG)");
}

#[tokio::test]
async fn test_corrupt_image_is_client_error() {
    let request = process_request(&[
        Part::File {
            name: "image",
            filename: "broken.png",
            content_type: "image/png",
            data: b"\x89PNG\r\n\x1a\nthis is not a real png",
        },
        Part::Text("phase", "arterial"),
    ]);

    let response = router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["code"], "E5001");
}

#[tokio::test]
async fn test_missing_phase_is_rejected() {
    let png = sample_png(8, 8);
    let request = process_request(&[Part::File {
        name: "image",
        filename: "scan.png",
        content_type: "image/png",
        data: &png,
    }]);

    let response = router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_image_is_rejected() {
    let request = process_request(&[Part::Text("phase", "arterial")]);

    let response = router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let mut schema = ConfigSchema::default();
    schema.server.max_upload_bytes = 1024;
    let payload = vec![0x5au8; 8 * 1024];

    let request = process_request(&[
        Part::Text("phase", "venous"),
        Part::File {
            name: "image",
            filename: "big.png",
            content_type: "image/png",
            data: &payload,
        },
    ]);

    let response = app(AppState::new(schema)).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_cors_preflight_allows_any_origin_by_default() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/process")
        .header(header::ORIGIN, "https://viewer.example.org")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn test_cors_respects_configured_origins() {
    let mut schema = ConfigSchema::default();
    schema.cors.allowed_origins = vec!["https://*.github.io".to_string()];
    let router = app(AppState::new(schema));

    let allowed = Request::get("/")
        .header(header::ORIGIN, "https://medphase.github.io")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(allowed).await.unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://medphase.github.io"
    );

    let denied = Request::get("/")
        .header(header::ORIGIN, "https://evil.example.com")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(denied).await.unwrap();
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[tokio::test]
async fn test_missing_image_is_logged_with_code_and_phase() {
    let request = process_request(&[Part::Text("phase", "arterial")]);

    let (status, logs) = send_capturing_logs(router(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(logs.contains("Process request rejected"), "{logs}");
    assert!(logs.contains("E4003"), "{logs}");
    assert!(logs.contains("arterial"), "{logs}");
}

#[tokio::test]
async fn test_decode_failure_is_logged_with_upload_details() {
    let data = b"\x89PNG\r\n\x1a\nthis is not a real png";
    let request = process_request(&[
        Part::Text("phase", "venous"),
        Part::File {
            name: "image",
            filename: "broken.png",
            content_type: "image/png",
            data,
        },
    ]);

    let (status, logs) = send_capturing_logs(router(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(logs.contains("E5001"), "{logs}");
    assert!(logs.contains("venous"), "{logs}");
    assert!(logs.contains("broken.png"), "{logs}");
    assert!(logs.contains(&format!("size_bytes={}", data.len())), "{logs}");
}

#[tokio::test]
async fn test_oversized_body_is_logged() {
    let mut schema = ConfigSchema::default();
    schema.server.max_upload_bytes = 1024;
    let payload = vec![0x5au8; 8 * 1024];
    let request = process_request(&[
        Part::Text("phase", "venous"),
        Part::File {
            name: "image",
            filename: "big.png",
            content_type: "image/png",
            data: &payload,
        },
    ]);

    let (status, logs) = send_capturing_logs(app(AppState::new(schema)), request).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(logs.contains("E4005"), "{logs}");
    assert!(logs.contains("status=413"), "{logs}");
}
