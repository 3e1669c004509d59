use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Request, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router, ServiceExt,
};
use common::{
    protocols::web::{BatchStatus, ConvertReport},
    FALLBACK_MIME, OUTPUT_FILENAME, STATUS_DOWNLOAD_READY, STATUS_HEADER_FAILED, STATUS_SERIALIZING,
};
use tokio::sync::{watch, Mutex};
use tower::Layer;
use tower_http::{normalize_path::NormalizePathLayer, trace::TraceLayer};

use crate::batch::{self, BatchObserver, BatchState};
use crate::config::Config;
use crate::decode::ImageFile;
use crate::error::{HeaderError, Result, WebError, WebResult};

/// Multipart field every uploaded image has to arrive in.
const FILE_FIELD: &str = "file";

pub struct AppState {
    config: Config,
    // Held for a whole batch, so a second upload waits for the running one.
    batch: Mutex<Option<BatchState>>,
    status: Arc<watch::Sender<BatchStatus>>,
}

impl AppState {
    pub fn new(config: Config) -> Arc<Self> {
        let (status, _) = watch::channel(BatchStatus::default());
        Arc::new(Self {
            config,
            batch: Mutex::new(None),
            status: Arc::new(status),
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<BatchStatus> {
        self.status.subscribe()
    }

    fn set_status(&self, text: &str) {
        self.status.send_modify(|status| status.status = text.to_owned());
    }
}

/// Mirrors a running batch into the status channel.
struct StatusObserver(Arc<watch::Sender<BatchStatus>>);

impl BatchObserver for StatusObserver {
    fn on_status(&mut self, text: &str) {
        self.0.send_modify(|status| status.status = text.to_owned());
    }

    fn on_progress(&mut self, percent: f64) {
        // Receivers are only woken for whole percent steps, the value is always current.
        self.0.send_if_modified(|status| {
            let changed = status.progress_percent.floor() != percent.floor();
            status.progress_percent = percent;
            changed
        });
    }
}

#[axum::debug_handler]
async fn convert(
    State(app): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> WebResult<Json<ConvertReport>> {
    log::info!("Handling new conversion upload.");
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .context("multipart field extraction failed")?
    {
        let name = field.name().unwrap_or_default().to_owned();
        if name != FILE_FIELD {
            let message = format!("malformed multipart field '{name}'");
            return Err(WebError::bad_request(&message));
        }
        let filename = field
            .file_name()
            .context("file field without file name")?
            .to_owned();
        let mime = field.content_type().unwrap_or(FALLBACK_MIME).to_owned();
        let data = field
            .bytes()
            .await
            .context("file field bytes extraction failed")?;
        log::info!(
            "\t'{filename}' with mime type '{mime}' containing {} bytes.",
            data.len()
        );
        files.push(ImageFile::new(filename, data, mime));
    }

    // The batch runs detached from the request, a dropped connection must not lose it.
    let batch_app = Arc::clone(&app);
    let task = tokio::spawn(async move {
        let mut session = batch_app.batch.lock().await;
        batch_app.status.send_replace(BatchStatus::default());

        let observer = Box::new(StatusObserver(Arc::clone(&batch_app.status)));
        let state = batch::convert_batch(files, &batch_app.config, observer).await;
        batch_app.status.send_replace(state.status());

        let report = state.report();
        *session = Some(state);
        report
    });
    let report = task.await.context("conversion task failed")?;
    Ok(Json(report))
}

async fn status(State(app): State<Arc<AppState>>) -> Json<BatchStatus> {
    Json(app.status.borrow().clone())
}

#[axum::debug_handler]
async fn download(State(app): State<Arc<AppState>>) -> WebResult<impl IntoResponse> {
    let session = app.batch.lock().await;
    let state = session.as_ref().ok_or(HeaderError::EmptyBatch)?;

    app.set_status(STATUS_SERIALIZING);
    match state.render_header(&app.config) {
        Ok(text) => {
            app.set_status(STATUS_DOWNLOAD_READY);
            let disposition = format!("attachment; filename=\"{OUTPUT_FILENAME}\"");
            Ok((
                [
                    (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_owned()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                text,
            ))
        }
        Err(e) => {
            app.set_status(STATUS_HEADER_FAILED);
            Err(e.into())
        }
    }
}

pub fn router(app: Arc<AppState>) -> Router {
    let upload_limit = app.config.upload_limit;
    let api = Router::new()
        .route(
            "/convert",
            post(convert).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/status", get(status))
        .route(&format!("/{OUTPUT_FILENAME}"), get(download))
        .with_state(app);

    Router::new().nest("/api", api).layer(TraceLayer::new_for_http())
}

pub async fn run(app: Arc<AppState>) -> Result<()> {
    let address = app.config.address;
    // Strip trailing slashes before the router sees the request.
    let app = NormalizePathLayer::trim_trailing_slash().layer(router(app));
    let app = ServiceExt::<Request>::into_make_service(app);

    log::info!("Starting web server at {address}.");
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    axum::serve(listener, app).await.context("web server failed")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use axum::{body::Body, http::StatusCode};
    use image::{ImageFormat, Rgba, RgbaImage};
    use tower::ServiceExt as _;

    use super::*;

    const BOUNDARY: &str = "frames-test-boundary";

    fn png(color: [u8; 4]) -> Vec<u8> {
        sized_png(1, 1, color)
    }

    fn sized_png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba(color));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn multipart_body(parts: &[(&str, &str, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (filename, mime, data) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
                     Content-Type: {mime}\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload(parts: &[(&str, &str, &[u8])]) -> Request {
        axum::http::Request::builder()
            .method("POST")
            .uri("/api/convert")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request {
        axum::http::Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn upload_then_download_header() {
        let app = AppState::new(Config::default());
        let red = png([255, 0, 0, 255]);
        let blue = png([0, 0, 255, 255]);

        let response = router(app.clone())
            .oneshot(upload(&[
                ("f2.png", "image/png", &blue[..]),
                ("f1.png", "image/png", &red[..]),
            ]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let report: ConvertReport = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(report.files, ["f1.png", "f2.png"]);
        assert!(report.status.output_ready);

        let response = router(app.clone())
            .oneshot(get_request("/api/frames.h"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_owned();
        assert_eq!(disposition, "attachment; filename=\"frames.h\"");
        let text = body_text(response).await;
        assert!(text.contains("* - f1.png\n* -f2.png"));
        assert!(text.contains("{{0xF800},\n{0x001F}};"));
        assert_eq!(app.subscribe().borrow().status, STATUS_DOWNLOAD_READY);
    }

    #[tokio::test]
    async fn gif_is_reported_and_skipped() {
        let app = AppState::new(Config::default());
        let red = png([255, 0, 0, 255]);
        let response = router(app.clone())
            .oneshot(upload(&[
                ("anim.gif", "image/gif", &b"GIF89a"[..]),
                ("still.png", "image/png", &red[..]),
            ]))
            .await
            .unwrap();
        let report: ConvertReport = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(report.files, ["still.png"]);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].file, "anim.gif");
    }

    #[tokio::test]
    async fn download_without_images_is_a_conflict() {
        let app = AppState::new(Config::default());
        let response = router(app.clone())
            .oneshot(get_request("/api/frames.h"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        router(app.clone())
            .oneshot(upload(&[("notes.txt", "text/plain", &b"hello"[..])]))
            .await
            .unwrap();
        let response = router(app.clone())
            .oneshot(get_request("/api/frames.h"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(app.subscribe().borrow().status, STATUS_HEADER_FAILED);
    }

    #[tokio::test]
    async fn status_starts_out_idle() {
        let app = AppState::new(Config::default());
        let response = router(app)
            .oneshot(get_request("/api/status"))
            .await
            .unwrap();
        let status: BatchStatus = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(status, BatchStatus::default());
    }

    #[tokio::test]
    async fn unknown_field_is_rejected() {
        let app = AppState::new(Config::default());
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"other\"\r\n\r\n\
             x\r\n--{BOUNDARY}--\r\n"
        );
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/api/convert")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        let response = router(app).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn dropped_upload_still_completes_its_batch() {
        let app = AppState::new(Config::default());
        let red = png([255, 0, 0, 255]);
        router(app.clone())
            .oneshot(upload(&[("first.png", "image/png", &red[..])]))
            .await
            .unwrap();
        let response = router(app.clone())
            .oneshot(get_request("/api/frames.h"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let mut rx = app.subscribe();
        let large = sized_png(1000, 1000, [0, 255, 0, 255]);
        let request = upload(&[("second.png", "image/png", &large[..])]);
        let client = tokio::spawn(router(app.clone()).oneshot(request));
        rx.wait_for(|s| s.status.starts_with("Parsing"))
            .await
            .unwrap();
        client.abort();
        let _ = client.await;

        let response = router(app.clone())
            .oneshot(get_request("/api/frames.h"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let text = body_text(response).await;
        assert!(text.contains("* - second.png"));
        assert!(!text.contains("first.png"));
        assert_eq!(app.subscribe().borrow().status, STATUS_DOWNLOAD_READY);
    }
}
