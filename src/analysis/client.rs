use std::{
    task::{Context, Poll},
    time::Duration,
};

use futures::future::BoxFuture;
use reqwest::multipart::{Form, Part};
use tower::{util::BoxCloneService, BoxError, Service, ServiceBuilder};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analysis::model::AnalysisResult;
use crate::config::ServiceSettings;
use crate::error::AnalyzeError;
use crate::media::VideoAsset;

const VIDEO_FIELD: &str = "video";
const VIDEO_FILE_NAME: &str = "video.mp4";
const VIDEO_MIME: &str = "video/mp4";

/// The boxed analysis stack handed to the session.
pub type AnalysisService = BoxCloneService<VideoAsset, AnalysisResult, AnalyzeError>;

/// Uploads a video to the pose service and decodes the per-frame analysis.
#[derive(Clone)]
pub struct AnalysisClient {
    http: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl AnalysisClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, AnalyzeError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    pub fn from_settings(settings: &ServiceSettings) -> Result<Self, AnalyzeError> {
        Self::new(
            settings.endpoint.clone(),
            Duration::from_millis(settings.timeout_ms),
        )
    }
}

impl Service<VideoAsset> for AnalysisClient {
    type Response = AnalysisResult;
    type Error = AnalyzeError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, asset: VideoAsset) -> Self::Future {
        let http = self.http.clone();
        let endpoint = self.endpoint.clone();
        let timeout_ms = self.timeout.as_millis() as u64;
        Box::pin(async move { upload(http, endpoint, timeout_ms, asset).await })
    }
}

async fn upload(
    http: reqwest::Client,
    endpoint: String,
    timeout_ms: u64,
    asset: VideoAsset,
) -> Result<AnalysisResult, AnalyzeError> {
    let request_id = Uuid::new_v4();
    let bytes = tokio::fs::read(asset.uri())
        .await
        .map_err(|source| AnalyzeError::ReadVideo {
            path: asset.to_string(),
            source,
        })?;
    debug!(%request_id, "Read {} bytes from {}", bytes.len(), asset);

    let part = Part::bytes(bytes)
        .file_name(VIDEO_FILE_NAME)
        .mime_str(VIDEO_MIME)
        .map_err(|e| AnalyzeError::Request(e.to_string()))?;
    let form = Form::new().part(VIDEO_FIELD, part);

    info!(%request_id, "Uploading {} to {}", asset, endpoint);
    let response = http
        .post(&endpoint)
        .multipart(form)
        .send()
        .await
        .map_err(|e| classify(e, timeout_ms))?;

    let status = response.status();
    if !status.is_success() {
        warn!(%request_id, "Pose service answered {}", status);
        return Err(AnalyzeError::Status {
            status: status.as_u16(),
        });
    }

    let body = response.bytes().await.map_err(|e| classify(e, timeout_ms))?;
    let result = AnalysisResult::from_slice(&body)?;
    info!(
        %request_id,
        "Received analysis for {} frames (most frequent landing: {:?})",
        result.frame_count(),
        result.most_frequent_landing_type
    );
    Ok(result)
}

fn classify(error: reqwest::Error, timeout_ms: u64) -> AnalyzeError {
    if error.is_timeout() {
        AnalyzeError::Timeout(timeout_ms)
    } else {
        AnalyzeError::Transport(error)
    }
}

fn from_boxed(error: BoxError, timeout_ms: u64) -> AnalyzeError {
    if error.is::<tower::timeout::error::Elapsed>() {
        return AnalyzeError::Timeout(timeout_ms);
    }
    match error.downcast::<AnalyzeError>() {
        Ok(error) => *error,
        Err(error) => AnalyzeError::Interrupted(error.to_string()),
    }
}

/// Builds the client wrapped in a timeout layer that bounds the whole call,
/// including reading the video from disk.
pub fn create_analysis_service(settings: &ServiceSettings) -> Result<AnalysisService, AnalyzeError> {
    let client = AnalysisClient::from_settings(settings)?;
    let timeout_ms = settings.timeout_ms;

    let service = ServiceBuilder::new()
        .map_err(move |error: BoxError| from_boxed(error, timeout_ms))
        .timeout(Duration::from_millis(timeout_ms))
        .service(client);
    Ok(BoxCloneService::new(service))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;
    use tower::ServiceExt;

    fn write_video() -> PathBuf {
        let path = std::env::temp_dir().join(format!("strideview-{}.mp4", Uuid::new_v4()));
        std::fs::write(&path, b"\x00\x00\x00\x18ftypmp42 fake video").unwrap();
        path
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack
            .windows(needle.len())
            .position(|window| window == needle)
    }

    async fn read_request(socket: &mut TcpStream) -> Vec<u8> {
        let mut buffer = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buffer.extend_from_slice(&chunk[..n]);
            if let Some(header_end) = find(&buffer, b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&buffer[..header_end]).to_lowercase();
                let content_length = headers
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|value| value.trim().parse::<usize>().ok());
                let complete = match content_length {
                    Some(len) => buffer.len() >= header_end + 4 + len,
                    None => buffer.ends_with(b"0\r\n\r\n"),
                };
                if complete {
                    break;
                }
            }
        }
        buffer
    }

    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&request).to_lowercase()
        });
        (format!("http://{}/detect_pose", addr), handle)
    }

    #[tokio::test]
    async fn uploads_video_as_single_multipart_field() {
        let (endpoint, server) =
            serve_once("200 OK", r#"{"vertical_bounces": [0.01, 0.2]}"#).await;
        let video = write_video();
        let mut client = AnalysisClient::new(endpoint, Duration::from_secs(5)).unwrap();

        let result = client
            .ready()
            .await
            .unwrap()
            .call(VideoAsset::new(&video))
            .await
            .unwrap();
        let request = server.await.unwrap();

        assert!(request.starts_with("post /detect_pose http/1.1"));
        assert!(request.contains("content-type: multipart/form-data; boundary="));
        assert!(request.contains("name=\"video\"; filename=\"video.mp4\""));
        assert!(request.contains("content-type: video/mp4"));
        assert!(request.contains("fake video"));
        assert_eq!(result.vertical_bounces, vec![0.01, 0.2]);
        assert!(result.hipdrop_analysis.is_empty());
        let _ = std::fs::remove_file(video);
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let (endpoint, server) = serve_once("500 Internal Server Error", r#"{"error": "boom"}"#).await;
        let video = write_video();
        let mut client = AnalysisClient::new(endpoint, Duration::from_secs(5)).unwrap();

        let error = client.call(VideoAsset::new(&video)).await.unwrap_err();
        let _ = server.await;
        assert!(matches!(error, AnalyzeError::Status { status: 500 }));
        let _ = std::fs::remove_file(video);
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let (endpoint, server) = serve_once("200 OK", "not json").await;
        let video = write_video();
        let mut client = AnalysisClient::new(endpoint, Duration::from_secs(5)).unwrap();

        let error = client.call(VideoAsset::new(&video)).await.unwrap_err();
        let _ = server.await;
        assert!(matches!(error, AnalyzeError::Decode(_)));
        let _ = std::fs::remove_file(video);
    }

    #[tokio::test]
    async fn unreadable_video_fails_before_connecting() {
        let mut client =
            AnalysisClient::new("http://127.0.0.1:9/detect_pose", Duration::from_secs(1)).unwrap();
        let missing = std::env::temp_dir().join(format!("missing-{}.mp4", Uuid::new_v4()));

        let error = client.call(VideoAsset::new(missing)).await.unwrap_err();
        assert!(matches!(error, AnalyzeError::ReadVideo { .. }));
    }

    #[tokio::test]
    async fn stalled_service_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });
        let settings = ServiceSettings {
            endpoint: format!("http://{}/detect_pose", addr),
            timeout_ms: 200,
        };
        let video = write_video();
        let service = create_analysis_service(&settings).unwrap();

        let error = service.oneshot(VideoAsset::new(&video)).await.unwrap_err();
        assert!(matches!(error, AnalyzeError::Timeout(200)));
        server.abort();
        let _ = std::fs::remove_file(video);
    }
}
