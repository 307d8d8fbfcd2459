use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use crate::config::Config;
use crate::tts::TtsService;

pub struct AppState {
    pub config: Config,
    pub tts: TtsService,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let tts = TtsService::new(&config);
        Self { config, tts }
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route(
            "/health",
            get(handlers::health).fallback(handlers::method_not_allowed),
        )
        .route(
            "/voices",
            get(handlers::list_voices).fallback(handlers::method_not_allowed),
        )
        .route(
            "/synthesize",
            post(handlers::synthesize).fallback(handlers::method_not_allowed),
        )
        .route(
            "/synthesize/stream",
            post(handlers::synthesize_stream).fallback(handlers::method_not_allowed),
        )
        .fallback(handlers::not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::test_support::{fake_command, test_config, write_wav_fixture};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use http_body_util::BodyExt;
    use std::path::Path;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct Harness {
        work: TempDir,
        temp: TempDir,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                work: tempfile::tempdir().unwrap(),
                temp: tempfile::tempdir().unwrap(),
            }
        }

        /// A router whose tool copies a fixture WAV and drops a marker file.
        fn succeeding(&self) -> Router {
            let fixture = write_wav_fixture(self.work.path());
            let script = format!(
                "touch '{}'; cp '{}' \"$4\"",
                self.marker().display(),
                fixture.display()
            );
            self.router(&script, Duration::from_secs(10))
        }

        fn router(&self, script: &str, timeout: Duration) -> Router {
            let config = Config {
                timeout,
                ..test_config(self.temp.path(), fake_command(script))
            };
            create_router(Arc::new(AppState::new(config)))
        }

        fn marker(&self) -> std::path::PathBuf {
            self.work.path().join("invoked")
        }

        fn tool_invoked(&self) -> bool {
            self.marker().exists()
        }

        fn temp_is_empty(&self) -> bool {
            is_empty_dir(self.temp.path())
        }
    }

    fn is_empty_dir(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        response
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let h = Harness::new();
        let response = h.succeeding().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["supported_format"], "wav");
    }

    #[tokio::test]
    async fn test_voices_lists_allow_list_and_default() {
        let h = Harness::new();
        let response = h.succeeding().oneshot(get("/voices")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let voices: Vec<&str> = body["voices"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(voices, vec!["af_heart", "default_voice"]);
        assert_eq!(body["default"], "af_heart");
        assert!(voices.contains(&body["default"].as_str().unwrap()));
    }

    #[tokio::test]
    async fn test_stream_returns_wav_bytes() {
        let h = Harness::new();
        let response = h
            .succeeding()
            .oneshot(post_json(
                "/synthesize/stream",
                r#"{"text": "hello world", "voice": "default_voice"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "audio/wav");
        assert_eq!(
            response.headers()["content-disposition"],
            "inline; filename=\"tts_output.wav\""
        );
        let body = body_bytes(response).await;
        assert!(body.len() > 44);
        assert!(body.starts_with(b"RIFF"));
        assert!(h.temp_is_empty());
    }

    #[tokio::test]
    async fn test_synthesize_returns_attachment_and_cleans_up() {
        let h = Harness::new();
        let response = h
            .succeeding()
            .oneshot(post_json("/synthesize", r#"{"text": "hello world"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "audio/wav");
        assert_eq!(
            response.headers()["content-disposition"],
            "attachment; filename=\"tts_output.wav\""
        );
        let len: usize = response.headers()["content-length"]
            .to_str()
            .unwrap()
            .parse()
            .unwrap();

        let body = body_bytes(response).await;
        assert_eq!(body.len(), len);
        assert!(body.starts_with(b"RIFF"));
        assert!(h.temp_is_empty());
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected() {
        let h = Harness::new();
        let response = h
            .succeeding()
            .oneshot(post_json("/synthesize", r#"{"text": ""}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("Text field is required"));
        assert!(!h.tool_invoked());
    }

    #[tokio::test]
    async fn test_long_text_never_invokes_tool() {
        let h = Harness::new();
        let body = serde_json::json!({ "text": "a".repeat(101) }).to_string();
        let response = h
            .succeeding()
            .oneshot(post_json("/synthesize/stream", &body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("exceeds maximum of 100"));
        assert!(!h.tool_invoked());
    }

    #[tokio::test]
    async fn test_unknown_voice_never_invokes_tool() {
        let h = Harness::new();
        let response = h
            .succeeding()
            .oneshot(post_json("/synthesize", r#"{"text": "hi", "voice": "zz_x"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(!h.tool_invoked());
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let h = Harness::new();
        let response = h
            .succeeding()
            .oneshot(post_json("/synthesize", "{not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn test_tool_failure_is_server_error() {
        let h = Harness::new();
        let router = h.router("echo oops > \"$4\"; exit 2", Duration::from_secs(10));
        let response = router
            .oneshot(post_json("/synthesize", r#"{"text": "hi"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["code"], "TTS_ERROR");
        assert!(h.temp_is_empty());
    }

    #[tokio::test]
    async fn test_zero_byte_output_is_server_error() {
        let h = Harness::new();
        let router = h.router(": > \"$4\"", Duration::from_secs(10));
        let response = router
            .oneshot(post_json("/synthesize/stream", r#"{"text": "hi"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(h.temp_is_empty());
    }

    #[tokio::test]
    async fn test_timeout_is_server_error() {
        let h = Harness::new();
        let router = h.router("exec sleep 10", Duration::from_millis(300));
        let started = Instant::now();
        let response = router
            .oneshot(post_json("/synthesize", r#"{"text": "hi"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(h.temp_is_empty());
    }

    #[tokio::test]
    async fn test_timeout_after_partial_output_cleans_up() {
        let h = Harness::new();
        let router = h.router(
            "echo partial > \"$4\"; exec sleep 10",
            Duration::from_millis(300),
        );
        let started = Instant::now();
        let response = router
            .oneshot(post_json("/synthesize/stream", r#"{"text": "hi"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(h.temp_is_empty());
    }

    #[tokio::test]
    async fn test_timeout_with_late_background_write_cleans_up() {
        let h = Harness::new();
        let router = h.router(
            "(sleep 1; echo late > \"$4\") & wait",
            Duration::from_millis(300),
        );
        let response = router
            .oneshot(post_json("/synthesize", r#"{"text": "hi"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(h.temp_is_empty());
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let h = Harness::new();
        let response = h.succeeding().oneshot(get("/nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_wrong_method_is_json_405() {
        let h = Harness::new();
        let response = h.succeeding().oneshot(get("/synthesize")).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body_json(response).await["code"], "METHOD_NOT_ALLOWED");

        let response = h
            .succeeding()
            .oneshot(post_json("/voices", "{}"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
