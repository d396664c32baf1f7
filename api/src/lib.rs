//! HTTP surface: the upload/ask page, its JSON twins, and server startup.

pub mod core;
pub mod error_handler;
mod middleware_layer;
mod routes;
pub mod ui;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use crate::core::{app_config::AppConfig, app_state::AppState};
pub use crate::error_handler::AppError;

use crate::{
    middleware_layer::json_extractor::json_error_mapper,
    routes::{
        ask_route::{ask_api, ask_form},
        health_route::health,
        page_route::index_page,
        process_route::{process_api, process_form},
    },
};

/// Builds the application router over `state`.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/process", post(process_api))
        .route("/ask", post(ask_api))
        .layer(middleware::from_fn(json_error_mapper));

    Router::new()
        .route("/", get(index_page))
        .route("/process", post(process_form))
        .route("/ask", post(ask_form))
        .route("/health", get(health))
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(state.cfg.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `cfg.address` and serves until Ctrl+C.
pub async fn start(cfg: AppConfig) -> Result<(), AppError> {
    let addr = cfg.address.clone();
    info!(
        %addr,
        provider = ?cfg.generation.provider,
        generation_model = %cfg.generation.model,
        embedding_model = %cfg.embedding.model,
        "starting server"
    );
    let state = AppState::new(cfg)?;

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| AppError::Bind {
            addr: addr.clone(),
            source,
        })?;

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "cannot listen for Ctrl+C; serving until killed");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::HashMap, path::Path, sync::Arc};

    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
        response::Response,
    };
    use contextor::{CompletionProvider, ContextorError, Providers};
    use futures::future::BoxFuture;
    use rag_store::{EmbeddingsProvider, HashEmbedder, RagError};
    use serde_json::Value;
    use tower::ServiceExt;

    const BOUNDARY: &str = "doc-qa-test-boundary";

    /// Answers with the first line of the top retrieved segment.
    struct EchoContext;

    impl CompletionProvider for EchoContext {
        fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, ContextorError>> {
            let line = prompt
                .lines()
                .skip_while(|l| !l.starts_with("file_name:"))
                .nth(2)
                .unwrap_or_default()
                .to_string();
            Box::pin(async move { Ok(line) })
        }
    }

    fn config(root: &Path, extra: &[(&str, &str)]) -> AppConfig {
        std::fs::create_dir_all(root.join("scratch")).unwrap();
        let mut vars: HashMap<String, String> = HashMap::from([
            ("DATA_DIR".into(), root.join("Data").display().to_string()),
            ("STORAGE_DIR".into(), root.join("storage").display().to_string()),
            ("SCRATCH_DIR".into(), root.join("scratch").display().to_string()),
        ]);
        for (k, v) in extra {
            vars.insert(k.to_string(), v.to_string());
        }
        AppConfig::from_lookup(&move |k: &str| vars.get(k).cloned()).unwrap()
    }

    fn fake_app(root: &Path) -> Router {
        let providers = Providers {
            embedder: Arc::new(HashEmbedder::default()),
            completer: Arc::new(EchoContext),
        };
        router(AppState::with_providers(config(root, &[]), providers).unwrap())
    }

    fn multipart(file_name: &str, bytes: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn with_cookie(builder: axum::http::request::Builder, cookie: Option<&str>) -> axum::http::request::Builder {
        match cookie {
            Some(c) => builder.header(header::COOKIE, c),
            None => builder,
        }
    }

    async fn upload(app: &Router, path: &str, cookie: Option<&str>, name: &str, bytes: &[u8]) -> Response {
        let req = with_cookie(Request::post(path), cookie)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart(name, bytes)))
            .unwrap();
        app.clone().oneshot(req).await.unwrap()
    }

    async fn ask_json(app: &Router, cookie: Option<&str>, question: &str) -> Response {
        let req = with_cookie(Request::post("/api/ask"), cookie)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::json!({ "question": question }).to_string()))
            .unwrap();
        app.clone().oneshot(req).await.unwrap()
    }

    async fn page(app: &Router, cookie: Option<&str>) -> String {
        let req = with_cookie(Request::get("/"), cookie)
            .body(Body::empty())
            .unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        String::from_utf8(to_bytes(res.into_body(), usize::MAX).await.unwrap().to_vec()).unwrap()
    }

    fn session_cookie(res: &Response) -> String {
        let raw = res
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap();
        raw.split(';').next().unwrap().to_string()
    }

    async fn json(res: Response) -> Value {
        serde_json::from_slice(&to_bytes(res.into_body(), usize::MAX).await.unwrap()).unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let root = tempfile::tempdir().unwrap();
        let app = fake_app(root.path());
        let res = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json(res).await["status"], "ok");
    }

    #[tokio::test]
    async fn sky_is_blue_through_the_api() {
        let root = tempfile::tempdir().unwrap();
        let app = fake_app(root.path());

        let res = upload(&app, "/api/process", None, "sky.txt", b"The sky is blue.").await;
        assert_eq!(res.status(), StatusCode::OK);
        let cookie = session_cookie(&res);
        let body = json(res).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["file_name"], "sky.txt");
        assert_eq!(body["data"]["stats"]["segments"], 1);

        let res = ask_json(&app, Some(&cookie), "What color is the sky?").await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = json(res).await;
        let answer = body["data"]["answer"].as_str().unwrap();
        assert!(!answer.is_empty());
        assert!(answer.to_lowercase().contains("blue"));
        assert_eq!(body["data"]["sources"][0]["file_name"], "sky.txt");

        // Scratch copies of the upload are gone.
        assert_eq!(std::fs::read_dir(root.path().join("scratch")).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn question_form_appears_only_after_processing() {
        let root = tempfile::tempdir().unwrap();
        let app = fake_app(root.path());

        let req = Request::get("/").body(Body::empty()).unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        let cookie = session_cookie(&res);
        let html = String::from_utf8(to_bytes(res.into_body(), usize::MAX).await.unwrap().to_vec()).unwrap();
        assert!(html.contains("QA with Documents"));
        assert!(!html.contains(r#"name="question""#));

        let res = upload(&app, "/process", Some(&cookie), "sky.txt", b"The sky is blue.").await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()[header::LOCATION], "/");

        let html = page(&app, Some(&cookie)).await;
        assert!(html.contains(r#"name="question""#));
        assert!(html.contains("Document processed successfully!"));

        // The notice is shown once.
        let html = page(&app, Some(&cookie)).await;
        assert!(!html.contains("Document processed successfully!"));
    }

    #[tokio::test]
    async fn ask_form_renders_answer_on_the_page() {
        let root = tempfile::tempdir().unwrap();
        let app = fake_app(root.path());

        let res = upload(&app, "/process", None, "sky.txt", b"The sky is **blue**.").await;
        let cookie = session_cookie(&res);

        let req = Request::post("/ask")
            .header(header::COOKIE, &cookie)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("question=What+color+is+the+sky%3F"))
            .unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);

        let html = page(&app, Some(&cookie)).await;
        assert!(html.contains("What color is the sky?"));
        assert!(html.contains("<strong>blue</strong>"));
    }

    #[tokio::test]
    async fn reprocessing_replaces_the_engine() {
        let root = tempfile::tempdir().unwrap();
        let app = fake_app(root.path());

        let res = upload(&app, "/api/process", None, "sky.txt", b"The sky is blue.").await;
        let cookie = session_cookie(&res);
        let res = upload(&app, "/api/process", Some(&cookie), "grass.txt", b"Grass is green.").await;
        assert_eq!(res.status(), StatusCode::OK);

        let body = json(ask_json(&app, Some(&cookie), "What color is the sky?").await).await;
        let answer = body["data"]["answer"].as_str().unwrap();
        assert!(answer.contains("green"));
        assert!(!answer.contains("blue"));
        for src in body["data"]["sources"].as_array().unwrap() {
            assert_eq!(src["file_name"], "grass.txt");
        }
    }

    #[tokio::test]
    async fn no_upload_loads_the_data_folder() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("Data")).unwrap();
        std::fs::write(root.path().join("Data/notes.txt"), "The sea is salty.").unwrap();
        let app = fake_app(root.path());

        let res = upload(&app, "/api/process", None, "", b"").await;
        assert_eq!(res.status(), StatusCode::OK);
        let cookie = session_cookie(&res);
        let body = json(res).await;
        assert!(body["data"]["file_name"].is_null());
        assert_eq!(body["data"]["stats"]["documents"], 1);

        let body = json(ask_json(&app, Some(&cookie), "How is the sea?").await).await;
        assert!(body["data"]["answer"].as_str().unwrap().contains("salty"));
    }

    #[tokio::test]
    async fn asking_before_processing_is_a_conflict() {
        let root = tempfile::tempdir().unwrap();
        let app = fake_app(root.path());

        let res = ask_json(&app, None, "Anything?").await;
        assert_eq!(res.status(), StatusCode::CONFLICT);
        let body = json(res).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "NO_DOCUMENT");
    }

    #[tokio::test]
    async fn blank_question_is_rejected() {
        let root = tempfile::tempdir().unwrap();
        let app = fake_app(root.path());
        let res = upload(&app, "/api/process", None, "sky.txt", b"The sky is blue.").await;
        let cookie = session_cookie(&res);

        let res = ask_json(&app, Some(&cookie), "   ").await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(res).await["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn malformed_json_gets_the_envelope() {
        let root = tempfile::tempdir().unwrap();
        let app = fake_app(root.path());
        let req = Request::post("/api/ask")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = json(res).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn empty_document_fails_indexing_and_keeps_previous_engine() {
        let root = tempfile::tempdir().unwrap();
        let app = fake_app(root.path());
        let res = upload(&app, "/api/process", None, "sky.txt", b"The sky is blue.").await;
        let cookie = session_cookie(&res);

        let res = upload(&app, "/api/process", Some(&cookie), "blank.txt", b"   \n  ").await;
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(json(res).await["error"]["code"], "INDEX_FAILED");

        let body = json(ask_json(&app, Some(&cookie), "What color is the sky?").await).await;
        assert!(body["data"]["answer"].as_str().unwrap().contains("blue"));
    }

    #[tokio::test]
    async fn missing_api_key_fails_processing() {
        let root = tempfile::tempdir().unwrap();
        let state = AppState::new(config(root.path(), &[])).unwrap();
        let app = router(state);

        let res = upload(&app, "/api/process", None, "sky.txt", b"The sky is blue.").await;
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
        let body = json(res).await;
        assert_eq!(body["error"]["code"], "INDEX_FAILED");
        assert!(body["error"]["message"].as_str().unwrap().contains("missing API key"));
    }

    #[tokio::test]
    async fn failures_show_an_error_banner() {
        let root = tempfile::tempdir().unwrap();
        let state = AppState::new(config(root.path(), &[])).unwrap();
        let app = router(state);

        let res = upload(&app, "/process", None, "sky.txt", b"The sky is blue.").await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        let cookie = session_cookie(&res);

        let html = page(&app, Some(&cookie)).await;
        assert!(html.contains("Indexing error"));
        assert!(!html.contains(r#"name="question""#));
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let root = tempfile::tempdir().unwrap();
        let providers = Providers {
            embedder: Arc::new(HashEmbedder::default()),
            completer: Arc::new(EchoContext),
        };
        let cfg = config(root.path(), &[("MAX_UPLOAD_BYTES", "64")]);
        let app = router(AppState::with_providers(cfg, providers).unwrap());

        let res = upload(&app, "/api/process", None, "big.txt", &[b'a'; 4096]).await;
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(json(res).await["success"], false);
    }

    /// Blocks every embedding call until the gate is opened.
    struct GatedEmbedder {
        entered: Arc<tokio::sync::Notify>,
        gate: Arc<tokio::sync::Semaphore>,
        inner: HashEmbedder,
    }

    impl EmbeddingsProvider for GatedEmbedder {
        fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, RagError>> {
            Box::pin(async move {
                self.entered.notify_one();
                let _permit = self.gate.acquire().await.unwrap();
                Ok(self.inner.vector(text))
            })
        }
    }

    #[tokio::test]
    async fn page_waits_for_processing_and_sees_its_notice() {
        let root = tempfile::tempdir().unwrap();
        let entered = Arc::new(tokio::sync::Notify::new());
        let gate = Arc::new(tokio::sync::Semaphore::new(0));
        let providers = Providers {
            embedder: Arc::new(GatedEmbedder {
                entered: Arc::clone(&entered),
                gate: Arc::clone(&gate),
                inner: HashEmbedder::default(),
            }),
            completer: Arc::new(EchoContext),
        };
        let app = router(AppState::with_providers(config(root.path(), &[]), providers).unwrap());

        let req = Request::get("/").body(Body::empty()).unwrap();
        let cookie = session_cookie(&app.clone().oneshot(req).await.unwrap());

        let processing = {
            let (app, cookie) = (app.clone(), cookie.clone());
            tokio::spawn(async move {
                upload(&app, "/process", Some(&cookie), "sky.txt", b"The sky is blue.").await
            })
        };
        entered.notified().await;

        let rendering = {
            let (app, cookie) = (app.clone(), cookie.clone());
            tokio::spawn(async move { page(&app, Some(&cookie)).await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(!rendering.is_finished());

        gate.add_permits(16);
        assert_eq!(processing.await.unwrap().status(), StatusCode::SEE_OTHER);
        let html = rendering.await.unwrap();
        assert!(html.contains("Document processed successfully!"));
        assert!(html.contains(r#"name="question""#));
    }
}
