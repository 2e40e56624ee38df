pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::chat::handlers as chat;
use crate::resume::handlers as cv;
use crate::retrieval::handlers as vector;
use crate::state::AppState;

/// Uploaded CVs can exceed axum's default 2 MiB body limit.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::root_handler))
        .route("/api/health", get(health::health_handler))
        // Chat API
        .route("/api/chat", post(chat::handle_chat))
        .route("/api/chat/with-cv", post(chat::handle_chat_with_cv))
        // Vector API (called by the job-management backend)
        .route("/api/vector/add-job", post(vector::handle_add_job))
        .route("/api/vector/jobs/:job_id", get(vector::handle_job_exists))
        .route("/api/vector/stats", get(vector::handle_index_stats))
        // CV API
        .route("/api/cv/upload", post(cv::handle_upload_cv))
        .route("/api/cv/recommend-jobs", post(cv::handle_recommend_jobs))
        .route("/api/cv/test", get(cv::handle_cv_test))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::chat::orchestrator::ChatOrchestrator;
    use crate::chat::prompts::RESUME_CONTEXT_HEADER;
    use crate::config::{BackendKind, Config, EmbeddingKind};
    use crate::llm_client::testing::{handle_for, ScriptedBackend};
    use crate::resume::SAMPLE_CV_PDF;
    use crate::retrieval::testing::MemoryIndex;
    use crate::retrieval::{GroundingRetriever, SemanticIndex};

    const BOUNDARY: &str = "jobhunter-test-boundary";

    fn config() -> Config {
        Config {
            ai_service: BackendKind::Gemini,
            gemini_api_key: Some("test-key".to_string()),
            openai_api_key: None,
            openrouter_api_key: None,
            ai_model: "gemini-3-flash-preview".to_string(),
            ai_temperature: 0.7,
            ai_max_tokens: 500,
            ai_request_timeout_secs: 30,
            embedding_service: EmbeddingKind::Gemini,
            embedding_model: "gemini-embedding-001".to_string(),
            vector_db_url: "http://localhost:8001".to_string(),
            chroma_tenant: "default_tenant".to_string(),
            chroma_database: "default_database".to_string(),
            vector_collection: "jobs".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8000,
            allowed_origins: vec!["http://localhost:4200".to_string()],
            rust_log: "info".to_string(),
        }
    }

    fn app(index: MemoryIndex, backend: Arc<ScriptedBackend>) -> (Router, Arc<MemoryIndex>) {
        let index = Arc::new(index);
        let chat = ChatOrchestrator::new(
            GroundingRetriever::new(index.clone()),
            Arc::new(handle_for(backend)),
        );
        let state = AppState {
            config: Arc::new(config()),
            chat: Arc::new(chat),
            index: index.clone(),
        };
        (build_router(state), index)
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    /// Builds a multipart body from text fields plus one `file` part.
    fn multipart_request(
        uri: &str,
        fields: &[(&str, &str)],
        file_name: &str,
        bytes: &[u8],
    ) -> Request<Body> {
        let mut body: Vec<u8> = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_backend() {
        let (app, _) = app(MemoryIndex::default(), Arc::new(ScriptedBackend::replying("")));
        let response = app
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["ai_service"], "gemini");
        assert_eq!(json["credentials_configured"], true);
    }

    #[tokio::test]
    async fn test_chat_returns_reply() {
        let backend = Arc::new(ScriptedBackend::replying("Đây là các việc Python."));
        let index = MemoryIndex::with_docs(&[("1", "Python Developer: Django")]);
        let (app, _) = app(index, backend.clone());

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/chat",
                json!({"message": "Tìm việc Python", "conversation_history": []}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["response"], "Đây là các việc Python.");
        assert_eq!(json["success"], true);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_chat_empty_message_is_bad_request() {
        let backend = Arc::new(ScriptedBackend::replying("unused"));
        let (app, _) = app(MemoryIndex::default(), backend.clone());

        let response = app
            .oneshot(json_request("POST", "/api/chat", json!({"message": ""})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_chat_backend_failure_is_server_error_with_detail() {
        let backend = Arc::new(ScriptedBackend::failing("model overloaded"));
        let (app, _) = app(MemoryIndex::default(), backend);

        let response = app
            .oneshot(json_request("POST", "/api/chat", json!({"message": "hi"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "LLM_ERROR");
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("model overloaded"));
    }

    #[tokio::test]
    async fn test_chat_survives_index_outage() {
        let backend = Arc::new(ScriptedBackend::replying("Tư vấn chung"));
        let (app, _) = app(MemoryIndex::failing(), backend);

        let response = app
            .oneshot(json_request("POST", "/api/chat", json!({"message": "hi"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["response"], "Tư vấn chung");
    }

    #[tokio::test]
    async fn test_add_job_indexes_then_reports_existing() {
        let (app, index) = app(MemoryIndex::default(), Arc::new(ScriptedBackend::replying("")));
        let body = json!({
            "job_id": "123",
            "title": "Lập trình viên Python",
            "description": "Phát triển ứng dụng web"
        });

        let first = app
            .clone()
            .oneshot(json_request("POST", "/api/vector/add-job", body.clone()))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(body_json(first).await["created"], true);

        let second = app
            .clone()
            .oneshot(json_request("POST", "/api/vector/add-job", body))
            .await
            .unwrap();
        assert_eq!(body_json(second).await["created"], false);

        let stats = app
            .oneshot(Request::get("/api/vector/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(stats).await["total_jobs"], 1);
        assert!(index.exists("123").await.unwrap());
    }

    #[tokio::test]
    async fn test_add_job_index_failure_is_server_error() {
        let (app, _) = app(MemoryIndex::failing(), Arc::new(ScriptedBackend::replying("")));
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/vector/add-job",
                json!({"job_id": "1", "title": "QA", "description": "Selenium"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_job_exists_lookup() {
        let index = MemoryIndex::with_docs(&[("42", "DevOps Engineer: AWS")]);
        let (app, _) = app(index, Arc::new(ScriptedBackend::replying("")));

        let response = app
            .oneshot(Request::get("/api/vector/jobs/42").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["job_id"], "42");
        assert_eq!(json["exists"], true);
    }

    #[tokio::test]
    async fn test_cv_upload_rejects_non_pdf() {
        let (app, _) = app(MemoryIndex::default(), Arc::new(ScriptedBackend::replying("")));
        let response = app
            .oneshot(multipart_request(
                "/api/cv/upload",
                &[],
                "cv.docx",
                b"PK\x03\x04",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_cv_upload_unreadable_pdf_is_unsuccessful_analysis() {
        let (app, _) = app(MemoryIndex::default(), Arc::new(ScriptedBackend::replying("")));
        let response = app
            .oneshot(multipart_request(
                "/api/cv/upload",
                &[],
                "cv.pdf",
                b"not really a pdf",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn test_recommend_jobs_rejects_out_of_range_top_k() {
        let (app, _) = app(MemoryIndex::default(), Arc::new(ScriptedBackend::replying("")));
        let response = app
            .oneshot(multipart_request(
                "/api/cv/recommend-jobs?top_k=51",
                &[],
                "cv.pdf",
                b"%PDF-1.4",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_chat_with_unreadable_cv_degrades_to_plain_chat() {
        let backend = Arc::new(ScriptedBackend::replying("Chào bạn"));
        let (app, _) = app(MemoryIndex::default(), backend.clone());

        let response = app
            .oneshot(multipart_request(
                "/api/chat/with-cv",
                &[
                    ("message", "Gợi ý việc làm cho tôi"),
                    ("conversation_history", r#"[{"role": "user", "content": "Xin chào"}]"#),
                ],
                "cv.pdf",
                b"garbage bytes",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["cv_included"], false);
        assert_eq!(json["response"], "Chào bạn");

        let prompts = backend.prompts.lock().unwrap();
        assert_eq!(prompts[0].current_message(), "Gợi ý việc làm cho tôi");
        assert_eq!(prompts[0].len(), 4);
    }

    #[tokio::test]
    async fn test_chat_with_cv_rejects_non_pdf_file() {
        let backend = Arc::new(ScriptedBackend::replying("unused"));
        let (app, _) = app(MemoryIndex::default(), backend.clone());

        let response = app
            .oneshot(multipart_request(
                "/api/chat/with-cv",
                &[("message", "hi")],
                "cv.png",
                b"\x89PNG",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_chat_with_empty_pdf_degrades_to_plain_chat() {
        let backend = Arc::new(ScriptedBackend::replying("Chào bạn"));
        let (app, _) = app(MemoryIndex::default(), backend.clone());

        let response = app
            .oneshot(multipart_request(
                "/api/chat/with-cv",
                &[("message", "hi")],
                "cv.pdf",
                b"",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["cv_included"], false);
        assert_eq!(backend.calls(), 1);
        assert_eq!(backend.prompts.lock().unwrap()[0].current_message(), "hi");
    }

    #[tokio::test]
    async fn test_chat_with_readable_cv_folds_resume_into_message() {
        let backend = Arc::new(ScriptedBackend::replying("Bạn phù hợp với vị trí Python."));
        let (app, index) = app(
            MemoryIndex::with_docs(&[("1", "Python Developer: Django")]),
            backend.clone(),
        );

        let response = app
            .oneshot(multipart_request(
                "/api/chat/with-cv",
                &[("message", "Gợi ý việc làm cho tôi")],
                "cv.pdf",
                SAMPLE_CV_PDF,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["cv_included"], true);
        assert_eq!(json["response"], "Bạn phù hợp với vị trí Python.");

        let prompts = backend.prompts.lock().unwrap();
        let sent = prompts[0].current_message();
        assert!(sent.starts_with(RESUME_CONTEXT_HEADER));
        assert!(sent.contains("nguyenvana@example.com"));
        assert!(sent.ends_with("\n\nGợi ý việc làm cho tôi"));

        // Grounding is retrieved for the message the backend actually sees.
        assert_eq!(index.queries.lock().unwrap()[0], sent);
    }

    #[tokio::test]
    async fn test_cv_upload_extracts_profile() {
        let (app, _) = app(MemoryIndex::default(), Arc::new(ScriptedBackend::replying("")));
        let response = app
            .oneshot(multipart_request("/api/cv/upload", &[], "cv.pdf", SAMPLE_CV_PDF))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["email"], "nguyenvana@example.com");
        assert_eq!(json["experience_years"], 4);
        assert!(json["skills"]
            .as_array()
            .unwrap()
            .contains(&json!("Python")));
    }

    #[tokio::test]
    async fn test_recommend_jobs_scores_hits_from_cv_query() {
        let index = MemoryIndex::with_docs(&[
            ("1", "Python Developer: Django"),
            ("2", "DevOps Engineer: Docker"),
            ("3", "Frontend Developer: React"),
        ]);
        let (app, index) = app(index, Arc::new(ScriptedBackend::replying("")));

        let response = app
            .oneshot(multipart_request(
                "/api/cv/recommend-jobs?top_k=2",
                &[],
                "cv.pdf",
                SAMPLE_CV_PDF,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["total"], 2);

        let jobs = json["jobs"].as_array().unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0]["job_id"], "1");
        assert_eq!(jobs[0]["description"], "Python Developer: Django");
        assert_eq!(jobs[0]["relevance_score"], 1.0);
        assert_eq!(jobs[1]["relevance_score"], 0.75);

        assert!(json["cv_summary"]["skills"]
            .as_array()
            .unwrap()
            .contains(&json!("Python")));

        let queries = index.queries.lock().unwrap();
        assert!(queries[0].starts_with("Kỹ năng: Python"));
        assert!(queries[0].ends_with("Middle, intermediate level"));
    }

    #[tokio::test]
    async fn test_recommend_jobs_index_failure_is_server_error() {
        let (app, _) = app(MemoryIndex::failing(), Arc::new(ScriptedBackend::replying("")));
        let response = app
            .oneshot(multipart_request(
                "/api/cv/recommend-jobs",
                &[],
                "cv.pdf",
                SAMPLE_CV_PDF,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
