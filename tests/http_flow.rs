#[cfg(test)]
mod tests {
    use actix_web::{http::header, http::StatusCode, test, App};
    use askdocs::answer::TRUNCATION_MARKER;
    use askdocs::api::models::{AskResponse, ErrorResponse, UploadResponse};
    use askdocs::api::routes;
    use askdocs::config::{AnswerConfig, AppConfig, LlmConfig, OpenAiConfig, ServerConfig, StorageConfig};
    use askdocs::llm::models::Completion;
    use askdocs::llm::{LlmError, LlmProvider};
    use askdocs::services::Services;
    use askdocs::storage::LocalFileStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    const BOUNDARY: &str = "askdocs-test-boundary";

    /// Records every prompt and replies with a canned answer.
    struct StubProvider {
        reply: Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl StubProvider {
        fn answering(reply: &str) -> Arc<Self> {
            Arc::new(Self { reply: Ok(reply.to_string()), prompts: Mutex::new(Vec::new()) })
        }

        fn failing(reason: &str) -> Arc<Self> {
            Arc::new(Self { reply: Err(reason.to_string()), prompts: Mutex::new(Vec::new()) })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        async fn complete(&self, prompt: &str) -> Result<Completion, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Ok(text) => Ok(Completion { content: text.clone(), model: "stub-1".to_string(), usage: None }),
                Err(reason) => Err(LlmError::Api(reason.clone())),
            }
        }
    }

    fn test_config(upload_dir: &Path, max_file_size: usize) -> AppConfig {
        AppConfig {
            server: ServerConfig { host: "127.0.0.1".to_string(), port: 5600 },
            storage: StorageConfig {
                upload_dir: upload_dir.to_string_lossy().into_owned(),
                max_file_size,
                allowed_extensions: vec!["txt".to_string()],
            },
            llm: LlmConfig {
                provider: "openai".to_string(),
                openai: OpenAiConfig {
                    api_base: "http://127.0.0.1:1".to_string(),
                    api_key: "sk-test".to_string(),
                    default_model: "gpt-4.1-nano-2025-04-14".to_string(),
                },
            },
            answer: AnswerConfig { max_chars: 10_000 },
        }
    }

    fn services_with(dir: &Path, provider: Arc<StubProvider>, max_file_size: usize) -> Services {
        let config = test_config(dir, max_file_size);
        let store = Arc::new(LocalFileStore::open(dir).unwrap());
        Services::new(&config, store, provider)
    }

    fn multipart_body(field: &str, filename: &str, content: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
             Content-Type: text/plain\r\n\r\n",
            BOUNDARY, field, filename
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn upload_request(field: &str, filename: &str, content: &[u8]) -> actix_http::Request {
        test::TestRequest::post()
            .uri("/upload")
            .insert_header((header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY)))
            .set_payload(multipart_body(field, filename, content))
            .to_request()
    }

    fn ask_request(body: serde_json::Value) -> actix_http::Request {
        test::TestRequest::post().uri("/ask").set_json(body).to_request()
    }

    fn stored_files(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[actix_web::test]
    async fn test_upload_then_download_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let services = services_with(dir.path(), StubProvider::answering("unused"), 1024);
        let app = test::init_service(
            App::new().configure(|cfg| services.configure(cfg)).configure(routes::configure),
        )
        .await;

        let content = b"Paris is the capital of France.\nSecond line.\n";
        let resp: UploadResponse =
            test::call_and_read_body_json(&app, upload_request("file", "capitals.txt", content)).await;

        assert!(resp.success);
        assert!(resp.error.is_none());
        let id = resp.id.unwrap();
        assert!(id.ends_with("_capitals.txt"));

        let req = test::TestRequest::get().uri(&format!("/uploads/{}", id)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "text/plain");
        let body = test::read_body(resp).await;
        assert_eq!(body.as_ref(), content);
    }

    #[actix_web::test]
    async fn test_rejected_uploads_create_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let services = services_with(dir.path(), StubProvider::answering("unused"), 1024);
        let app = test::init_service(
            App::new().configure(|cfg| services.configure(cfg)).configure(routes::configure),
        )
        .await;

        let resp: UploadResponse =
            test::call_and_read_body_json(&app, upload_request("file", "report.pdf", b"%PDF-1.7")).await;
        assert!(!resp.success);
        assert_eq!(resp.error.as_deref(), Some("Invalid file type"));

        let resp: UploadResponse =
            test::call_and_read_body_json(&app, upload_request("file", "", b"data")).await;
        assert_eq!(resp.error.as_deref(), Some("No selected file"));

        let resp: UploadResponse =
            test::call_and_read_body_json(&app, upload_request("document", "notes.txt", b"data")).await;
        assert_eq!(resp.error.as_deref(), Some("No file part"));

        let req = test::TestRequest::post()
            .uri("/upload")
            .insert_header((header::CONTENT_TYPE, "text/plain"))
            .set_payload("just text")
            .to_request();
        let resp: UploadResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp.error.as_deref(), Some("No file part"));

        assert_eq!(stored_files(dir.path()), 0);
    }

    #[actix_web::test]
    async fn test_oversized_upload_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let services = services_with(dir.path(), StubProvider::answering("unused"), 8);
        let app = test::init_service(
            App::new().configure(|cfg| services.configure(cfg)).configure(routes::configure),
        )
        .await;

        let resp = test::call_service(&app, upload_request("file", "big.txt", b"0123456789abcdef")).await;
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let body: UploadResponse = test::read_body_json(resp).await;
        assert!(!body.success);
        assert_eq!(body.error.as_deref(), Some("File exceeds maximum size of 8 bytes"));
        assert_eq!(stored_files(dir.path()), 0);
    }

    #[actix_web::test]
    async fn test_same_filename_twice_gets_distinct_ids() {
        let dir = tempfile::tempdir().unwrap();
        let services = services_with(dir.path(), StubProvider::answering("unused"), 1024);
        let app = test::init_service(
            App::new().configure(|cfg| services.configure(cfg)).configure(routes::configure),
        )
        .await;

        let first: UploadResponse =
            test::call_and_read_body_json(&app, upload_request("file", "notes.txt", b"one")).await;
        let second: UploadResponse =
            test::call_and_read_body_json(&app, upload_request("file", "notes.txt", b"two")).await;

        assert_ne!(first.id, second.id);
        assert_eq!(stored_files(dir.path()), 2);
    }

    #[actix_web::test]
    async fn test_ask_without_files_never_calls_provider() {
        let dir = tempfile::tempdir().unwrap();
        let provider = StubProvider::answering("unused");
        let services = services_with(dir.path(), provider.clone(), 1024);
        let app = test::init_service(
            App::new().configure(|cfg| services.configure(cfg)).configure(routes::configure),
        )
        .await;

        for body in [
            json!({"question": "What is the capital of France?", "file_ids": []}),
            json!({"question": "What is the capital of France?"}),
            json!({"question": "", "file_ids": ["abc_notes.txt"]}),
            json!({"file_ids": ["abc_notes.txt"]}),
        ] {
            let resp: AskResponse = test::call_and_read_body_json(&app, ask_request(body)).await;
            assert_eq!(resp.answer, "Missing question or files.");
        }

        let resp: AskResponse = test::call_and_read_body_json(
            &app,
            ask_request(json!({"question": "Anything?", "file_ids": ["nope_missing.txt", "../etc.txt"]})),
        )
        .await;
        assert_eq!(resp.answer, "No content found in uploaded files.");

        assert!(provider.prompts().is_empty());
    }

    #[actix_web::test]
    async fn test_ask_composes_documents_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let provider = StubProvider::answering("  Paris.\n");
        let services = services_with(dir.path(), provider.clone(), 1024);
        let app = test::init_service(
            App::new().configure(|cfg| services.configure(cfg)).configure(routes::configure),
        )
        .await;

        let france: UploadResponse = test::call_and_read_body_json(
            &app,
            upload_request("file", "france.txt", b"Paris is the capital of France."),
        )
        .await;
        let germany: UploadResponse = test::call_and_read_body_json(
            &app,
            upload_request("file", "germany.txt", b"Berlin is the capital of Germany."),
        )
        .await;

        let resp: AskResponse = test::call_and_read_body_json(
            &app,
            ask_request(json!({
                "question": "What is the capital of France?",
                "file_ids": [france.id.unwrap(), "unknown_file.txt", germany.id.unwrap()],
            })),
        )
        .await;
        assert_eq!(resp.answer, "Paris.");

        let prompts = provider.prompts();
        assert_eq!(prompts.len(), 1);
        let prompt = &prompts[0];
        let dashes = "-".repeat(32);

        let open = prompt.find(&dashes).unwrap();
        let paris = prompt.find("Paris is the capital of France.").unwrap();
        let berlin = prompt.find("Berlin is the capital of Germany.").unwrap();
        let close = prompt.rfind(&dashes).unwrap();
        let question = prompt.find("User Question: What is the capital of France?").unwrap();
        assert!(open < paris && paris < berlin && berlin < close && close < question);
    }

    #[actix_web::test]
    async fn test_provider_failures_and_long_answers_stay_soft() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("abc_notes.txt"), "Some notes.").unwrap();

        let services = services_with(dir.path(), StubProvider::failing("invalid api key"), 1024);
        let app = test::init_service(
            App::new().configure(|cfg| services.configure(cfg)).configure(routes::configure),
        )
        .await;
        let resp = test::call_service(
            &app,
            ask_request(json!({"question": "Summarize", "file_ids": ["abc_notes.txt"]})),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: AskResponse = test::read_body_json(resp).await;
        assert_eq!(body.answer, "Error from OpenAI API: API Error: invalid api key");

        let services = services_with(dir.path(), StubProvider::answering(&"a".repeat(10_050)), 1024);
        let app = test::init_service(
            App::new().configure(|cfg| services.configure(cfg)).configure(routes::configure),
        )
        .await;
        let body: AskResponse = test::call_and_read_body_json(
            &app,
            ask_request(json!({"question": "Summarize", "file_ids": ["abc_notes.txt"]})),
        )
        .await;
        assert_eq!(body.answer, format!("{}{}", "a".repeat(10_000), TRUNCATION_MARKER));
    }

    #[actix_web::test]
    async fn test_malformed_ask_body_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let provider = StubProvider::answering("unused");
        let services = services_with(dir.path(), provider.clone(), 1024);
        let app = test::init_service(
            App::new().configure(|cfg| services.configure(cfg)).configure(routes::configure),
        )
        .await;

        let resp = test::call_service(
            &app,
            ask_request(json!({"question": "Why?", "file_ids": "not-a-list"})),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert!(body.error.starts_with("Invalid request body"));

        let req = test::TestRequest::post()
            .uri("/ask")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        assert!(provider.prompts().is_empty());
    }

    #[actix_web::test]
    async fn test_static_routes() {
        let dir = tempfile::tempdir().unwrap();
        let services = services_with(dir.path(), StubProvider::answering("unused"), 1024);
        let app = test::init_service(
            App::new().configure(|cfg| services.configure(cfg)).configure(routes::configure),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert!(std::str::from_utf8(&body).unwrap().contains("/upload"));

        let resp = test::call_service(&app, test::TestRequest::get().uri("/favicon.ico").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/uploads/unknown_file.txt").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
