#[cfg(test)]
mod api_integration_tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use chrono::{Duration, Utc};
    use helpdesk::core::config::{AppConfig, StoreBackend};
    use helpdesk::core::shared::state::AppState;
    use helpdesk::llm::OpenAIClient;
    use helpdesk::main_module::build_router;
    use helpdesk::tickets::{MemoryTicketStore, SupportTicket, TicketStatus};
    use mockito::Matcher;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn ticket(id: i64, status: TicketStatus, minutes_ago: i64) -> SupportTicket {
        SupportTicket {
            id,
            name: "Max Mustermann".to_string(),
            email: "max@example.com".to_string(),
            phone: "0171 5551234".to_string(),
            error_description: "VPN verbindet nicht".to_string(),
            image_url: Some("https://cdn.example.com/vpn.png".to_string()),
            images: None,
            is_read: false,
            status,
            assigned_to: None,
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    fn app(llm_base_url: &str) -> Router {
        let store = Arc::new(MemoryTicketStore::new());
        store.seed_ticket(ticket(1, TicketStatus::New, 10)).unwrap();
        store.seed_ticket(ticket(2, TicketStatus::Completed, 5)).unwrap();

        let mut config = AppConfig::default();
        config.store.backend = StoreBackend::Memory;
        config.llm.api_key = Some("sk-test".to_string());
        config.llm.base_url = llm_base_url.to_string();

        let provider = Arc::new(OpenAIClient::new(
            "sk-test".to_string(),
            Some(llm_base_url.to_string()),
            config.llm.model.clone(),
        ));
        build_router(Arc::new(AppState::new(config, store, provider)))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let app = app("http://127.0.0.1:9");
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_chat_rejects_empty_message_list() {
        let mut server = mockito::Server::new_async().await;
        let upstream = server
            .mock("POST", "/chat/completions")
            .expect(0)
            .create_async()
            .await;
        let app = app(&server.url());

        let (status, body) = send(&app, "POST", "/api/openai", Some(json!({"messages": []}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Ungültige Nachrichtenstruktur");

        let (status, body) = send(&app, "POST", "/api/chat", Some(json!({"text": "Hallo"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        upstream.assert_async().await;
    }

    #[tokio::test]
    async fn test_chat_returns_first_choice() {
        let mut server = mockito::Server::new_async().await;
        let upstream = server
            .mock("POST", "/chat/completions")
            .match_body(Matcher::PartialJson(json!({
                "messages": [
                    {"role": "system"},
                    {"role": "user", "content": "Mein Passwort ist abgelaufen"}
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"choices": [{"message": {"role": "assistant", "content": "Bitte nutzen Sie das Self-Service-Portal."}}]})
                    .to_string(),
            )
            .create_async()
            .await;
        let app = app(&server.url());

        let (status, body) = send(
            &app,
            "POST",
            "/api/openai",
            Some(json!({"messages": [{"role": "user", "content": "Mein Passwort ist abgelaufen"}]})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["content"], "Bitte nutzen Sie das Self-Service-Portal.");
        upstream.assert_async().await;
    }

    #[tokio::test]
    async fn test_chat_upstream_failure_is_500() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body(r#"{"error":{"message":"Incorrect API key provided"}}"#)
            .create_async()
            .await;
        let app = app(&server.url());

        let (status, body) = send(
            &app,
            "POST",
            "/api/openai",
            Some(json!({"messages": [{"role": "user", "content": "Hallo"}]})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Incorrect API key provided");
    }

    #[tokio::test]
    async fn test_ticket_lifecycle_over_http() {
        let app = app("http://127.0.0.1:9");

        let (status, body) = send(&app, "GET", "/api/tickets", None).await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<i64> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![2, 1]);

        let (status, body) = send(&app, "PUT", "/api/tickets/1/read", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["is_read"], true);

        let (status, body) =
            send(&app, "PUT", "/api/tickets/1/claim", Some(json!({"staff": "Anna"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "inProgress");
        assert_eq!(body["assigned_to"], "Anna");

        let (status, body) =
            send(&app, "PUT", "/api/tickets/1/claim", Some(json!({"staff": "Ben"}))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].is_string());

        let (status, body) = send(
            &app,
            "POST",
            "/api/tickets/1/comments",
            Some(json!({"author": "Anna", "text": "Zugang zurückgesetzt"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let texts: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["text"].as_str().unwrap())
            .collect();
        assert_eq!(texts, vec!["Ticket übernommen von Anna", "Zugang zurückgesetzt"]);

        let (status, body) = send(&app, "GET", "/api/tickets/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["images"], json!(["https://cdn.example.com/vpn.png"]));
        assert_eq!(body["comments"].as_array().unwrap().len(), 2);
        assert_eq!(body["status_label"], "In Bearbeitung");

        let (status, body) =
            send(&app, "PUT", "/api/tickets/1/complete", Some(json!({"staff": "Anna"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "completed");

        let (status, body) = send(&app, "GET", "/api/tickets/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["completed"], 2);
    }

    #[tokio::test]
    async fn test_delete_and_missing_ticket() {
        let app = app("http://127.0.0.1:9");

        let (status, _) = send(&app, "DELETE", "/api/tickets/2", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(&app, "GET", "/api/tickets", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_array().unwrap().iter().all(|t| t["id"] != 2));

        let (status, body) = send(&app, "GET", "/api/tickets/2", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_malformed_bodies_are_json_400() {
        let app = app("http://127.0.0.1:9");

        let (status, body) = send(&app, "PUT", "/api/tickets/1/claim", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, body) = send(
            &app,
            "POST",
            "/api/tickets/1/comments",
            Some(json!({"author": "Anna"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/api/tickets/1/complete")
                    .body(Body::from("staff=Anna"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].is_string());

        let (_, ticket) = send(&app, "GET", "/api/tickets/1", None).await;
        assert_eq!(ticket["ticket"]["status"], "new");
    }

    #[tokio::test]
    async fn test_blank_comment_is_400() {
        let app = app("http://127.0.0.1:9");
        let (status, _) = send(
            &app,
            "POST",
            "/api/tickets/1/comments",
            Some(json!({"author": "Anna", "text": "   "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
