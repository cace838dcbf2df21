use crate::agents::ChatRequest;
use crate::chat::ChatError;
use crate::conversation::UploadedDocument;
use crate::AppState;
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/chat").route(web::post().to(chat)))
        .service(
            web::resource("/chat/conversations")
                .route(web::get().to(list_conversations))
                .route(web::post().to(create_conversation)),
        )
        .service(web::resource("/chat/conversations/{id}").route(web::delete().to(delete_conversation)))
        .service(web::resource("/chat/conversations/{id}/messages").route(web::get().to(get_messages)))
        .service(web::resource("/chat/conversations/{id}/clear").route(web::post().to(clear_conversation)))
        .service(web::resource("/chat/conversations/{id}/upload").route(web::post().to(upload_document)));
}

fn error_response(err: ChatError) -> HttpResponse {
    let body = serde_json::json!({ "error": err.to_string() });
    match err {
        ChatError::InvalidRequest(_) | ChatError::Registry(_) => HttpResponse::BadRequest().json(body),
        ChatError::Timeout(_) => HttpResponse::GatewayTimeout().json(body),
        ChatError::MalformedResponse(_) | ChatError::AgentUnavailable(_) => {
            log::error!("[CHAT] {}", err);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Internal server error"
            }))
        }
        ChatError::Unresolved(_) => HttpResponse::InternalServerError().json(body),
    }
}

async fn chat(state: web::Data<AppState>, body: web::Json<ChatRequest>) -> impl Responder {
    match state.chat.handle(body.into_inner()).await {
        Ok(message) => HttpResponse::Ok().json(message),
        Err(e) => error_response(e),
    }
}

async fn list_conversations(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "conversation_ids": state.conversations.list_ids()
    }))
}

async fn create_conversation(state: web::Data<AppState>) -> impl Responder {
    let id = state.conversations.create();
    HttpResponse::Ok().json(serde_json::json!({ "conversation_id": id }))
}

async fn get_messages(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let messages = state.conversations.messages(&path.into_inner()).await;
    HttpResponse::Ok().json(serde_json::json!({ "messages": messages }))
}

async fn clear_conversation(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let id = path.into_inner();
    state.conversations.clear(&id).await;
    HttpResponse::Ok().json(serde_json::json!({ "conversation_id": id, "cleared": true }))
}

async fn delete_conversation(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let id = path.into_inner();
    if state.conversations.delete(&id) {
        HttpResponse::Ok().json(serde_json::json!({ "conversation_id": id, "deleted": true }))
    } else {
        HttpResponse::NotFound().json(serde_json::json!({
            "error": format!("Conversation {} not found", id)
        }))
    }
}

#[derive(Debug, Deserialize)]
struct UploadRequest {
    filename: String,
    content: String,
}

async fn upload_document(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UploadRequest>,
) -> impl Responder {
    let id = path.into_inner();
    let UploadRequest { filename, content } = body.into_inner();
    if filename.trim().is_empty() || content.trim().is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "filename and content are required"
        }));
    }

    state
        .conversations
        .set_uploaded_document(&id, UploadedDocument { filename: filename.clone(), content })
        .await;
    HttpResponse::Ok().json(serde_json::json!({
        "conversation_id": id,
        "filename": filename,
        "has_uploaded_file": true
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentResponse;
    use crate::test_support::{test_app_state, ScriptedAgent};
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    fn chat_body(content: &str) -> Value {
        json!({
            "prompt": {"role": "user", "content": content},
            "conversation_id": "c1",
            "wallet_address": "0xabc",
            "chain_id": "8453"
        })
    }

    #[actix_web::test]
    async fn test_chat_returns_transport_message() {
        let (state, reasoning) = test_app_state(&[
            ScriptedAgent::success("default", "hi"),
            ScriptedAgent::success("crypto_data", "The price of bitcoin is $50,000"),
        ]);
        reasoning.push_json(Ok(r#"{"agents": ["crypto_data"]}"#.to_string()));
        let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(config)).await;

        let req = test::TestRequest::post()
            .uri("/chat")
            .set_json(chat_body("What's the price of Bitcoin?"))
            .to_request();
        let resp: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp["role"], "assistant");
        assert_eq!(resp["agentName"], "crypto_data");
        assert_eq!(resp["content"], "The price of bitcoin is $50,000");
        assert_eq!(resp["requires_action"], false);
    }

    #[actix_web::test]
    async fn test_chat_status_mapping() {
        let (state, reasoning) = test_app_state(&[
            ScriptedAgent::error("default", "down"),
            ScriptedAgent::responding("broken", AgentResponse::malformed_for_test()),
        ]);
        reasoning.push_json(Ok(r#"{"agents": ["default"]}"#.to_string()));
        let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(config)).await;

        let exhausted = test::TestRequest::post().uri("/chat").set_json(chat_body("hello")).to_request();
        assert_eq!(test::call_service(&app, exhausted).await.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let malformed = test::TestRequest::post().uri("/chat").set_json(chat_body("/broken go")).to_request();
        assert_eq!(test::call_service(&app, malformed).await.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let invalid = test::TestRequest::post()
            .uri("/chat")
            .set_json(json!({"prompt": {"role": "user", "content": "hi"}, "conversation_id": ""}))
            .to_request();
        assert_eq!(test::call_service(&app, invalid).await.status(), StatusCode::BAD_REQUEST);

        let missing_prompt = test::TestRequest::post()
            .uri("/chat")
            .set_json(json!({"conversation_id": "c1"}))
            .to_request();
        assert_eq!(test::call_service(&app, missing_prompt).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_conversation_lifecycle() {
        let (state, _) = test_app_state(&[ScriptedAgent::success("default", "hi")]);
        let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(config)).await;

        let created: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::post().uri("/chat/conversations").to_request(),
        )
        .await;
        let id = created["conversation_id"].as_str().unwrap().to_string();

        let upload = test::TestRequest::post()
            .uri(&format!("/chat/conversations/{}/upload", id))
            .set_json(json!({"filename": "notes.txt", "content": "hello"}))
            .to_request();
        assert!(test::call_service(&app, upload).await.status().is_success());

        let messages: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri(&format!("/chat/conversations/{}/messages", id))
                .to_request(),
        )
        .await;
        assert_eq!(messages["messages"].as_array().unwrap().len(), 1);

        let delete = test::TestRequest::delete()
            .uri(&format!("/chat/conversations/{}", id))
            .to_request();
        assert!(test::call_service(&app, delete).await.status().is_success());

        let again = test::TestRequest::delete()
            .uri(&format!("/chat/conversations/{}", id))
            .to_request();
        assert_eq!(test::call_service(&app, again).await.status(), StatusCode::NOT_FOUND);
    }
}
