use crate::AppState;
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/agents/available").route(web::get().to(available_agents)))
        .service(
            web::resource("/agents/selected")
                .route(web::get().to(selected_agents))
                .route(web::post().to(set_selected_agents)),
        )
        .service(web::resource("/agents/commands").route(web::get().to(agent_commands)));
}

async fn available_agents(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "agents": state.registry.get_available_agents()
    }))
}

async fn selected_agents(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "agents": state.registry.get_selected_agents(),
        "active": state.registry.get_active_agent()
    }))
}

#[derive(Debug, Deserialize)]
struct SelectAgentsRequest {
    agents: Vec<String>,
}

async fn set_selected_agents(
    state: web::Data<AppState>,
    body: web::Json<SelectAgentsRequest>,
) -> impl Responder {
    match state.registry.set_selected_agents(&body.agents) {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "success",
            "agents": state.registry.get_selected_agents()
        })),
        Err(e) => HttpResponse::BadRequest().json(serde_json::json!({
            "error": e.to_string()
        })),
    }
}

async fn agent_commands(state: web::Data<AppState>) -> impl Responder {
    let commands: Vec<serde_json::Value> = state
        .registry
        .get_available_agents()
        .iter()
        .map(|d| {
            serde_json::json!({
                "command": format!("/{}", d.command),
                "name": d.human_readable_name,
                "agent": d.name,
                "description": d.description
            })
        })
        .collect();
    HttpResponse::Ok().json(serde_json::json!({ "commands": commands }))
}
