//! Admin HTTP surface: team setup, lifecycle control and observation.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ai::{model_catalog, CatalogEntry};
use crate::domain::participant::PlayerKind;
use crate::domain::roles::RoleKind;
use crate::domain::snapshot::{GameSnapshot, GameSummary, GroupSnapshot};
use crate::domain::state::GroupId;
use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::services::SubmitOutcome;
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    /// Slot kinds in role order, retailer first.
    pub players: Vec<PlayerKind>,
}

#[derive(Debug, Serialize)]
pub struct CreateTeamResponse {
    pub group_id: GroupId,
}

#[derive(Debug, Deserialize)]
pub struct SubmitOrderRequest {
    pub role: RoleKind,
    pub quantity: i64,
}

/// GET /api/admin/game
async fn get_game(app_state: web::Data<AppState>) -> web::Json<GameSnapshot> {
    web::Json(app_state.flow().snapshot())
}

/// GET /api/admin/models
async fn get_models(app_state: web::Data<AppState>) -> web::Json<Vec<CatalogEntry>> {
    let resolver = app_state.resolver();
    web::Json(model_catalog(|provider| resolver.has_provider(provider)))
}

/// POST /api/admin/teams
async fn create_team(
    app_state: web::Data<AppState>,
    body: web::Json<CreateTeamRequest>,
) -> Result<HttpResponse, AppError> {
    let group_id = app_state.flow().create_team(body.into_inner().players)?;
    Ok(HttpResponse::Created().json(CreateTeamResponse { group_id }))
}

/// GET /api/admin/groups/{id}
async fn get_group(
    app_state: web::Data<AppState>,
    path: web::Path<u64>,
) -> Result<web::Json<GroupSnapshot>, AppError> {
    let id = GroupId(path.into_inner());
    let state = app_state
        .flow()
        .group_state(id)
        .ok_or_else(|| AppError::not_found(ErrorCode::GroupNotFound, format!("group {id}")))?;
    Ok(web::Json(GroupSnapshot::from(&state)))
}

/// DELETE /api/admin/groups/{id}
async fn remove_group(
    app_state: web::Data<AppState>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    app_state.flow().remove_group(GroupId(path.into_inner()))?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/admin/groups/{id}/orders
///
/// Places an order on behalf of any role, human or AI.
async fn submit_order(
    app_state: web::Data<AppState>,
    path: web::Path<u64>,
    body: web::Json<SubmitOrderRequest>,
) -> Result<web::Json<SubmitOutcome>, AppError> {
    let group_id = GroupId(path.into_inner());
    let SubmitOrderRequest { role, quantity } = body.into_inner();
    info!(group_id = %group_id, role = %role, quantity, "admin order");
    let outcome = app_state.flow().submit_order(group_id, role, quantity)?;
    Ok(web::Json(outcome))
}

/// POST /api/admin/start
async fn start_game(app_state: web::Data<AppState>) -> Result<web::Json<GameSnapshot>, AppError> {
    app_state.flow().start_game()?;
    Ok(web::Json(app_state.flow().snapshot()))
}

/// POST /api/admin/reset
async fn reset_game(app_state: web::Data<AppState>) -> Result<web::Json<GameSnapshot>, AppError> {
    app_state.flow().reset_game()?;
    Ok(web::Json(app_state.flow().snapshot()))
}

/// POST /api/admin/end
async fn end_game(app_state: web::Data<AppState>) -> Result<web::Json<GameSummary>, AppError> {
    Ok(web::Json(app_state.flow().end_game()?))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::bad_request(ErrorCode::BadRequest, err.to_string()).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        AppError::bad_request(ErrorCode::BadRequest, err.to_string()).into()
    }))
    .route("/game", web::get().to(get_game))
    .route("/models", web::get().to(get_models))
    .route("/teams", web::post().to(create_team))
    .route("/groups/{id}", web::get().to(get_group))
    .route("/groups/{id}", web::delete().to(remove_group))
    .route("/groups/{id}/orders", web::post().to(submit_order))
    .route("/start", web::post().to(start_game))
    .route("/reset", web::post().to(reset_game))
    .route("/end", web::post().to(end_game));
}
