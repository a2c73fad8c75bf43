use actix_web::body::to_bytes;
use actix_web::ResponseError;

use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind, ValidationKind};
use crate::{AppError, ErrorCode};

#[test]
fn maps_validation_to_422() {
    let de = DomainError::validation(ValidationKind::InvalidQuantity, "order must be >= 0");
    let app: AppError = de.into();
    assert_eq!(app.code(), ErrorCode::InvalidQuantity);
    assert_eq!(app.status().as_u16(), 422);
}

#[test]
fn invariant_violation_is_a_server_error() {
    let de = DomainError::validation(ValidationKind::InvariantViolation, "queue drained");
    let app: AppError = de.into();
    assert_eq!(app.code(), ErrorCode::InvariantViolation);
    assert_eq!(app.status().as_u16(), 500);
}

#[test]
fn maps_conflicts() {
    let app: AppError = DomainError::conflict(ConflictKind::UsernameInUse, "alice").into();
    assert_eq!(app.code().as_str(), "USERNAME_IN_USE");
    assert_eq!(app.status().as_u16(), 409);

    let other = DomainError::conflict(ConflictKind::Other("x".into()), "generic");
    let app: AppError = other.into();
    assert_eq!(app.code(), ErrorCode::Conflict);
}

#[test]
fn maps_not_found() {
    let app: AppError = DomainError::not_found(NotFoundKind::Group, "group 9").into();
    assert_eq!(app.code().as_str(), "GROUP_NOT_FOUND");
    assert_eq!(app.status().as_u16(), 404);
}

#[actix_web::test]
async fn problem_details_shape() {
    let app = AppError::invalid(ErrorCode::PhaseMismatch, "game not running");
    let resp = app.error_response();
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "application/problem+json"
    );
    let body = to_bytes(resp.into_body()).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["code"], "PHASE_MISMATCH");
    assert_eq!(json["title"], "Phase Mismatch");
    assert_eq!(json["status"], 422);
    assert_eq!(json["trace_id"], "unknown");
}
