use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::services::salesforce::CrmApi;
use crate::AppState;

pub async fn create_contact(
    State(state): State<AppState>,
    Json(fields): Json<Value>,
) -> AppResult<Json<Value>> {
    let id = state.salesforce.create_contact(&fields).await?;
    Ok(Json(json!({ "success": true, "id": id })))
}

pub async fn get_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let contact = state.salesforce.get_contact(&id).await?;
    Ok(Json(contact))
}

pub async fn get_contact_by_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> AppResult<Json<Value>> {
    let contact = state
        .salesforce
        .find_contact_by_email(&email)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No contact with email {email}")))?;
    Ok(Json(contact))
}

pub async fn get_contact_by_clerk_id(
    State(state): State<AppState>,
    Path(clerk_user_id): Path<String>,
) -> AppResult<Json<Value>> {
    let contact = state
        .salesforce
        .find_contact_by_clerk_id(&clerk_user_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("No contact linked to Clerk user {clerk_user_id}"))
        })?;
    Ok(Json(contact))
}
