use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::services::clerk::IdentityApi;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub password: Option<String>,
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> AppResult<Json<Value>> {
    let user_id = state
        .clerk
        .create_user(
            &body.email,
            &body.first_name,
            &body.last_name,
            body.password.as_deref(),
        )
        .await?;
    Ok(Json(json!({ "userId": user_id })))
}

/// Removes a Clerk account. Serves the rollback path when a CRM record could
/// not be created for an already-provisioned account; 404 when the provider
/// does not know the user.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<Value>> {
    state.clerk.delete_user(&user_id).await?;
    Ok(Json(json!({ "success": true })))
}
