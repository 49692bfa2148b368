use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::services::salesforce::CrmApi;
use crate::AppState;

pub async fn create_opportunity(
    State(state): State<AppState>,
    Json(fields): Json<Value>,
) -> AppResult<Json<Value>> {
    let id = state.salesforce.create_opportunity(&fields).await?;
    Ok(Json(json!({ "success": true, "id": id })))
}

pub async fn list_for_contact(
    State(state): State<AppState>,
    Path(contact_id): Path<String>,
) -> AppResult<Json<Value>> {
    let opportunities = state.salesforce.opportunities_for_contact(&contact_id).await?;
    Ok(Json(json!({ "opportunities": opportunities })))
}
