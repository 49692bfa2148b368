use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::error::AppResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntentRequest {
    pub amount: f64,
    pub email: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

pub async fn create_payment_intent(
    State(state): State<AppState>,
    Json(body): Json<CreatePaymentIntentRequest>,
) -> AppResult<Json<Value>> {
    let metadata: Vec<(String, String)> = body.metadata.into_iter().collect();
    let intent = state
        .stripe
        .create_payment_intent(body.amount, &body.email, &metadata)
        .await?;
    Ok(Json(intent))
}

pub async fn get_payment_intent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let intent = state.stripe.get_payment_intent(&id).await?;
    Ok(Json(intent))
}

pub async fn create_customer(
    State(state): State<AppState>,
    Json(body): Json<CreateCustomerRequest>,
) -> AppResult<Json<Value>> {
    let metadata: Vec<(String, String)> = body.metadata.into_iter().collect();
    let customer = state
        .stripe
        .create_customer(&body.email, &body.name, &metadata)
        .await?;
    Ok(Json(customer))
}
