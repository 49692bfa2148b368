use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::models::membership::MembershipRequest;
use crate::services::membership::{create_membership, MembershipError};
use crate::AppState;

/// `POST /api/salesforce/membership` — the server-orchestrated signup saga.
/// Payment was already confirmed client-side; this records the membership in
/// the CRM and provisions the Clerk account.
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<MembershipRequest>,
) -> Response {
    let offset = state.config.membership.utc_offset();
    match create_membership(&state.salesforce, &state.clerk, offset, request).await {
        Ok(out) => (
            StatusCode::CREATED,
            Json(json!({
                "success": true,
                "contact": out.contact,
                "opportunity": out.opportunity,
                "clerkUserCreated": out.clerk_user_created,
            })),
        )
            .into_response(),
        Err(MembershipError::Invalid(err)) => err.into_response(),
        Err(MembershipError::Stage(failure)) => {
            tracing::error!(
                "Membership signup failed at stage {}: {}",
                failure.stage,
                failure.source
            );
            let mut body = json!({
                "error": failure.source.message(),
                "stage": failure.stage,
            });
            if let Some(contact_id) = failure.contact_id {
                body["contactId"] = json!(contact_id);
            }
            (failure.source.status(), Json(body)).into_response()
        }
    }
}
