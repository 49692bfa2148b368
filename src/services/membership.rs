use chrono::{FixedOffset, Utc};
use serde_json::{json, Value};

use crate::error::AppError;
use crate::models::membership::{ContactSummary, MembershipRequest, OpportunitySummary};
use crate::services::clerk::IdentityApi;
use crate::services::dates::{crm_date, display_date, membership_end_date, membership_start_date};
use crate::services::pricing::membership_price;
use crate::services::salesforce::CrmApi;

/// Completed signup, as returned to the SPA.
#[derive(Debug)]
pub struct MembershipOutcome {
    pub contact: ContactSummary,
    pub opportunity: OpportunitySummary,
    pub clerk_user_created: bool,
}

/// A failure inside the staged part of the saga. The stage tag and the id of
/// any already-created contact travel with the error so the response body can
/// tell an operator where the signup stopped.
#[derive(Debug)]
pub struct SagaFailure {
    pub stage: &'static str,
    pub contact_id: Option<String>,
    pub source: AppError,
}

#[derive(Debug)]
pub enum MembershipError {
    /// Rejected before any external call (validation or derived-value
    /// failure); a plain error response with no stage context.
    Invalid(AppError),
    Stage(SagaFailure),
}

fn stage_failure(
    stage: &'static str,
    contact_id: Option<String>,
) -> impl FnOnce(AppError) -> MembershipError {
    move |source| {
        MembershipError::Stage(SagaFailure {
            stage,
            contact_id,
            source,
        })
    }
}

fn set_opt(fields: &mut Value, key: &str, value: &Option<String>) {
    if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
        fields[key] = json!(v);
    }
}

/// Execute the signup transaction. Payment confirmation happened client-side
/// before this runs; the saga only records the membership and provisions the
/// member's account.
///
/// Stages run strictly in sequence:
/// 1. Contact — create, then re-fetch for the CRM-assigned AccountId. A
///    failure aborts; there is nothing to roll back.
/// 2. Opportunity — a failure aborts and reports the contact id. The contact
///    is left standing so staff can attach the membership manually.
/// 3. Clerk account — a failure is logged and tolerated; the membership
///    stands with the account marked pending setup.
/// 4. Back-reference patch — best effort; a failure never demotes stage 3's
///    result.
pub async fn create_membership<C, I>(
    crm: &C,
    identity: &I,
    offset: FixedOffset,
    request: MembershipRequest,
) -> Result<MembershipOutcome, MembershipError>
where
    C: CrmApi,
    I: IdentityApi,
{
    let m = request.validate().map_err(MembershipError::Invalid)?;

    let amount = membership_price(m.level, m.term);
    let start = membership_start_date(Utc::now(), offset);
    let end = membership_end_date(start, m.term).ok_or_else(|| {
        MembershipError::Invalid(AppError::Internal(format!(
            "membership end date overflow from {start}"
        )))
    })?;
    let start_iso = crm_date(start);
    let end_iso = crm_date(end);
    let opportunity_name = format!(
        "{} {} - {} {}",
        m.first_name,
        m.last_name,
        m.level.as_str(),
        display_date(start)
    );

    // Stage 1: contact
    let mut contact_fields = json!({
        "FirstName": m.first_name,
        "LastName": m.last_name,
        "Email": m.email,
        "Email_Opt_In__c": m.email_opt_in,
    });
    set_opt(&mut contact_fields, "Phone", &m.phone);
    set_opt(&mut contact_fields, "MailingStreet", &m.street);
    set_opt(&mut contact_fields, "MailingCity", &m.city);
    set_opt(&mut contact_fields, "MailingState", &m.state);
    set_opt(&mut contact_fields, "MailingPostalCode", &m.postal_code);
    set_opt(&mut contact_fields, "Stripe_Customer_ID__c", &m.stripe_customer_id);

    let contact_id = crm
        .create_contact(&contact_fields)
        .await
        .map_err(stage_failure("contact", None))?;

    let contact = crm
        .get_contact(&contact_id)
        .await
        .map_err(stage_failure("contact", Some(contact_id.clone())))?;
    let account_id = contact["AccountId"].as_str().map(str::to_string);

    // Stage 2: opportunity
    let mut opportunity_fields = json!({
        "Name": opportunity_name,
        "ContactId": contact_id,
        "Amount": amount,
        "StageName": "Closed Won",
        "CloseDate": start_iso,
        "Membership_Start_Date__c": start_iso,
        "Membership_End_Date__c": end_iso,
    });
    set_opt(&mut opportunity_fields, "AccountId", &account_id);
    set_opt(
        &mut opportunity_fields,
        "Stripe_Payment_Intent_ID__c",
        &m.stripe_payment_intent_id,
    );
    set_opt(
        &mut opportunity_fields,
        "Stripe_Payment_Method_ID__c",
        &m.stripe_payment_method_id,
    );
    if let Some(net) = m.net_amount {
        opportunity_fields["Net_Amount__c"] = json!(net);
    }
    if let Some(fee) = m.processing_fee {
        opportunity_fields["Processing_Fee__c"] = json!(fee);
    }

    let opportunity_id = crm
        .create_opportunity(&opportunity_fields)
        .await
        .map_err(stage_failure("opportunity", Some(contact_id.clone())))?;

    // Stage 3: Clerk account — tolerated failure
    let clerk_user_id = match identity
        .create_user(&m.email, &m.first_name, &m.last_name, None)
        .await
    {
        Ok(id) => Some(id),
        Err(err) => {
            tracing::warn!("Clerk account creation failed for contact {contact_id}, membership stands: {err}");
            None
        }
    };

    // Stage 4: back-reference — best effort
    if let Some(user_id) = &clerk_user_id {
        if let Err(err) = crm
            .update_contact(&contact_id, &json!({ "Clerk_User_ID__c": user_id }))
            .await
        {
            tracing::warn!("Failed to link Clerk user {user_id} to contact {contact_id}: {err}");
        }
    }

    Ok(MembershipOutcome {
        clerk_user_created: clerk_user_id.is_some(),
        contact: ContactSummary {
            id: contact_id,
            first_name: m.first_name,
            last_name: m.last_name,
            email: m.email,
            account_id,
            clerk_user_id,
        },
        opportunity: OpportunitySummary {
            id: opportunity_id,
            name: opportunity_name,
            amount,
            membership_start_date: start_iso,
            membership_end_date: end_iso,
        },
    })
}
