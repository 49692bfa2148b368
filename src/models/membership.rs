use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipLevel {
    Bronze,
    Silver,
    Gold,
}

impl MembershipLevel {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bronze" => Some(Self::Bronze),
            "silver" => Some(Self::Silver),
            "gold" => Some(Self::Gold),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bronze => "Bronze",
            Self::Silver => "Silver",
            Self::Gold => "Gold",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipTerm {
    Month,
    Year,
}

impl MembershipTerm {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "monthly" => Some(Self::Month),
            "annual" => Some(Self::Year),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Month => "Month",
            Self::Year => "Year",
        }
    }
}

/// Raw signup request as posted by the SPA.
///
/// Every field is optional at the serde layer: the saga's validation owns the
/// missing-field error messages and their ordering, and `emailOptIn` must be
/// rejected with a specific message when it is present but not a boolean.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MembershipRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub email_opt_in: Option<Value>,
    pub membership_level: Option<String>,
    pub membership_term: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub stripe_payment_intent_id: Option<String>,
    pub stripe_payment_method_id: Option<String>,
    pub net_amount: Option<f64>,
    pub processing_fee: Option<f64>,
}

/// A membership request that passed validation. Field presence and the
/// level/term domains are established, so downstream code never re-checks.
#[derive(Debug, Clone)]
pub struct ValidatedMembership {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub email_opt_in: bool,
    pub level: MembershipLevel,
    pub term: MembershipTerm,
    pub stripe_customer_id: Option<String>,
    pub stripe_payment_intent_id: Option<String>,
    pub stripe_payment_method_id: Option<String>,
    pub net_amount: Option<f64>,
    pub processing_fee: Option<f64>,
}

fn present(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|s| !s.trim().is_empty())
}

impl MembershipRequest {
    /// Validation order is part of the API contract: name/email first, then
    /// level/term presence, then the opt-in type check, then domain checks.
    pub fn validate(self) -> Result<ValidatedMembership, AppError> {
        if !present(&self.first_name) || !present(&self.last_name) || !present(&self.email) {
            return Err(AppError::Validation(
                "Missing required fields: firstName, lastName, email".into(),
            ));
        }
        if !present(&self.membership_level) || !present(&self.membership_term) {
            return Err(AppError::Validation(
                "Missing required fields: membershipLevel, membershipTerm".into(),
            ));
        }
        let email_opt_in = match &self.email_opt_in {
            Some(Value::Bool(b)) => *b,
            _ => {
                return Err(AppError::Validation("emailOptIn must be a boolean".into()));
            }
        };
        let level_raw = self.membership_level.as_deref().unwrap_or_default();
        let level = MembershipLevel::parse(level_raw).ok_or_else(|| {
            AppError::Validation(
                "Invalid membershipLevel: must be one of bronze, silver, gold".into(),
            )
        })?;
        let term_raw = self.membership_term.as_deref().unwrap_or_default();
        let term = MembershipTerm::parse(term_raw).ok_or_else(|| {
            AppError::Validation("Invalid membershipTerm: must be one of monthly, annual".into())
        })?;

        Ok(ValidatedMembership {
            first_name: self.first_name.unwrap_or_default(),
            last_name: self.last_name.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            phone: self.phone,
            street: self.street,
            city: self.city,
            state: self.state,
            postal_code: self.postal_code,
            email_opt_in,
            level,
            term,
            stripe_customer_id: self.stripe_customer_id,
            stripe_payment_intent_id: self.stripe_payment_intent_id,
            stripe_payment_method_id: self.stripe_payment_method_id,
            net_amount: self.net_amount,
            processing_fee: self.processing_fee,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSummary {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub account_id: Option<String>,
    pub clerk_user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunitySummary {
    pub id: String,
    pub name: String,
    pub amount: u32,
    pub membership_start_date: String,
    pub membership_end_date: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_request() -> MembershipRequest {
        MembershipRequest {
            first_name: Some("John".into()),
            last_name: Some("Doe".into()),
            email: Some("john@example.com".into()),
            email_opt_in: Some(json!(true)),
            membership_level: Some("silver".into()),
            membership_term: Some("annual".into()),
            ..Default::default()
        }
    }

    fn message(err: AppError) -> String {
        match err {
            AppError::Validation(msg) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_complete_request() {
        let m = full_request().validate().unwrap();
        assert_eq!(m.level, MembershipLevel::Silver);
        assert_eq!(m.term, MembershipTerm::Year);
        assert!(m.email_opt_in);
    }

    #[test]
    fn missing_name_fields_reported_first() {
        // Everything else is also wrong; the name/email message must win.
        let req = MembershipRequest {
            email_opt_in: Some(json!("yes")),
            membership_level: Some("platinum".into()),
            ..Default::default()
        };
        assert_eq!(
            message(req.validate().unwrap_err()),
            "Missing required fields: firstName, lastName, email"
        );
    }

    #[test]
    fn missing_level_and_term_reported_second() {
        let req = MembershipRequest {
            membership_level: None,
            membership_term: None,
            email_opt_in: Some(json!("yes")),
            ..full_request()
        };
        assert_eq!(
            message(req.validate().unwrap_err()),
            "Missing required fields: membershipLevel, membershipTerm"
        );
    }

    #[test]
    fn non_boolean_opt_in_reported_third() {
        let req = MembershipRequest {
            email_opt_in: Some(json!("true")),
            membership_level: Some("platinum".into()),
            ..full_request()
        };
        assert_eq!(
            message(req.validate().unwrap_err()),
            "emailOptIn must be a boolean"
        );
    }

    #[test]
    fn absent_opt_in_is_not_a_boolean() {
        let req = MembershipRequest {
            email_opt_in: None,
            ..full_request()
        };
        assert_eq!(
            message(req.validate().unwrap_err()),
            "emailOptIn must be a boolean"
        );
    }

    #[test]
    fn invalid_level_reported_before_invalid_term() {
        let req = MembershipRequest {
            membership_level: Some("platinum".into()),
            membership_term: Some("weekly".into()),
            ..full_request()
        };
        assert!(message(req.validate().unwrap_err()).starts_with("Invalid membershipLevel"));
    }

    #[test]
    fn invalid_term_reported_last() {
        let req = MembershipRequest {
            membership_term: Some("weekly".into()),
            ..full_request()
        };
        assert!(message(req.validate().unwrap_err()).starts_with("Invalid membershipTerm"));
    }

    #[test]
    fn level_and_term_parse_case_insensitively() {
        assert_eq!(MembershipLevel::parse("GOLD"), Some(MembershipLevel::Gold));
        assert_eq!(MembershipTerm::parse("Monthly"), Some(MembershipTerm::Month));
        assert_eq!(MembershipLevel::parse("platinum"), None);
        assert_eq!(MembershipTerm::parse("month"), None);
    }
}
