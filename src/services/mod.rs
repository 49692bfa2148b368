pub mod clerk;
pub mod dates;
pub mod membership;
pub mod pricing;
pub mod salesforce;
pub mod stripe_service;
