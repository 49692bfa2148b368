use crate::models::membership::{MembershipLevel, MembershipTerm};

/// Fixed membership pricing in whole dollars. The level/term domains are
/// established during validation, so every combination is covered here.
pub fn membership_price(level: MembershipLevel, term: MembershipTerm) -> u32 {
    use MembershipLevel::*;
    use MembershipTerm::*;
    match (level, term) {
        (Bronze, Month) => 5,
        (Bronze, Year) => 50,
        (Silver, Month) => 10,
        (Silver, Year) => 100,
        (Gold, Month) => 25,
        (Gold, Year) => 250,
    }
}
