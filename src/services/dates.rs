use chrono::{DateTime, FixedOffset, Months, NaiveDate, Utc};

use crate::models::membership::MembershipTerm;

/// Today's date in the organization's timezone. Memberships sold late in the
/// evening UTC must not start "tomorrow" from the member's point of view.
pub fn membership_start_date(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}

/// Calendar end date for a membership: start + 1 month or + 1 year, clamped
/// to the last day of the target month (Jan 31 + 1 month is the end of
/// February; Feb 29 + 1 year is Feb 28 outside leap years).
///
/// `None` only when the date arithmetic overflows chrono's range.
pub fn membership_end_date(start: NaiveDate, term: MembershipTerm) -> Option<NaiveDate> {
    let months = match term {
        MembershipTerm::Month => 1,
        MembershipTerm::Year => 12,
    };
    start.checked_add_months(Months::new(months))
}

/// Date format the CRM expects for date fields.
pub fn crm_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Date format used in derived opportunity names.
pub fn display_date(date: NaiveDate) -> String {
    date.format("%m/%d/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn start_date_respects_fixed_offset() {
        // 03:30 UTC on Jan 1 is still Dec 31 at UTC-8.
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 3, 30, 0).unwrap();
        let pacific = FixedOffset::east_opt(-8 * 3600).unwrap();
        assert_eq!(membership_start_date(now, pacific), date(2024, 12, 31));

        let utc = FixedOffset::east_opt(0).unwrap();
        assert_eq!(membership_start_date(now, utc), date(2025, 1, 1));
    }

    #[test]
    fn monthly_end_date_is_next_month() {
        assert_eq!(
            membership_end_date(date(2025, 3, 15), MembershipTerm::Month),
            Some(date(2025, 4, 15))
        );
    }

    #[test]
    fn monthly_end_date_clamps_to_end_of_month() {
        assert_eq!(
            membership_end_date(date(2025, 1, 31), MembershipTerm::Month),
            Some(date(2025, 2, 28))
        );
        // Leap year February keeps the 29th.
        assert_eq!(
            membership_end_date(date(2024, 1, 31), MembershipTerm::Month),
            Some(date(2024, 2, 29))
        );
    }

    #[test]
    fn annual_end_date_is_next_year() {
        assert_eq!(
            membership_end_date(date(2025, 6, 1), MembershipTerm::Year),
            Some(date(2026, 6, 1))
        );
    }

    #[test]
    fn leap_day_plus_one_year_clamps_to_feb_28() {
        assert_eq!(
            membership_end_date(date(2024, 2, 29), MembershipTerm::Year),
            Some(date(2025, 2, 28))
        );
    }

    #[test]
    fn serialization_formats() {
        assert_eq!(crm_date(date(2025, 7, 4)), "2025-07-04");
        assert_eq!(display_date(date(2025, 7, 4)), "07/04/2025");
    }
}
