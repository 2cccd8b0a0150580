//! Staleness evaluation
//!
//! A user is stale when they never signed in, or when the time elapsed since
//! their last sign-in exceeds the threshold. A sign-in exactly `threshold`
//! days ago is still fresh; one second more is stale. The reported day count
//! is the number of whole days elapsed.

use chrono::{DateTime, Duration, Utc};

use super::types::{DaysStale, IamUser, LastLogin, StaleUserRecord};

/// Whole days between `last_login` and `now`; future sign-ins count as zero
pub fn days_since(last_login: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    now.signed_duration_since(last_login).num_days().max(0)
}

/// Produce a finding for `user` if it is stale at `now`
pub fn evaluate(
    user: &IamUser,
    threshold_days: u32,
    now: DateTime<Utc>,
) -> Option<StaleUserRecord> {
    let days_stale = match user.last_login {
        LastLogin::Never => DaysStale::Never,
        LastLogin::At(at) => {
            if now.signed_duration_since(at) <= Duration::days(i64::from(threshold_days)) {
                return None;
            }
            DaysStale::Days(days_since(at, now))
        }
    };

    Some(StaleUserRecord {
        user_name: user.user_name.clone(),
        account_id: user.account_id.clone(),
        days_stale,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn logged_in(days_ago: i64) -> IamUser {
        IamUser::new("bob", "111111111111", LastLogin::At(now() - Duration::days(days_ago)))
    }

    #[test]
    fn test_never_logged_in_is_always_stale() {
        let user = IamUser::new("alice", "111111111111", LastLogin::Never);

        for threshold in [1, 5, 90, 3650] {
            let record = evaluate(&user, threshold, now()).unwrap();
            assert_eq!(record.days_stale, DaysStale::Never);
            assert_eq!(record.user_name, "alice");
            assert_eq!(record.account_id, "111111111111");
        }
    }

    #[test]
    fn test_exactly_threshold_is_not_stale() {
        assert!(evaluate(&logged_in(5), 5, now()).is_none());
        assert!(evaluate(&logged_in(90), 90, now()).is_none());
    }

    #[test]
    fn test_threshold_plus_one_is_stale() {
        let record = evaluate(&logged_in(6), 5, now()).unwrap();
        assert_eq!(record.days_stale, DaysStale::Days(6));

        let record = evaluate(&logged_in(91), 90, now()).unwrap();
        assert_eq!(record.days_stale, DaysStale::Days(91));
    }

    #[test]
    fn test_any_time_past_threshold_is_stale() {
        let just_over = IamUser::new(
            "bob",
            "111111111111",
            LastLogin::At(now() - Duration::days(5) - Duration::seconds(1)),
        );
        let record = evaluate(&just_over, 5, now()).unwrap();
        assert_eq!(record.days_stale, DaysStale::Days(5));

        let almost_six = IamUser::new(
            "bob",
            "111111111111",
            LastLogin::At(now() - Duration::days(5) - Duration::hours(23)),
        );
        let record = evaluate(&almost_six, 5, now()).unwrap();
        assert_eq!(record.days_stale, DaysStale::Days(5));

        assert!(evaluate(&logged_in(5), 5, now()).is_none());
    }

    #[test]
    fn test_recent_login_is_not_stale() {
        assert!(evaluate(&logged_in(0), 5, now()).is_none());
        assert!(evaluate(&logged_in(2), 5, now()).is_none());
    }

    #[test]
    fn test_future_login_counts_as_zero_days() {
        let user = IamUser::new(
            "skewed",
            "111111111111",
            LastLogin::At(now() + Duration::hours(3)),
        );
        assert_eq!(days_since(now() + Duration::hours(3), now()), 0);
        assert!(evaluate(&user, 1, now()).is_none());
    }
}
