//! Session lifecycle: ownership, quota, idea intake, and the research and
//! analysis runs that hang off a session.

mod service;

pub use service::{ResearchStatus, ResearchTypeStatus, SessionService};

use serde::{Deserialize, Serialize};

/// Sessions a member level may create over the account lifetime; `None` is unlimited.
pub fn session_limit(member_level: i64) -> Option<u32> {
    match member_level {
        i64::MIN..=0 => Some(2),
        1 => Some(5),
        _ => None,
    }
}

/// Quota view for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaInfo {
    pub member_level: i64,
    /// Sessions created so far, drafts included.
    pub used: u32,
    pub limit: Option<u32>,
    pub remaining: Option<u32>,
    pub can_create: bool,
}

impl QuotaInfo {
    pub fn new(member_level: i64, used: u32) -> Self {
        let limit = session_limit(member_level);
        Self {
            member_level,
            used,
            limit,
            remaining: limit.map(|l| l.saturating_sub(used)),
            can_create: limit.map_or(true, |l| used < l),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_tier_allows_two() {
        assert!(QuotaInfo::new(0, 0).can_create);
        assert!(QuotaInfo::new(0, 1).can_create);
        let full = QuotaInfo::new(0, 2);
        assert!(!full.can_create);
        assert_eq!(full.limit, Some(2));
        assert_eq!(full.remaining, Some(0));
    }

    #[test]
    fn test_basic_tier_allows_five() {
        assert!(QuotaInfo::new(1, 4).can_create);
        assert!(!QuotaInfo::new(1, 5).can_create);
    }

    #[test]
    fn test_level_two_and_above_unlimited() {
        for level in [2, 3, 10] {
            let quota = QuotaInfo::new(level, 10_000);
            assert!(quota.can_create);
            assert_eq!(quota.limit, None);
            assert_eq!(quota.remaining, None);
        }
    }

    #[test]
    fn test_negative_level_treated_as_free() {
        assert_eq!(session_limit(-1), Some(2));
    }

    #[test]
    fn test_over_limit_saturates() {
        assert_eq!(QuotaInfo::new(0, 7).remaining, Some(0));
    }
}
