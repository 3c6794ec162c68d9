//! Per-user profile document (`users/{uid}`).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::Identity;

/// Email stored when the identity provider reports none.
pub const UNKNOWN_EMAIL: &str = "unknown@example.com";
/// Display name used when no email is available to derive one from.
pub const FALLBACK_DISPLAY_NAME: &str = "User";

/// Access level of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// Learner profile: progress counters and display information.
///
/// Created lazily on first successful sign-in and never deleted by the app.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub uid: String,

    pub email: String,

    #[serde(rename = "displayName")]
    pub display_name: Option<String>,

    #[serde(rename = "totalXP")]
    pub total_xp: u32,

    #[serde(rename = "currentStreak")]
    pub current_streak: u32,

    pub role: Role,

    /// Last day a lesson was completed, used to advance the streak.
    #[serde(rename = "lastActivityDate", skip_serializing_if = "Option::is_none")]
    pub last_activity_date: Option<NaiveDate>,
}

impl UserProfile {
    /// Builds the profile provisioned for a first sign-in.
    pub fn default_for(identity: &Identity) -> Self {
        Self {
            uid: identity.uid.as_str().to_string(),
            email: identity
                .email
                .clone()
                .unwrap_or_else(|| UNKNOWN_EMAIL.to_string()),
            display_name: Some(default_display_name(identity.email.as_deref())),
            total_xp: 0,
            current_streak: 0,
            role: Role::User,
            last_activity_date: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Applies a completed lesson: adds its XP and advances the daily streak.
    ///
    /// Completing more lessons on the same day keeps the streak; completing
    /// one on the following day extends it; any longer gap restarts it at 1.
    pub fn record_completion(&mut self, xp_award: u32, today: NaiveDate) {
        self.total_xp = self.total_xp.saturating_add(xp_award);
        self.current_streak = next_streak(self.current_streak, self.last_activity_date, today);
        self.last_activity_date = Some(today);
    }
}

/// Streak value after activity on `today`.
pub fn next_streak(current: u32, last_activity: Option<NaiveDate>, today: NaiveDate) -> u32 {
    match last_activity {
        Some(last) if last == today => current.max(1),
        Some(last) if last.succ_opt() == Some(today) => current.saturating_add(1),
        _ => 1,
    }
}

/// Derives a display name from the local part of an email address.
///
/// `amina.el_idrissi@example.com` becomes `Amina el idrissi`.
pub fn default_display_name(email: Option<&str>) -> String {
    let local = match email.and_then(|e| e.split('@').next()) {
        Some(local) if !local.trim().is_empty() => local,
        _ => return FALLBACK_DISPLAY_NAME.to_string(),
    };
    let spaced = local.replace(['.', '_'], " ");
    let spaced = spaced.trim();
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => FALLBACK_DISPLAY_NAME.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;
    use proptest::prelude::*;

    fn identity(email: Option<&str>) -> Identity {
        Identity::new(UserId::new("uid-1").unwrap(), email.map(str::to_string), None)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn display_name_comes_from_email_local_part() {
        assert_eq!(default_display_name(Some("amina.el_idrissi@example.com")), "Amina el idrissi");
        assert_eq!(default_display_name(Some("omar@example.com")), "Omar");
    }

    #[test]
    fn display_name_falls_back_without_email() {
        assert_eq!(default_display_name(None), "User");
        assert_eq!(default_display_name(Some("@example.com")), "User");
    }

    #[test]
    fn default_profile_starts_at_zero() {
        let profile = UserProfile::default_for(&identity(Some("omar@example.com")));

        assert_eq!(profile.uid, "uid-1");
        assert_eq!(profile.email, "omar@example.com");
        assert_eq!(profile.display_name.as_deref(), Some("Omar"));
        assert_eq!(profile.total_xp, 0);
        assert_eq!(profile.current_streak, 0);
        assert_eq!(profile.role, Role::User);
    }

    #[test]
    fn default_profile_without_email_uses_placeholder() {
        let profile = UserProfile::default_for(&identity(None));
        assert_eq!(profile.email, UNKNOWN_EMAIL);
        assert_eq!(profile.display_name.as_deref(), Some("User"));
    }

    #[test]
    fn decodes_wire_field_names() {
        let profile: UserProfile = serde_json::from_value(serde_json::json!({
            "uid": "u1",
            "email": "a@b.com",
            "displayName": "A",
            "totalXP": 40,
            "currentStreak": 3,
            "role": "admin",
            "lastActivityDate": "2026-03-04"
        }))
        .unwrap();

        assert_eq!(profile.total_xp, 40);
        assert!(profile.is_admin());
        assert_eq!(profile.last_activity_date, Some(day(4)));
    }

    #[test]
    fn completion_on_consecutive_days_extends_streak() {
        let mut profile = UserProfile::default_for(&identity(Some("a@b.com")));

        profile.record_completion(10, day(1));
        profile.record_completion(5, day(1));
        profile.record_completion(10, day(2));

        assert_eq!(profile.total_xp, 25);
        assert_eq!(profile.current_streak, 2);
        assert_eq!(profile.last_activity_date, Some(day(2)));
    }

    #[test]
    fn gap_in_activity_restarts_streak() {
        assert_eq!(next_streak(7, Some(day(1)), day(3)), 1);
        assert_eq!(next_streak(0, None, day(3)), 1);
    }

    proptest! {
        #[test]
        fn display_name_never_blank(email in "[a-z._]{0,12}@[a-z]{1,8}\\.com") {
            let name = default_display_name(Some(&email));
            prop_assert!(!name.trim().is_empty());
            prop_assert!(!name.contains('@'));
        }

        #[test]
        fn streak_is_at_least_one_after_activity(current in 0u32..1000, gap in 0i64..5) {
            let today = day(10);
            let last = today - chrono::Duration::days(gap);
            prop_assert!(next_streak(current, Some(last), today) >= 1);
        }
    }
}
