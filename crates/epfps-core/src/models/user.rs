use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Teacher,
    Student,
    Parent,
    #[serde(other)]
    Unknown,
}

impl UserRole {
    pub fn display_name(&self) -> &'static str {
        match self {
            UserRole::Admin => "Administrator",
            UserRole::Teacher => "Teacher",
            UserRole::Student => "Student",
            UserRole::Parent => "Parent",
            UserRole::Unknown => "Unknown",
        }
    }
}

/// Identity returned by sign-in and mirrored locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPayload {
    #[serde(alias = "userId")]
    pub user_id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    pub role: UserRole,
    #[serde(alias = "accessToken")]
    pub access_token: String,
    #[serde(default, alias = "expiresAt")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl SessionPayload {
    /// A payload without an expiry never expires locally; the server still decides.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| now >= at).unwrap_or(false)
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

/// Profile fetched after sign-in for dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedUserInfo {
    #[serde(alias = "userId")]
    pub user_id: String,
    #[serde(alias = "firstName")]
    pub first_name: String,
    #[serde(alias = "lastName")]
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub role: UserRole,
    #[serde(default, alias = "schoolName")]
    pub school_name: Option<String>,
    #[serde(default, alias = "academicYear")]
    pub academic_year: Option<String>,
    #[serde(default, alias = "avatarPath")]
    pub avatar_path: Option<String>,
}

impl DetailedUserInfo {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn payload(expires_at: Option<DateTime<Utc>>) -> SessionPayload {
        SessionPayload {
            user_id: "u-1".into(),
            email: "a.mballa@epfps.cm".into(),
            name: None,
            role: UserRole::Teacher,
            access_token: "tok".into(),
            expires_at,
        }
    }

    #[test]
    fn test_is_expired() {
        let now = Utc::now();
        assert!(!payload(None).is_expired(now));
        assert!(!payload(Some(now + Duration::minutes(5))).is_expired(now));
        assert!(payload(Some(now - Duration::minutes(5))).is_expired(now));
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let mut p = payload(None);
        assert_eq!(p.display_name(), "a.mballa@epfps.cm");
        p.name = Some("Alice Mballa".into());
        assert_eq!(p.display_name(), "Alice Mballa");
    }

    #[test]
    fn test_deserialize_camel_case_payload() {
        let p: SessionPayload = serde_json::from_value(json!({
            "userId": "42",
            "email": "x@y.z",
            "role": "student",
            "accessToken": "abc"
        }))
        .unwrap();
        assert_eq!(p.user_id, "42");
        assert_eq!(p.role, UserRole::Student);
        assert_eq!(p.expires_at, None);
    }

    #[test]
    fn test_unknown_role() {
        let role: UserRole = serde_json::from_value(json!("bursar")).unwrap();
        assert_eq!(role, UserRole::Unknown);
    }

    #[test]
    fn test_full_name() {
        let info = DetailedUserInfo {
            user_id: "1".into(),
            first_name: "Alice".into(),
            last_name: "Mballa".into(),
            email: "x@y.z".into(),
            phone: None,
            role: UserRole::Admin,
            school_name: None,
            academic_year: None,
            avatar_path: None,
        };
        assert_eq!(info.full_name(), "Alice Mballa");
    }
}
