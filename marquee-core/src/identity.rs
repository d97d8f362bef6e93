use marquee_shared::Redacted;
use serde::{Deserialize, Serialize};

/// Claims carried by a session token issued by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub user_id: i32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
    pub exp: usize,
    #[serde(default)]
    pub iat: usize,
}

/// A verified user, as resolved from the user directory.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserProfile {
    pub user_id: i32,
    pub name: String,
    pub email: Redacted<String>,
    pub is_admin: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_debug_hides_email() {
        let user = UserProfile {
            user_id: 1,
            name: "Asha Rao".to_string(),
            email: Redacted::new("asha@example.com".to_string()),
            is_admin: false,
        };
        assert!(!format!("{:?}", user).contains("asha@example.com"));
    }
}
