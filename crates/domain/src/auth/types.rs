use std::fmt;

use serde::{Deserialize, Serialize};

/// Logged-in clinician. Replaced wholesale on every login.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<String>,
}

#[derive(Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<String>,
}

impl Registration {
    /// Blank optional fields are sent as absent.
    pub fn normalized(mut self) -> Self {
        self.phone = self.phone.filter(|p| !p.trim().is_empty());
        self.registration_number = self.registration_number.filter(|r| !r.trim().is_empty());
        self
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("phone", &self.phone)
            .field("registration_number", &self.registration_number)
            .finish()
    }
}

/// Body returned by both login and register.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct AuthResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub user: Option<UserProfile>,
    #[serde(default)]
    pub detail: Option<String>,
}

impl AuthResponse {
    pub fn accepted(access_token: impl Into<String>, user: UserProfile) -> Self {
        Self {
            success: true,
            access_token: Some(access_token.into()),
            user: Some(user),
            detail: None,
        }
    }
}

/// Which form the auth screen is showing.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    #[default]
    Login,
    Register,
}

impl AuthMode {
    pub fn success_message(self) -> &'static str {
        match self {
            AuthMode::Login => "Logged in successfully!",
            AuthMode::Register => "Account created successfully!",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_user_parses() {
        let user: UserProfile = serde_json::from_str(r#"{"id":1,"name":"Dr. A"}"#).unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(user.name, "Dr. A");
        assert!(user.email.is_empty());
        assert_eq!(user.registration_number, None);
    }

    #[test]
    fn passwords_stay_out_of_debug_output() {
        let creds = Credentials::new("a@b.c", "hunter2");
        assert!(!format!("{:?}", creds).contains("hunter2"));

        let reg = Registration {
            password: "hunter2".to_string(),
            ..Default::default()
        };
        assert!(!format!("{:?}", reg).contains("hunter2"));
    }

    #[test]
    fn blank_optionals_are_dropped() {
        let reg = Registration {
            name: "Dr. A".to_string(),
            email: "a@b.c".to_string(),
            password: "pw".to_string(),
            phone: Some("  ".to_string()),
            registration_number: Some("MH-1".to_string()),
        }
        .normalized();

        let body = serde_json::to_value(&reg).unwrap();
        assert!(body.get("phone").is_none());
        assert_eq!(body["registration_number"], "MH-1");
    }
}
