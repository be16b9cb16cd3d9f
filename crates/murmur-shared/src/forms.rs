//! Form payloads and their validation.
//!
//! Each form is a typed struct deserialized from a urlencoded body,
//! with a `validate()` that either yields the validated value or a
//! list of per-field errors for the client to re-render.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum length of a username.
pub const USERNAME_MAX_CHARS: usize = 30;

/// Minimum length of a password.
pub const PASSWORD_MIN_CHARS: usize = 8;

/// A single validation failure, tied to the offending field.
///
/// Errors not attributable to one field (e.g. bad credentials) use the
/// pseudo-field `__all__`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type FieldErrors = Vec<FieldError>;

fn none_if_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Payload of the post create/edit form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostFormData {
    #[serde(default)]
    pub text: String,
    /// Group id as submitted; blank means no group.
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// A post form that passed validation.
#[derive(Debug, Clone)]
pub struct ValidPost {
    pub text: String,
    pub group_id: Option<Uuid>,
    pub image: Option<String>,
}

impl PostFormData {
    pub fn validate(&self) -> Result<ValidPost, FieldErrors> {
        let mut errors = FieldErrors::new();

        let text = self.text.trim();
        if text.is_empty() {
            errors.push(FieldError::new("text", "This field is required."));
        }

        let group_id = match none_if_blank(self.group.clone()) {
            Some(raw) => match raw.parse::<Uuid>() {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.push(FieldError::new("group", "Select a valid group."));
                    None
                }
            },
            None => None,
        };

        if errors.is_empty() {
            Ok(ValidPost {
                text: text.to_string(),
                group_id,
                image: none_if_blank(self.image.clone()),
            })
        } else {
            Err(errors)
        }
    }
}

/// Payload of the comment form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentFormData {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct ValidComment {
    pub text: String,
}

impl CommentFormData {
    pub fn validate(&self) -> Result<ValidComment, FieldErrors> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(vec![FieldError::new("text", "This field is required.")]);
        }
        Ok(ValidComment {
            text: text.to_string(),
        })
    }
}

/// Payload of the signup form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignupFormData {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

#[derive(Debug, Clone)]
pub struct ValidSignup {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl SignupFormData {
    pub fn validate(&self) -> Result<ValidSignup, FieldErrors> {
        let mut errors = FieldErrors::new();

        let username = self.username.trim();
        if username.is_empty() {
            errors.push(FieldError::new("username", "This field is required."));
        } else if username.chars().count() > USERNAME_MAX_CHARS {
            errors.push(FieldError::new(
                "username",
                format!("Ensure this value has at most {USERNAME_MAX_CHARS} characters."),
            ));
        } else if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            errors.push(FieldError::new(
                "username",
                "Only letters, digits and underscores are allowed.",
            ));
        }

        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            errors.push(FieldError::new("email", "Enter a valid email address."));
        }

        if self.password1.chars().count() < PASSWORD_MIN_CHARS {
            errors.push(FieldError::new(
                "password1",
                format!("Password must be at least {PASSWORD_MIN_CHARS} characters."),
            ));
        } else if self.password1 != self.password2 {
            errors.push(FieldError::new(
                "password2",
                "The two password fields didn't match.",
            ));
        }

        if errors.is_empty() {
            Ok(ValidSignup {
                first_name: self.first_name.trim().to_string(),
                last_name: self.last_name.trim().to_string(),
                username: username.to_string(),
                email: email.to_string(),
                password: self.password1.clone(),
            })
        } else {
            Err(errors)
        }
    }
}

/// Payload of the login form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginFormData {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Destination to return to after login.
    #[serde(default)]
    pub next: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages_for<'a>(errors: &'a FieldErrors, field: &str) -> Vec<&'a str> {
        errors
            .iter()
            .filter(|e| e.field == field)
            .map(|e| e.message.as_str())
            .collect()
    }

    #[test]
    fn post_form_requires_text() {
        let form = PostFormData {
            text: "   ".into(),
            ..Default::default()
        };
        let errors = form.validate().unwrap_err();
        assert!(!messages_for(&errors, "text").is_empty());
    }

    #[test]
    fn post_form_blank_group_means_none() {
        let form = PostFormData {
            text: "hello".into(),
            group: Some(String::new()),
            image: None,
        };
        let valid = form.validate().unwrap();
        assert_eq!(valid.group_id, None);
        assert_eq!(valid.text, "hello");
    }

    #[test]
    fn post_form_rejects_malformed_group_id() {
        let form = PostFormData {
            text: "hello".into(),
            group: Some("not-a-uuid".into()),
            image: None,
        };
        let errors = form.validate().unwrap_err();
        assert!(!messages_for(&errors, "group").is_empty());
    }

    #[test]
    fn comment_form_requires_text() {
        assert!(CommentFormData::default().validate().is_err());
        assert!(
            CommentFormData {
                text: "nice post".into()
            }
            .validate()
            .is_ok()
        );
    }

    #[test]
    fn signup_rejects_bad_username() {
        let mut form = SignupFormData {
            username: "x".repeat(31),
            email: "a@b.c".into(),
            password1: "password123".into(),
            password2: "password123".into(),
            ..Default::default()
        };
        assert!(form.validate().is_err());

        form.username = "has spaces".into();
        assert!(form.validate().is_err());

        form.username = "fine_name42".into();
        assert!(form.validate().is_ok());
    }

    #[test]
    fn signup_requires_matching_passwords() {
        let form = SignupFormData {
            username: "writer".into(),
            email: "w@example.com".into(),
            password1: "password123".into(),
            password2: "password124".into(),
            ..Default::default()
        };
        let errors = form.validate().unwrap_err();
        assert!(!messages_for(&errors, "password2").is_empty());
    }

    #[test]
    fn signup_requires_min_password_length() {
        let form = SignupFormData {
            username: "writer".into(),
            email: "w@example.com".into(),
            password1: "short".into(),
            password2: "short".into(),
            ..Default::default()
        };
        let errors = form.validate().unwrap_err();
        assert!(!messages_for(&errors, "password1").is_empty());
    }
}
