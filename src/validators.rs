/// Input validators for the credential and status payloads.
///
/// Every check is pure and runs before any store or hashing work. Fields are
/// checked in declaration order and the first failing rule stops validation,
/// so a rejected payload always carries exactly one violation and callers
/// surface its message.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::de::{Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::Deserialize;

const MAX_USERNAME_LENGTH: usize = 64;
const MIN_EMAIL_LENGTH: usize = 3;
const MAX_EMAIL_LENGTH: usize = 255;
const MAX_EMAIL_LOCAL_PART_LENGTH: usize = 64; // RFC 5321
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_STATUS_LENGTH: usize = 255;

lazy_static! {
    // RFC 5322 atom characters in the local part, dot-separated DNS labels in the domain
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$"
    ).expect("email regex is valid");
}

/// Keys a payload carried beyond its known fields, in arrival order
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UnknownFields(Vec<String>);

impl UnknownFields {
    pub fn new(keys: Vec<String>) -> Self {
        Self(keys)
    }

    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }
}

impl<'de> Deserialize<'de> for UnknownFields {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeysVisitor;

        impl<'de> Visitor<'de> for KeysVisitor {
            type Value = UnknownFields;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut keys = Vec::new();
                while let Some(key) = map.next_key::<String>()? {
                    map.next_value::<IgnoredAny>()?;
                    keys.push(key);
                }
                Ok(UnknownFields(keys))
            }
        }

        deserializer.deserialize_map(KeysVisitor)
    }
}

/// Registration payload as received from the client
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(rename = "confirmPassword")]
    pub confirm_password: Option<String>,
    #[serde(flatten)]
    pub unknown: UnknownFields,
}

/// Login payload as received from the client
#[derive(Debug, Default, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(flatten)]
    pub unknown: UnknownFields,
}

/// Status create/update payload
#[derive(Debug, Default, Clone, Deserialize)]
pub struct StatusRequest {
    pub message: Option<String>,
    #[serde(flatten)]
    pub unknown: UnknownFields,
}

/// An accepted registration: username trimmed, email trimmed and lowercased
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRegistration {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Accepted login credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

/// Rejection produced by the validators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    violations: Vec<FieldViolation>,
}

impl ValidationErrors {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            violations: vec![FieldViolation {
                field: field.into(),
                message: message.into(),
            }],
        }
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Message of the first violation
    pub fn message(&self) -> &str {
        self.violations
            .first()
            .map(|v| v.message.as_str())
            .unwrap_or("Invalid input.")
    }

    /// Field of the first violation
    pub fn field(&self) -> Option<&str> {
        self.violations.first().map(|v| v.field.as_str())
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for ValidationErrors {}

fn reject<T>(field: &'static str, message: impl Into<String>) -> Result<T, ValidationErrors> {
    Err(ValidationErrors::single(field, message))
}

fn required<'a>(field: &'static str, value: Option<&'a str>) -> Result<&'a str, ValidationErrors> {
    match value {
        Some(value) => Ok(value),
        None => reject(field, format!("\"{}\" is required", field)),
    }
}

/// Known fields are checked first; then the first extra key is refused.
fn no_unknown_fields(unknown: &UnknownFields) -> Result<(), ValidationErrors> {
    match unknown.first() {
        Some(key) => Err(ValidationErrors::single(key, format!("\"{}\" is not allowed", key))),
        None => Ok(()),
    }
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

/// Checks email syntax: one `@`, a bounded local part without stray dots and
/// a domain with at least two labels ending in an alphabetic TLD.
pub fn is_valid_email(email: &str) -> bool {
    if !EMAIL_REGEX.is_match(email) {
        return false;
    }

    let (local, domain) = match email.split_once('@') {
        Some(parts) => parts,
        None => return false,
    };

    if local.len() > MAX_EMAIL_LOCAL_PART_LENGTH
        || local.starts_with('.')
        || local.ends_with('.')
        || local.contains("..")
    {
        return false;
    }

    match domain.rsplit('.').next() {
        Some(tld) => tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()),
        None => false,
    }
}

/// Validates a registration payload.
pub fn validate_registration(request: &RegisterRequest) -> Result<NewRegistration, ValidationErrors> {
    let username = required("username", request.username.as_deref())?.trim();
    if username.is_empty() {
        return reject("username", "Username is required.");
    }
    if char_len(username) > MAX_USERNAME_LENGTH {
        return reject(
            "username",
            format!("Username exceeds maximum length of {} characters.", MAX_USERNAME_LENGTH),
        );
    }

    let email = required("email", request.email.as_deref())?.trim();
    if email.is_empty() {
        return reject("email", "Email is required.");
    }
    if char_len(email) < MIN_EMAIL_LENGTH {
        return reject(
            "email",
            format!("Email must be at least {} characters long.", MIN_EMAIL_LENGTH),
        );
    }
    if char_len(email) > MAX_EMAIL_LENGTH {
        return reject(
            "email",
            format!("Email exceeds maximum length of {} characters.", MAX_EMAIL_LENGTH),
        );
    }
    if !is_valid_email(email) {
        return reject("email", "Email must be valid.");
    }

    let password = required("password", request.password.as_deref())?;
    if password.is_empty() {
        return reject("password", "Password is required.");
    }
    if char_len(password) < MIN_PASSWORD_LENGTH {
        return reject(
            "password",
            format!("Password must be at least {} characters long.", MIN_PASSWORD_LENGTH),
        );
    }

    let confirm_password = required("confirmPassword", request.confirm_password.as_deref())?;
    if confirm_password != password {
        return reject("confirmPassword", "Passwords do not match.");
    }
    no_unknown_fields(&request.unknown)?;

    Ok(NewRegistration {
        username: username.to_string(),
        email: email.to_lowercase(),
        password: password.to_string(),
    })
}

/// Validates a login payload. The password is only required, not measured.
pub fn validate_login(request: &LoginRequest) -> Result<Credentials, ValidationErrors> {
    let email = required("email", request.email.as_deref())?.trim();
    if email.is_empty() {
        return reject("email", "\"email\" is not allowed to be empty");
    }
    if !is_valid_email(email) {
        return reject("email", "\"email\" must be a valid email");
    }

    let password = required("password", request.password.as_deref())?;
    if password.is_empty() {
        return reject("password", "\"password\" is not allowed to be empty");
    }
    no_unknown_fields(&request.unknown)?;

    Ok(Credentials {
        email: email.to_lowercase(),
        password: password.to_string(),
    })
}

/// Validates a status message and returns it trimmed.
pub fn validate_status(request: &StatusRequest) -> Result<String, ValidationErrors> {
    let message = required("message", request.message.as_deref())?.trim();
    if message.is_empty() {
        return reject("message", "\"message\" is not allowed to be empty");
    }
    if char_len(message) > MAX_STATUS_LENGTH {
        return reject(
            "message",
            format!(
                "\"message\" length must be less than or equal to {} characters long",
                MAX_STATUS_LENGTH
            ),
        );
    }
    no_unknown_fields(&request.unknown)?;
    Ok(message.to_string())
}
