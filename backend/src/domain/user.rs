//! Marketplace accounts: clients who post cases and lawyers who quote on them.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::UserId;

/// Minimum accepted password length in characters.
pub const PASSWORD_MIN_CHARS: usize = 8;

/// Validation failures for account input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// The email address is empty or malformed.
    #[error("email must be a valid address")]
    InvalidEmail,
    /// The password is shorter than [`PASSWORD_MIN_CHARS`].
    #[error("password must be at least {min} characters")]
    PasswordTooShort {
        /// Required minimum length.
        min: usize,
    },
    /// The password is empty.
    #[error("password must not be empty")]
    EmptyPassword,
    /// The role is not one of `client` or `lawyer`.
    #[error("role must be client or lawyer")]
    UnknownRole,
}

/// Marketplace role attached to every account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Posts cases and accepts quotes.
    Client,
    /// Browses open cases and submits quotes.
    Lawyer,
}

impl Role {
    /// Stable storage and wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Lawyer => "lawyer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Self::Client),
            "lawyer" => Ok(Self::Lawyer),
            _ => Err(UserValidationError::UnknownRole),
        }
    }
}

/// Normalised (trimmed, lower-cased) email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

impl EmailAddress {
    /// Validate and normalise an email address.
    ///
    /// # Examples
    /// ```
    /// use docket::domain::EmailAddress;
    ///
    /// let email = EmailAddress::parse("  Ada@Example.COM ").expect("valid email");
    /// assert_eq!(email.as_str(), "ada@example.com");
    /// ```
    pub fn parse(raw: &str) -> Result<Self, UserValidationError> {
        let normalised = raw.trim().to_lowercase();
        if email_regex().is_match(&normalised) {
            Ok(Self(normalised))
        } else {
            Err(UserValidationError::InvalidEmail)
        }
    }

    /// Borrow the normalised address.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// Registered account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: EmailAddress,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    /// Practising jurisdiction; lawyers only.
    pub jurisdiction: Option<String>,
    /// Bar registration number; lawyers only.
    pub bar_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Validated signup input prior to password hashing.
#[derive(Clone)]
pub struct SignupDetails {
    pub email: EmailAddress,
    pub password: Zeroizing<String>,
    pub name: String,
    pub role: Role,
    pub jurisdiction: Option<String>,
    pub bar_number: Option<String>,
}

/// Raw signup fields as received from an adapter.
#[derive(Clone, Default)]
pub struct SignupDraft {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: String,
    pub jurisdiction: Option<String>,
    pub bar_number: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_owned())
        .filter(|trimmed| !trimmed.is_empty())
}

impl SignupDetails {
    /// Validate a signup draft.
    ///
    /// Lawyer-only fields are discarded for clients.
    pub fn try_from_draft(draft: SignupDraft) -> Result<Self, UserValidationError> {
        let SignupDraft {
            email,
            password,
            name,
            role,
            jurisdiction,
            bar_number,
        } = draft;
        let email = EmailAddress::parse(&email)?;
        let password = Zeroizing::new(password);
        if password.chars().count() < PASSWORD_MIN_CHARS {
            return Err(UserValidationError::PasswordTooShort {
                min: PASSWORD_MIN_CHARS,
            });
        }
        let role = Role::from_str(role.trim())?;
        let (jurisdiction, bar_number) = match role {
            Role::Lawyer => (non_blank(jurisdiction), non_blank(bar_number)),
            Role::Client => (None, None),
        };

        Ok(Self {
            email,
            password,
            name: name.trim().to_owned(),
            role,
            jurisdiction,
            bar_number,
        })
    }
}

impl fmt::Debug for SignupDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupDetails")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// Email and password supplied at login.
#[derive(Clone)]
pub struct LoginCredentials {
    email: EmailAddress,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Validate raw login fields.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, UserValidationError> {
        let email = EmailAddress::parse(email)?;
        if password.is_empty() {
            return Err(UserValidationError::EmptyPassword);
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Normalised email address.
    #[must_use]
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Plain-text password, wiped on drop.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
