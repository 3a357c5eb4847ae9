//! Contact-detail redaction for marketplace views.
//!
//! Order matters: emails are masked before phone numbers, and any `@` left
//! over afterwards is spelled out so partial addresses cannot survive.

use std::sync::LazyLock;

use regex::Regex;

/// Replacement for email addresses.
pub const EMAIL_MARKER: &str = "[email redacted]";
/// Replacement for phone numbers.
pub const PHONE_MARKER: &str = "[phone redacted]";
/// Replacement for stray `@` characters.
pub const AT_MARKER: &str = "[at]";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("valid regex")
});

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+?1[-.\s]?)?\(?[0-9]{3}\)?[-.\s]?[0-9]{3}[-.\s]?[0-9]{4}")
        .expect("valid regex")
});

/// Mask emails, phone numbers and stray `@` signs in free text.
///
/// # Examples
/// ```
/// use docket::domain::anonymize;
///
/// assert_eq!(
///     anonymize("Contact me at a@b.com or 555-123-4567"),
///     "Contact me at [email redacted] or [phone redacted]"
/// );
/// ```
#[must_use]
pub fn anonymize(text: &str) -> String {
    let without_emails = EMAIL_RE.replace_all(text, EMAIL_MARKER);
    let without_phones = PHONE_RE.replace_all(&without_emails, PHONE_MARKER);
    without_phones.replace('@', AT_MARKER)
}
