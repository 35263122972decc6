//! Contact field extraction — pattern-matched emails and phone numbers.
//!
//! Pure and infallible. Matches are returned exactly as they appear in the
//! text, in left-to-right order, repeats included.

use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("valid email regex")
});

/// Ten consecutive digits, or 3-3-4 groups with an optional `-`, `.` or
/// whitespace separator between groups.
static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[0-9]{10}\b|\b[0-9]{3}[-.\s]?[0-9]{3}[-.\s]?[0-9]{4}\b")
        .expect("valid phone regex")
});

const JOIN_SEPARATOR: &str = ", ";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactFields {
    pub emails: Vec<String>,
    pub phone_numbers: Vec<String>,
}

impl ContactFields {
    /// Emails joined with `", "`; empty string when none were found.
    pub fn joined_emails(&self) -> String {
        self.emails.join(JOIN_SEPARATOR)
    }

    pub fn joined_phones(&self) -> String {
        self.phone_numbers.join(JOIN_SEPARATOR)
    }
}

/// Scans `text` for emails and phone numbers.
pub fn extract_fields(text: &str) -> ContactFields {
    ContactFields {
        emails: find_all(&EMAIL_RE, text),
        phone_numbers: find_all(&PHONE_RE, text),
    }
}

fn find_all(re: &Regex, text: &str) -> Vec<String> {
    re.find_iter(text).map(|m| m.as_str().to_string()).collect()
}
