//! Contact details collected by the access request form.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`] or [`Phone`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ContactError {
    /// The input string is empty.
    #[error("{0} cannot be empty")]
    Empty(&'static str),
    /// The email is longer than RFC 5321 allows.
    #[error("email must be at most {max} characters")]
    EmailTooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The email does not have a `local@domain` shape.
    #[error("email must look like name@domain")]
    MalformedEmail,
    /// The phone number contains characters other than digits and separators.
    #[error("phone number may only contain digits, spaces, dashes and a leading +")]
    PhoneCharacters,
    /// The phone number has too few or too many digits.
    #[error("phone number must have between {min} and {max} digits")]
    PhoneLength {
        /// Minimum digit count.
        min: usize,
        /// Maximum digit count.
        max: usize,
    },
}

/// An email address, trimmed and lowercased.
///
/// ```
/// use vitrine_core::Email;
///
/// assert_eq!(Email::parse(" Buyer@Shop.CM ").unwrap().as_str(), "buyer@shop.cm");
/// assert!(Email::parse("no-at-symbol").is_err());
/// assert!(Email::parse("@shop.cm").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an `Email` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is blank, too long, or is not exactly one
    /// `@` between a non-empty local part and a non-empty domain.
    pub fn parse(s: &str) -> Result<Self, ContactError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ContactError::Empty("email"));
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(ContactError::EmailTooLong {
                max: Self::MAX_LENGTH,
            });
        }

        match s.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
            {
                Ok(Self(s.to_lowercase()))
            }
            _ => Err(ContactError::MalformedEmail),
        }
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Email {
    type Err = ContactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A phone number normalized to digits with an optional leading `+`.
///
/// Spaces, dashes, dots and parentheses are accepted as separators and
/// stripped. The API delivers access codes by SMS to this number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Fewest digits accepted.
    pub const MIN_DIGITS: usize = 6;
    /// Most digits accepted (E.164).
    pub const MAX_DIGITS: usize = 15;

    /// Parse a `Phone` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is blank, contains letters or other
    /// symbols, or has a digit count outside 6..=15.
    pub fn parse(s: &str) -> Result<Self, ContactError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ContactError::Empty("phone"));
        }

        let (plus, rest) = s.strip_prefix('+').map_or(("", s), |rest| ("+", rest));

        let mut digits = String::with_capacity(rest.len());
        for c in rest.chars() {
            match c {
                '0'..='9' => digits.push(c),
                ' ' | '-' | '.' | '(' | ')' => {}
                _ => return Err(ContactError::PhoneCharacters),
            }
        }

        if !(Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&digits.len()) {
            return Err(ContactError::PhoneLength {
                min: Self::MIN_DIGITS,
                max: Self::MAX_DIGITS,
            });
        }

        Ok(Self(format!("{plus}{digits}")))
    }

    /// Returns the normalized number.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Phone {
    type Err = ContactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_emails() {
        assert!(Email::parse("user@example.com").is_ok());
        assert!(Email::parse("user+tag@example.co.uk").is_ok());
        assert!(Email::parse("a@b").is_ok());
    }

    #[test]
    fn test_email_normalized() {
        let email = Email::parse("  Jean.Paul@Boutique.CM ").unwrap();
        assert_eq!(email.as_str(), "jean.paul@boutique.cm");
    }

    #[test]
    fn test_email_errors() {
        assert_eq!(Email::parse("  "), Err(ContactError::Empty("email")));
        assert_eq!(Email::parse("nope"), Err(ContactError::MalformedEmail));
        assert_eq!(Email::parse("a@b@c"), Err(ContactError::MalformedEmail));
        assert_eq!(Email::parse("user@"), Err(ContactError::MalformedEmail));

        let long = format!("{}@example.com", "a".repeat(250));
        assert!(matches!(
            Email::parse(&long),
            Err(ContactError::EmailTooLong { .. })
        ));
    }

    #[test]
    fn test_phone_normalized() {
        let phone = Phone::parse("+237 6 99-12-34-56").unwrap();
        assert_eq!(phone.as_str(), "+237699123456");

        let local = Phone::parse("(699) 123.456").unwrap();
        assert_eq!(local.as_str(), "699123456");
    }

    #[test]
    fn test_phone_errors() {
        assert_eq!(Phone::parse(""), Err(ContactError::Empty("phone")));
        assert_eq!(Phone::parse("69912abc"), Err(ContactError::PhoneCharacters));
        assert_eq!(Phone::parse("++237699"), Err(ContactError::PhoneCharacters));
        assert!(matches!(
            Phone::parse("12345"),
            Err(ContactError::PhoneLength { .. })
        ));
        assert!(matches!(
            Phone::parse("1234567890123456"),
            Err(ContactError::PhoneLength { .. })
        ));
    }

    #[test]
    fn test_serde_transparent() {
        let email = Email::parse("user@example.com").unwrap();
        assert_eq!(
            serde_json::to_string(&email).unwrap(),
            "\"user@example.com\""
        );
    }
}
