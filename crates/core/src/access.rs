//! Private catalogue access gate.
//!
//! A private catalogue's products are hidden until the viewer proves a
//! contact: they submit a name and an email or phone, the server sends a
//! one-time code out of band, and the viewer types it back.
//!
//! ```text
//! Hidden                       (public, or already granted)
//! Requesting ──request_sent──▶ Verifying ──verified──▶ Granted
//!     ▲                            │
//!     └───────────back─────────────┘
//! ```
//!
//! This module is the state machine only. Sending the request and checking
//! the code over HTTP is the client crate's job; it reports the outcome back
//! through [`AccessGate::request_sent`], [`AccessGate::request_failed`],
//! [`AccessGate::verified`] and [`AccessGate::verification_failed`].

use core::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::types::{ContactError, Email, Phone};

/// Message shown when the server rejects a code.
pub const INVALID_CODE_MESSAGE: &str = "Invalid or expired code";

/// Length of the one-time access code.
pub const CODE_LENGTH: usize = 6;

/// Where the viewer is in the access flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessState {
    /// No gate: the catalogue is public or access was already granted.
    Hidden,
    /// Collecting name and contact details.
    Requesting,
    /// Waiting for the one-time code.
    Verifying,
    /// Code accepted.
    Granted,
}

impl fmt::Display for AccessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hidden => write!(f, "hidden"),
            Self::Requesting => write!(f, "requesting"),
            Self::Verifying => write!(f, "verifying"),
            Self::Granted => write!(f, "granted"),
        }
    }
}

/// A validation problem tied to one form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Errors raised by the access gate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// The request form is incomplete or malformed.
    #[error("{}", format_field_errors(.0))]
    Validation(Vec<FieldError>),

    /// The code is not six letters or digits.
    #[error("access code must be 6 letters or digits")]
    MalformedCode,

    /// The action is not allowed in the current state.
    #[error("cannot {action} while access is {state}")]
    InvalidTransition {
        state: AccessState,
        action: &'static str,
    },
}

impl AccessError {
    /// Field-level problems, for inline display.
    #[must_use]
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::Validation(errors) => errors,
            _ => &[],
        }
    }
}

fn format_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Raw values typed into the access request form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessRequestForm {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// A validated access request, ready to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<Phone>,
}

impl AccessRequest {
    /// Validate a form.
    ///
    /// Requires a non-blank name and at least one of email or phone. Blank
    /// contact fields count as absent; filled ones must parse.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Validation`] listing every field problem.
    pub fn validate(form: &AccessRequestForm) -> Result<Self, AccessError> {
        let mut errors = Vec::new();

        let name = form.name.trim();
        if name.is_empty() {
            errors.push(FieldError {
                field: "name",
                message: "name is required".to_string(),
            });
        }

        let email = non_blank(form.email.as_deref());
        let phone = non_blank(form.phone.as_deref());

        if email.is_none() && phone.is_none() {
            errors.push(FieldError {
                field: "contact",
                message: "an email or a phone number is required".to_string(),
            });
        }

        let email = parse_field(email, "email", Email::parse, &mut errors);
        let phone = parse_field(phone, "phone", Phone::parse, &mut errors);

        if !errors.is_empty() {
            return Err(AccessError::Validation(errors));
        }

        Ok(Self {
            name: name.to_owned(),
            email,
            phone,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_field<T>(
    value: Option<&str>,
    field: &'static str,
    parse: fn(&str) -> Result<T, ContactError>,
    errors: &mut Vec<FieldError>,
) -> Option<T> {
    match value.map(parse)? {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            errors.push(FieldError {
                field,
                message: e.to_string(),
            });
            None
        }
    }
}

/// A well-formed one-time code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VerificationCode(String);

impl VerificationCode {
    /// Parse a code typed by the viewer.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::MalformedCode`] unless the trimmed input is
    /// exactly six ASCII letters or digits.
    pub fn parse(raw: &str) -> Result<Self, AccessError> {
        let code = raw.trim();
        if code.len() == CODE_LENGTH && code.chars().all(|c| c.is_ascii_alphanumeric()) {
            Ok(Self(code.to_owned()))
        } else {
            Err(AccessError::MalformedCode)
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The access gate for one catalogue view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGate {
    state: AccessState,
    request: Option<AccessRequest>,
    error: Option<String>,
}

impl AccessGate {
    /// Start the gate: `Requesting` for a private catalogue, else `Hidden`.
    #[must_use]
    pub const fn new(private: bool) -> Self {
        Self {
            state: if private {
                AccessState::Requesting
            } else {
                AccessState::Hidden
            },
            request: None,
            error: None,
        }
    }

    #[must_use]
    pub const fn state(&self) -> AccessState {
        self.state
    }

    /// Message from the last failed step, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The last request that was sent, kept so "back" can prefill the form.
    #[must_use]
    pub const fn last_request(&self) -> Option<&AccessRequest> {
        self.request.as_ref()
    }

    /// Whether products may be requested and shown.
    #[must_use]
    pub const fn allows_products(&self) -> bool {
        matches!(self.state, AccessState::Hidden | AccessState::Granted)
    }

    /// Validate the request form before anything is sent.
    ///
    /// # Errors
    ///
    /// Returns a validation error, or `InvalidTransition` outside `Requesting`.
    pub fn prepare_request(&mut self, form: &AccessRequestForm) -> Result<AccessRequest, AccessError> {
        self.expect(AccessState::Requesting, "request access")?;
        AccessRequest::validate(form).inspect_err(|e| self.error = Some(e.to_string()))
    }

    /// The server accepted the request and sent a code.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` outside `Requesting`.
    pub fn request_sent(&mut self, request: AccessRequest) -> Result<(), AccessError> {
        self.expect(AccessState::Requesting, "record a sent request")?;
        self.state = AccessState::Verifying;
        self.request = Some(request);
        self.error = None;
        Ok(())
    }

    /// Sending the request failed. The gate stays in `Requesting`.
    pub fn request_failed(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    /// Validate a typed code before it is sent.
    ///
    /// # Errors
    ///
    /// Returns `MalformedCode`, or `InvalidTransition` outside `Verifying`.
    pub fn prepare_code(&mut self, raw: &str) -> Result<VerificationCode, AccessError> {
        self.expect(AccessState::Verifying, "verify a code")?;
        VerificationCode::parse(raw).inspect_err(|e| self.error = Some(e.to_string()))
    }

    /// The server accepted the code.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` outside `Verifying`.
    pub fn verified(&mut self) -> Result<(), AccessError> {
        self.expect(AccessState::Verifying, "grant access")?;
        self.state = AccessState::Granted;
        self.error = None;
        Ok(())
    }

    /// The server rejected the code. The gate stays in `Verifying` and the
    /// viewer may try again as often as they like.
    pub fn verification_failed(&mut self) {
        self.error = Some(INVALID_CODE_MESSAGE.to_string());
    }

    /// Return from code entry to the request form.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` outside `Verifying`.
    pub fn back(&mut self) -> Result<(), AccessError> {
        self.expect(AccessState::Verifying, "go back")?;
        self.state = AccessState::Requesting;
        self.error = None;
        Ok(())
    }

    const fn expect(&self, state: AccessState, action: &'static str) -> Result<(), AccessError> {
        if matches!(
            (self.state, state),
            (AccessState::Requesting, AccessState::Requesting)
                | (AccessState::Verifying, AccessState::Verifying)
        ) {
            Ok(())
        } else {
            Err(AccessError::InvalidTransition {
                state: self.state,
                action,
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(name: &str, email: Option<&str>, phone: Option<&str>) -> AccessRequestForm {
        AccessRequestForm {
            name: name.to_string(),
            email: email.map(str::to_string),
            phone: phone.map(str::to_string),
        }
    }

    #[test]
    fn test_public_gate_is_hidden() {
        let gate = AccessGate::new(false);
        assert_eq!(gate.state(), AccessState::Hidden);
        assert!(gate.allows_products());
    }

    #[test]
    fn test_private_gate_starts_requesting() {
        let gate = AccessGate::new(true);
        assert_eq!(gate.state(), AccessState::Requesting);
        assert!(!gate.allows_products());
    }

    #[test]
    fn test_full_flow() {
        let mut gate = AccessGate::new(true);
        let request = gate
            .prepare_request(&form("Awa", Some("awa@example.cm"), None))
            .unwrap();
        gate.request_sent(request).unwrap();
        assert_eq!(gate.state(), AccessState::Verifying);

        let code = gate.prepare_code(" 12ab34 ").unwrap();
        assert_eq!(code.as_str(), "12ab34");
        gate.verified().unwrap();

        assert_eq!(gate.state(), AccessState::Granted);
        assert!(gate.allows_products());
    }

    #[test]
    fn test_name_required() {
        let err = AccessRequest::validate(&form("  ", Some("a@b.cm"), None)).unwrap_err();
        assert_eq!(err.field_errors().len(), 1);
        assert_eq!(err.field_errors()[0].field, "name");
    }

    #[test]
    fn test_contact_required() {
        let err = AccessRequest::validate(&form("Awa", Some(" "), None)).unwrap_err();
        assert_eq!(err.field_errors()[0].field, "contact");
    }

    #[test]
    fn test_all_problems_reported() {
        let err = AccessRequest::validate(&form("", None, None)).unwrap_err();
        let fields: Vec<_> = err.field_errors().iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["name", "contact"]);
    }

    #[test]
    fn test_phone_only_is_enough() {
        let request = AccessRequest::validate(&form("Awa", None, Some("+237 699 12 34 56"))).unwrap();
        assert_eq!(request.phone.unwrap().as_str(), "+237699123456");
        assert!(request.email.is_none());
    }

    #[test]
    fn test_malformed_email_reported() {
        let err = AccessRequest::validate(&form("Awa", Some("awa"), Some("699123456"))).unwrap_err();
        assert_eq!(err.field_errors()[0].field, "email");
    }

    #[test]
    fn test_invalid_form_keeps_requesting() {
        let mut gate = AccessGate::new(true);
        assert!(gate.prepare_request(&form("", None, None)).is_err());
        assert_eq!(gate.state(), AccessState::Requesting);
        assert!(gate.error().is_some());
    }

    #[test]
    fn test_request_failure_keeps_requesting() {
        let mut gate = AccessGate::new(true);
        gate.request_failed("network down");
        assert_eq!(gate.state(), AccessState::Requesting);
        assert_eq!(gate.error(), Some("network down"));
    }

    #[test]
    fn test_rejected_code_keeps_verifying() {
        let mut gate = AccessGate::new(true);
        let request = gate.prepare_request(&form("Awa", None, Some("699123456"))).unwrap();
        gate.request_sent(request).unwrap();

        gate.prepare_code("000000").unwrap();
        gate.verification_failed();
        assert_eq!(gate.state(), AccessState::Verifying);
        assert_eq!(gate.error(), Some(INVALID_CODE_MESSAGE));

        // Resubmitting is allowed
        assert!(gate.prepare_code("123456").is_ok());
    }

    #[test]
    fn test_back_returns_to_requesting_with_prefill() {
        let mut gate = AccessGate::new(true);
        let request = gate.prepare_request(&form("Awa", None, Some("699123456"))).unwrap();
        gate.request_sent(request.clone()).unwrap();
        gate.back().unwrap();

        assert_eq!(gate.state(), AccessState::Requesting);
        assert_eq!(gate.last_request(), Some(&request));
    }

    #[test]
    fn test_malformed_codes() {
        for raw in ["", "12345", "1234567", "12 456", "12-456"] {
            assert_eq!(VerificationCode::parse(raw), Err(AccessError::MalformedCode));
        }
    }

    #[test]
    fn test_invalid_transitions() {
        let mut hidden = AccessGate::new(false);
        assert!(matches!(
            hidden.prepare_request(&AccessRequestForm::default()),
            Err(AccessError::InvalidTransition { state: AccessState::Hidden, .. })
        ));

        let mut requesting = AccessGate::new(true);
        assert!(requesting.verified().is_err());
        assert!(requesting.back().is_err());
        assert!(requesting.prepare_code("123456").is_err());
    }

    #[test]
    fn test_request_serializes_without_missing_contacts() {
        let request = AccessRequest::validate(&form("Awa", Some("awa@example.cm"), None)).unwrap();
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({ "name": "Awa", "email": "awa@example.cm" })
        );
    }
}
