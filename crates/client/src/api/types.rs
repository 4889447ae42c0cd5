//! Wire types specific to the HTTP API.

use chrono::{DateTime, Utc};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use vitrine_core::OrderId;

/// Response to a successful access code verification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct VerifyAccessResponse {
    /// Bearer token granting access, when the server issues one.
    #[serde(alias = "accessToken", default)]
    pub access_token: Option<String>,
}

/// Body of the access code verification request.
#[derive(Debug, Serialize)]
pub(crate) struct VerifyAccessBody<'a> {
    pub code: &'a str,
}

/// An order as acknowledged by the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    pub id: OrderId,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(alias = "total_amount", default, deserialize_with = "de_opt_amount")]
    pub total_amount: Option<String>,
    #[serde(alias = "created_at", default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Error body returned by the API.
///
/// `message` is either a single string or a list of validation messages.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    #[serde(default)]
    pub message: Option<ErrorMessage>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ErrorMessage {
    One(String),
    Many(Vec<String>),
}

impl ErrorEnvelope {
    /// Flatten the envelope into one human-readable line.
    pub fn into_message(self) -> Option<String> {
        let message = match self.message {
            Some(ErrorMessage::One(message)) => Some(message),
            Some(ErrorMessage::Many(messages)) if !messages.is_empty() => Some(messages.join("; ")),
            _ => None,
        };
        message.or(self.error).filter(|m| !m.trim().is_empty())
    }
}

/// Keys that may sit next to `data` in a wrapped success body.
const ENVELOPE_KEYS: &[&str] = &["data", "message", "statusCode", "success"];

/// Success body, either bare or wrapped in `{ "data": ... }`.
///
/// An object is unwrapped only when it has a `data` key and nothing but
/// envelope metadata beside it. A bare record whose fields are all optional
/// therefore never reads as an empty envelope, and a paginated
/// `{ "data": [...], "meta": {...} }` body stays whole.
#[derive(Debug)]
pub(crate) struct DataEnvelope<T>(T);

impl<T> DataEnvelope<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for DataEnvelope<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut value = Value::deserialize(deserializer)?;
        let data = match &mut value {
            Value::Object(map)
                if map.contains_key("data")
                    && map.keys().all(|k| ENVELOPE_KEYS.contains(&k.as_str())) =>
            {
                map.remove("data")
            }
            _ => None,
        };
        serde_json::from_value(data.unwrap_or(value))
            .map(Self)
            .map_err(D::Error::custom)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Text(String),
    Number(serde_json::Number),
}

fn de_opt_amount<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<RawAmount>::deserialize(deserializer)?.map(|raw| match raw {
        RawAmount::Text(text) => text,
        RawAmount::Number(number) => number.to_string(),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use vitrine_core::{Catalogue, CatalogueProduct, Page};

    use super::*;

    fn message(body: &str) -> Option<String> {
        serde_json::from_str::<ErrorEnvelope>(body)
            .unwrap()
            .into_message()
    }

    #[test]
    fn test_error_message_forms() {
        assert_eq!(
            message(r#"{"message":"Catalogue not found","statusCode":404}"#),
            Some("Catalogue not found".to_string())
        );
        assert_eq!(
            message(r#"{"message":["name should not be empty","email must be an email"]}"#),
            Some("name should not be empty; email must be an email".to_string())
        );
        assert_eq!(
            message(r#"{"error":"Bad Request","statusCode":400}"#),
            Some("Bad Request".to_string())
        );
        assert_eq!(message(r#"{"message":[]}"#), None);
    }

    #[test]
    fn test_data_envelope() {
        let wrapped: DataEnvelope<VerifyAccessResponse> =
            serde_json::from_str(r#"{"data":{"accessToken":"t1"}}"#).unwrap();
        assert_eq!(wrapped.into_inner().access_token.as_deref(), Some("t1"));

        let bare: DataEnvelope<VerifyAccessResponse> =
            serde_json::from_str(r#"{"access_token":"t2"}"#).unwrap();
        assert_eq!(bare.into_inner().access_token.as_deref(), Some("t2"));
    }

    fn unwrap_body<T: DeserializeOwned>(body: &str) -> T {
        serde_json::from_str::<DataEnvelope<T>>(body)
            .unwrap()
            .into_inner()
    }

    #[test]
    fn test_bare_catalogue_is_not_an_empty_envelope() {
        let catalogue: Option<Catalogue> = unwrap_body(
            r#"{"id":"c1","businessId":"b1","name":"Spring Open","slug":"spring-open","type":"public"}"#,
        );
        let catalogue = catalogue.unwrap();
        assert_eq!(catalogue.id.as_str(), "c1");
        assert_eq!(catalogue.slug, "spring-open");
    }

    #[test]
    fn test_bare_access_token_is_kept() {
        let response: Option<VerifyAccessResponse> =
            unwrap_body(r#"{"access_token":"grant-7f3a"}"#);
        assert_eq!(
            response.unwrap().access_token.as_deref(),
            Some("grant-7f3a")
        );
    }

    #[test]
    fn test_wrapped_optional_bodies() {
        let response: Option<VerifyAccessResponse> =
            unwrap_body(r#"{"data":{"accessToken":"t3"},"statusCode":200}"#);
        assert_eq!(response.unwrap().access_token.as_deref(), Some("t3"));

        let catalogue: Option<Catalogue> =
            unwrap_body(r#"{"data":{"id":"c2","businessId":"b2","name":"N","slug":"n"}}"#);
        assert_eq!(catalogue.unwrap().id.as_str(), "c2");
    }

    #[test]
    fn test_null_bodies_are_none() {
        assert!(unwrap_body::<Option<Catalogue>>("null").is_none());
        assert!(unwrap_body::<Option<Catalogue>>(r#"{"data":null}"#).is_none());
        assert!(serde_json::from_str::<DataEnvelope<Catalogue>>("null").is_err());
    }

    #[test]
    fn test_paginated_body_is_not_unwrapped() {
        let page: Page<CatalogueProduct> = unwrap_body(
            r#"{"data":[{"id":"cp1","catalogueId":"c1","productId":"p1","basePrice":"1000","product":{"id":"p1","name":"Oil"}}],"meta":{"page":1,"limit":20,"total":1,"totalPages":1}}"#,
        );
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.meta.total_pages, 1);
    }

    #[test]
    fn test_created_order() {
        let order: CreatedOrder = serde_json::from_str(
            r#"{"id":"o1","status":"pending","totalAmount":2000,"createdAt":"2026-03-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(order.id, OrderId::new("o1"));
        assert_eq!(order.total_amount.as_deref(), Some("2000"));
        assert!(order.created_at.is_some());

        let minimal: CreatedOrder = serde_json::from_str(r#"{"id":"o2"}"#).unwrap();
        assert!(minimal.status.is_none());
        assert!(minimal.total_amount.is_none());
    }
}
