//! JSON body extractor reporting decode failures as field errors

use std::collections::BTreeMap;

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header, HeaderMap},
};
use serde::de::DeserializeOwned;

use crate::error::{AppError, AppResult};

/// Like `axum::Json`, but a value that does not decode (a malformed date,
/// a string where a number belongs, a missing field) becomes a 400 with
/// the offending field named in `fields`.
pub struct FormJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for FormJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_json(req.headers()) {
            return Err(AppError::BadRequest(
                "Expected request with `Content-Type: application/json`".to_string(),
            ));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        decode(&bytes).map(FormJson)
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|mime| {
            let mime = mime.trim();
            mime.eq_ignore_ascii_case("application/json") || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> AppResult<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);

    let value = serde_path_to_error::deserialize(&mut deserializer).map_err(|err| {
        let path = err.path().to_string();
        into_app_error(&path, err.into_inner())
    })?;
    deserializer
        .end()
        .map_err(|e| AppError::BadRequest(format!("Malformed JSON body: {}", e)))?;

    Ok(value)
}

fn into_app_error(path: &str, err: serde_json::Error) -> AppError {
    if !err.is_data() {
        return AppError::BadRequest(format!("Malformed JSON body: {}", err));
    }

    let message = err.to_string();
    let message = match message.rsplit_once(" at line ") {
        Some((message, _)) => message.to_string(),
        None => message,
    };

    // Nested paths such as `genre_ids[1]` are reported on their top-level field
    let field = path.split(['.', '[']).next().unwrap_or_default();
    let (field, message) = if !field.is_empty() {
        (field.to_string(), format!("Enter a valid value: {}.", message))
    } else if let Some(missing) = missing_field(&message) {
        (missing.to_string(), "This field is required.".to_string())
    } else {
        return AppError::BadRequest(format!("Invalid JSON body: {}", message));
    };

    AppError::MalformedFields(BTreeMap::from([(field, vec![message])]))
}

fn missing_field(message: &str) -> Option<&str> {
    message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split_once('`'))
        .map(|(name, _)| name)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Renewal {
        #[allow(dead_code)]
        title: String,
        renewal_date: Option<NaiveDate>,
        #[serde(default)]
        #[allow(dead_code)]
        genre_ids: Vec<i32>,
    }

    fn fields(result: AppResult<Renewal>) -> BTreeMap<String, Vec<String>> {
        match result {
            Err(AppError::MalformedFields(fields)) => fields,
            other => panic!("expected malformed fields, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_body_decodes() {
        let renewal: Renewal =
            decode(br#"{"title": "Dune", "renewal_date": "2024-02-15"}"#).unwrap();
        assert_eq!(renewal.renewal_date, NaiveDate::from_ymd_opt(2024, 2, 15));
    }

    #[test]
    fn test_malformed_date_names_field() {
        let fields = fields(decode(br#"{"title": "Dune", "renewal_date": "15/02/2024"}"#));
        assert_eq!(fields.len(), 1);
        assert!(fields["renewal_date"][0].starts_with("Enter a valid value"));
    }

    #[test]
    fn test_nested_value_reports_top_level_field() {
        let fields = fields(decode(br#"{"title": "Dune", "genre_ids": [1, "two"]}"#));
        assert!(fields.contains_key("genre_ids"));
    }

    #[test]
    fn test_missing_field_is_required() {
        let fields = fields(decode(br#"{"renewal_date": null}"#));
        assert_eq!(fields["title"], vec!["This field is required.".to_string()]);
    }

    #[test]
    fn test_syntax_error_is_bad_request() {
        let result: AppResult<Renewal> = decode(br#"{"title": "Dune""#);
        assert!(matches!(result, Err(AppError::BadRequest(_))));

        let result: AppResult<Renewal> = decode(br#"{"title": "Dune"} trailing"#);
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_content_type() {
        let mut headers = HeaderMap::new();
        assert!(!is_json(&headers));
        headers.insert(header::CONTENT_TYPE, "application/json; charset=utf-8".parse().unwrap());
        assert!(is_json(&headers));
        headers.insert(header::CONTENT_TYPE, "text/plain".parse().unwrap());
        assert!(!is_json(&headers));
    }
}
