//! Converter selection from target types and content types.

use std::any::TypeId;

use conduit_core::{DataError, InputConverter, IterableInputConverter, OutputConverter};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::response::ResponseMeta;
use crate::converter::{JsonArrayConverter, JsonConverter, TextConverter, VoidConverter};

const APPLICATION_JSON: &str = "application/json";
const TEXT_PLAIN: &str = "text/plain";
const NO_CONTENT: u16 = 204;

fn is<T: 'static, U: 'static>() -> bool {
    TypeId::of::<T>() == TypeId::of::<U>()
}

/// Input converter for a single object.
///
/// `String` targets read text and `()` targets read nothing. Otherwise a
/// `204` reads nothing, and the response content type picks JSON
/// (`application/json`, or no header) or text (`text/plain`).
pub(crate) fn object_input<T>(meta: &ResponseMeta) -> Result<Box<dyn InputConverter<T>>, DataError>
where
    T: DeserializeOwned + 'static,
{
    if is::<T, String>() {
        return Ok(Box::new(TextConverter));
    }
    if is::<T, ()>() || meta.status() == NO_CONTENT {
        return Ok(Box::new(VoidConverter));
    }
    let content_type = meta.content_type();
    log::debug!("detected response content type {content_type:?}");
    match content_type {
        None => Ok(Box::new(JsonConverter::new())),
        Some(value) if value.starts_with(APPLICATION_JSON) => Ok(Box::new(JsonConverter::new())),
        Some(value) if value.starts_with(TEXT_PLAIN) => Ok(Box::new(TextConverter)),
        Some(other) => Err(DataError::configuration(format!(
            "no input converter for response content type {other}"
        ))),
    }
}

/// Iterable converter for a list; only JSON arrays are understood.
pub(crate) fn list_input<E>(
    meta: &ResponseMeta,
) -> Result<Box<dyn IterableInputConverter<E>>, DataError>
where
    E: DeserializeOwned + 'static,
{
    match meta.content_type() {
        None => Ok(Box::new(JsonArrayConverter::new())),
        Some(value) if value.starts_with(APPLICATION_JSON) => {
            Ok(Box::new(JsonArrayConverter::new()))
        }
        Some(other) => Err(DataError::configuration(format!(
            "no iterable converter for response content type {other}"
        ))),
    }
}

/// Output converter for a request body.
///
/// A configured request content type must be JSON. Without one, `String`
/// values are written as text, `()` writes nothing, and anything else is
/// written as JSON.
pub(crate) fn object_output<T>(
    request_content_type: Option<&str>,
) -> Result<Box<dyn OutputConverter<T>>, DataError>
where
    T: Serialize + 'static,
{
    match request_content_type {
        Some(value) if value.starts_with(APPLICATION_JSON) => Ok(Box::new(JsonConverter::new())),
        Some(other) => Err(DataError::configuration(format!(
            "no output converter for request content type {other}"
        ))),
        None if is::<T, String>() => Ok(Box::new(TextConverter)),
        None if is::<T, ()>() => Ok(Box::new(VoidConverter)),
        None => Ok(Box::new(JsonConverter::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
    use rstest::rstest;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: u8,
    }

    fn meta(status: u16, content_type: Option<&'static str>) -> ResponseMeta {
        let mut headers = HeaderMap::new();
        if let Some(value) = content_type {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(value));
        }
        ResponseMeta::new(StatusCode::from_u16(status).expect("valid status"), headers)
    }

    fn read<T: DeserializeOwned + 'static>(
        meta: &ResponseMeta,
        body: &[u8],
    ) -> Result<Option<T>, DataError> {
        let mut input = body;
        object_input::<T>(meta)?.read(&mut input)
    }

    #[rstest]
    #[case(None)]
    #[case(Some("application/json"))]
    #[case(Some("application/json; charset=utf-8"))]
    fn json_responses_decode_objects(#[case] content_type: Option<&'static str>) {
        let item = read::<Item>(&meta(200, content_type), br#"{"id":3}"#).expect("json");
        assert_eq!(item, Some(Item { id: 3 }));
    }

    #[rstest]
    fn string_targets_read_text_whatever_the_header() {
        let text =
            read::<String>(&meta(200, Some("application/json")), b"{\"id\":3}").expect("text");
        assert_eq!(text.as_deref(), Some("{\"id\":3}"));
    }

    #[rstest]
    fn no_content_reads_nothing() {
        let item = read::<Item>(&meta(204, Some("text/html")), b"").expect("void");
        assert!(item.is_none());
    }

    #[rstest]
    fn unit_targets_read_nothing() {
        assert!(read::<()>(&meta(200, Some("text/html")), b"<p>").expect("void").is_none());
    }

    #[rstest]
    fn unknown_content_types_fail_fast() {
        let err = object_input::<Item>(&meta(200, Some("application/xml"))).err();
        assert!(matches!(err, Some(DataError::Configuration { .. })));
    }

    #[rstest]
    #[case(Some("text/plain"), false)]
    #[case(Some("application/json"), true)]
    #[case(None, true)]
    fn lists_need_json(#[case] content_type: Option<&'static str>, #[case] accepted: bool) {
        assert_eq!(list_input::<Item>(&meta(200, content_type)).is_ok(), accepted);
    }

    #[rstest]
    fn output_selection_follows_the_request_content_type() {
        let mut out = Vec::new();
        object_output::<String>(None)
            .expect("text")
            .write(&"raw".to_owned(), &mut out)
            .expect("writable");
        assert_eq!(out, b"raw");

        out.clear();
        object_output::<String>(Some("application/json"))
            .expect("json")
            .write(&"raw".to_owned(), &mut out)
            .expect("writable");
        assert_eq!(out, b"\"raw\"");

        assert!(object_output::<Item>(Some("text/plain")).is_err());
    }
}
