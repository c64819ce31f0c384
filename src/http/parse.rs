//! Cookie header and request body parsing.

use std::collections::BTreeMap;

use percent_encoding::percent_decode_str;
use url::form_urlencoded;

use crate::http::params::Params;

/// Parse a `Cookie` header.
///
/// Pieces are split on `;`, then on the first `=`. Keys are trimmed, values
/// are percent-decoded. The last occurrence of a key wins.
pub fn parse_cookies(header: &str) -> BTreeMap<String, String> {
    let mut cookies = BTreeMap::new();
    for piece in header.split(';') {
        let Some((key, value)) = piece.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        let value = value.trim();
        let decoded = percent_decode_str(value)
            .decode_utf8()
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| value.to_string());
        cookies.insert(key.to_string(), decoded);
    }
    cookies
}

/// Parse a request body into parameters.
///
/// URL-encoded form data is tried first, then a JSON object. Anything else
/// yields an empty map. A body declared as JSON skips the form attempt.
pub fn parse_body(bytes: &[u8], content_type: Option<&str>) -> Params {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Params::new();
    }

    let declared_json = content_type.map(is_json_content_type).unwrap_or(false);
    if !declared_json {
        if let Some(params) = parse_form(bytes) {
            return params;
        }
    }

    match parse_json(bytes) {
        Some(params) => params,
        None => {
            tracing::debug!(
                len = bytes.len(),
                content_type = content_type.unwrap_or("none"),
                "Unparsable request body, treating as empty"
            );
            Params::new()
        }
    }
}

fn is_json_content_type(content_type: &str) -> bool {
    let mime = content_type.split(';').next().unwrap_or("").trim();
    mime.eq_ignore_ascii_case("application/json") || mime.ends_with("+json")
}

/// A JSON document parses as a single garbled form key, so anything that
/// starts like a JSON container is never accepted as form data.
fn looks_like_json(bytes: &[u8]) -> bool {
    matches!(
        bytes.iter().find(|b| !b.is_ascii_whitespace()),
        Some(&b'{') | Some(&b'[')
    )
}

fn parse_form(bytes: &[u8]) -> Option<Params> {
    if looks_like_json(bytes) || std::str::from_utf8(bytes).is_err() {
        return None;
    }

    let mut params = Params::new();
    for (key, value) in form_urlencoded::parse(bytes) {
        if key.is_empty() {
            continue;
        }
        params.insert_raw(key.into_owned(), value.into_owned());
    }

    if params.is_empty() {
        None
    } else {
        Some(params)
    }
}

fn parse_json(bytes: &[u8]) -> Option<Params> {
    match serde_json::from_slice::<serde_json::Value>(bytes) {
        Ok(serde_json::Value::Object(map)) => Some(Params::from_json_object(&map)),
        _ => None,
    }
}
