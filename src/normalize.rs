use serde_json::Value as JsonValue;

use crate::{Answer, QaError, RawResponse};

/// What the retry loop should do with one HTTP response.
#[derive(Debug)]
pub(crate) enum Normalized {
    /// Terminal outcome for this call.
    Done(Result<Answer, QaError>),
    /// The service is rate limiting or still loading the model.
    Retry,
}

pub(crate) fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 503)
}

/// Maps a raw response onto the outcome the client reports.
pub(crate) fn normalize(response: &RawResponse) -> Normalized {
    match response.status {
        200 => Normalized::Done(decode_answer(&response.body)),
        status if is_retryable_status(status) => Normalized::Retry,
        status => Normalized::Done(Err(QaError::Remote {
            status,
            message: remote_error_message(status, &response.body),
        })),
    }
}

/// Decodes a success body. Missing `answer`/`score` fall back to `""`/`0.0`;
/// anything other than a JSON object is a parse error.
fn decode_answer(body: &str) -> Result<Answer, QaError> {
    let parse_error = |message: String| QaError::Parse {
        status: 200,
        message,
    };
    // Derived struct decoding also accepts positional arrays; only objects are answers.
    match serde_json::from_str::<JsonValue>(body).map_err(|err| parse_error(err.to_string()))? {
        object @ JsonValue::Object(_) => {
            serde_json::from_value::<Answer>(object).map_err(|err| parse_error(err.to_string()))
        }
        other => Err(parse_error(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

/// Extracts the upstream message from an error body.
///
/// Uses the `error` field of a JSON object, the whole object when it has no
/// such field, and `HTTP <status>` when the body is not a JSON object.
fn remote_error_message(status: u16, body: &str) -> String {
    let fallback = || format!("HTTP {status}");
    let Ok(JsonValue::Object(object)) = serde_json::from_str::<JsonValue>(body) else {
        return fallback();
    };
    match object.get("error") {
        Some(JsonValue::String(message)) => message.clone(),
        Some(other) => other.to_string(),
        None => JsonValue::Object(object).to_string(),
    }
}
