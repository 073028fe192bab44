/// Centralized helpers for WebSocket and HTTP error responses.
///
/// Every error carries a code, a human-readable message and an optional context.
use actix_web::{HttpResponse, http::StatusCode};
use serde_json::{json, Value};

/// Formats a WebSocket error frame, `{"action":"error","data":{...}}`.
///
/// # Arguments
/// - `code`: Unique error code (e.g. "INVALID_MESSAGE").
/// - `message`: Human-readable error message.
/// - `context`: Optional context (e.g. the parser error).
pub fn ws_error_message(code: &str, message: &str, context: Option<Value>) -> String {
    json!({
        "action": "error",
        "data": {
            "code": code,
            "message": message,
            "context": context.unwrap_or(Value::Null),
        }
    })
    .to_string()
}

/// Returns an HTTP error response with a JSON body.
pub fn http_error_response(
    code: &str,
    message: &str,
    context: Option<&str>,
    status: StatusCode,
) -> HttpResponse {
    let body = json!({
        "error": {
            "code": code,
            "message": message,
            "context": context.unwrap_or(""),
        }
    });
    HttpResponse::build(status).json(body)
}
