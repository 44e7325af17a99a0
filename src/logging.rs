//! Middleware for logging requests and responses.

use axum::{
    extract::Request,
    http::{
        HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware::Next,
    response::Response,
};

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is truncated
/// and the full body is logged at the `debug` level. Credentials are
/// redacted before logging: password fields in JSON request bodies, token
/// fields in JSON response bodies, and the `Authorization` header.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (mut parts, body_text) = extract_parts_and_body_text_from_request(request).await;

    let is_json_write = matches!(parts.method, Method::POST | Method::PUT)
        && parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/json"));

    let display_text = if is_json_write {
        redact_json_string_field(&body_text, "password")
    } else {
        body_text.clone()
    };

    // The bearer token must not land in the logs, but the handler still
    // needs it: mask the header while logging and restore it afterwards.
    let authorization = parts.headers.get(AUTHORIZATION).cloned();
    if authorization.is_some() {
        parts
            .headers
            .insert(AUTHORIZATION, HeaderValue::from_static("********"));
    }

    log_request(&parts, &display_text);

    if let Some(value) = authorization {
        parts.headers.insert(AUTHORIZATION, value);
    }

    let request = Request::from_parts(parts, body_text.into());
    let response = next.run(request).await;

    let (parts, body_text) = extract_parts_and_body_text_from_response(response).await;

    // Register and log in responses carry a fresh bearer token.
    let display_text = redact_json_string_field(&body_text, "token");
    log_response(&parts, &display_text);

    Response::from_parts(parts, body_text.into())
}

/// Replace the string value of `field_name` in a JSON body with asterisks.
///
/// Works on the raw text rather than a parsed document so malformed bodies
/// still get logged.
fn redact_json_string_field(body_text: &str, field_name: &str) -> String {
    let needle = format!("\"{field_name}\"");

    let Some(key_start) = body_text.find(&needle) else {
        return body_text.to_string();
    };

    let after_key = &body_text[key_start + needle.len()..];
    let Some(colon_offset) = after_key.find(':') else {
        return body_text.to_string();
    };

    let after_colon = after_key[colon_offset + 1..].trim_start();
    if !after_colon.starts_with('"') {
        return body_text.to_string();
    }

    let value_start = body_text.len() - after_colon.len() + 1;
    let mut value_end = None;
    let mut escaped = false;

    for (offset, character) in body_text[value_start..].char_indices() {
        match character {
            '\\' if !escaped => escaped = true,
            '"' if !escaped => {
                value_end = Some(value_start + offset);
                break;
            }
            _ => escaped = false,
        }
    }

    match value_end {
        Some(value_end) => {
            format!(
                "{}********{}",
                &body_text[..value_start],
                &body_text[value_end..]
            )
        }
        None => body_text.to_string(),
    }
}

async fn extract_parts_and_body_text_from_request(
    request: Request,
) -> (axum::http::request::Parts, String) {
    let (parts, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();

    (parts, String::from_utf8_lossy(&body_bytes).to_string())
}

async fn extract_parts_and_body_text_from_response(
    response: Response,
) -> (axum::http::response::Parts, String) {
    let (parts, body) = response.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();

    (parts, String::from_utf8_lossy(&body_bytes).to_string())
}

const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Truncate `body` to at most [LOG_BODY_LENGTH_LIMIT] bytes, backing up to
/// the previous char boundary so a multi-byte character straddling the limit
/// is dropped rather than split.
fn truncate_body(body: &str) -> &str {
    let mut end = LOG_BODY_LENGTH_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }

    &body[..end]
}

fn log_request(parts: &axum::http::request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!("Received request: {parts:#?}\nbody: {:}...", truncate_body(body));
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!("Received request: {parts:#?}\nbody: {body:?}");
    }
}

fn log_response(parts: &axum::http::response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!("Sending response: {parts:#?}\nbody: {:}...", truncate_body(body));
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {parts:#?}\nbody: {body:?}");
    }
}



#[cfg(test)]
mod middleware_tests {
    use axum::{
        Router,
        http::{HeaderMap, header::AUTHORIZATION},
        middleware,
        routing::{get, post},
    };
    use axum_test::TestServer;

    use super::logging_middleware;

    async fn echo_authorization(headers: HeaderMap) -> String {
        headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_owned()
    }

    async fn echo_body(body: String) -> String {
        body
    }

    fn get_test_server() -> TestServer {
        let app = Router::new()
            .route("/auth", get(echo_authorization))
            .route("/body", post(echo_body))
            .layer(middleware::from_fn(logging_middleware));

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn handler_still_sees_the_original_authorization_header() {
        let server = get_test_server();

        let response = server.get("/auth").authorization_bearer("sometoken").await;

        response.assert_status_ok();
        response.assert_text("Bearer sometoken");
    }

    #[tokio::test]
    async fn long_multibyte_bodies_pass_through_unchanged() {
        let server = get_test_server();
        let body = format!("{}€€€€", "a".repeat(62));

        let response = server.post("/body").text(body.clone()).await;

        response.assert_status_ok();
        response.assert_text(&body);
    }
}
