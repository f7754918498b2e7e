use http::header::{self, HeaderName};
use tower_http::trace::{MakeSpan, OnResponse};
use tracing::Level;

/// One `server.request` span per API call, named after the matched route so
/// `/api/recipes/{recipe_id}/` groups every recipe rather than one per id.
#[derive(Debug, Clone, Copy)]
pub struct Tracer;

impl<Body> MakeSpan<Body> for Tracer {
    fn make_span(&mut self, request: &http::Request<Body>) -> tracing::Span {
        let route = http_route(request);

        tracing::span!(
            Level::INFO,
            "server.request",
            otel.name = format!("{} {}", request.method(), route),
            http.route = route,
            http.request.method = %request.method(),
            url.path = %request.uri().path(),
            url.query = request.uri().query(),
            user_agent.original = header_str(request, &header::USER_AGENT),
            request_id = header_str(request, &HeaderName::from_static("x-request-id")),
            enduser.authenticated = request.headers().contains_key(header::AUTHORIZATION),
            http.response.status_code = tracing::field::Empty,
        )
    }
}

impl<Body> OnResponse<Body> for Tracer {
    fn on_response(
        self,
        response: &http::Response<Body>,
        latency: std::time::Duration,
        span: &tracing::Span,
    ) {
        let status_code = response.status().as_u16();
        span.record("http.response.status_code", status_code);

        tracing::event!(
            Level::INFO,
            status = status_code,
            latency = format_args!("{} ms", latency.as_millis()),
            "finished processing request"
        );
    }
}

fn http_route<B>(req: &http::Request<B>) -> &str {
    req.extensions()
        .get::<axum::extract::MatchedPath>()
        .map_or("", |mp| mp.as_str())
}

fn header_str<'r, B>(req: &'r http::Request<B>, name: &HeaderName) -> Option<&'r str> {
    req.headers().get(name).and_then(|h| h.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_is_empty_before_matching() {
        let request = http::Request::builder()
            .uri("/api/recipes/")
            .body(())
            .unwrap();

        assert_eq!(http_route(&request), "");
    }

    #[test]
    fn unreadable_headers_are_skipped() {
        let request = http::Request::builder()
            .header(header::USER_AGENT, "curl/8.0")
            .header("x-request-id", http::HeaderValue::from_bytes(b"\xff").unwrap())
            .body(())
            .unwrap();

        assert_eq!(header_str(&request, &header::USER_AGENT), Some("curl/8.0"));
        assert_eq!(
            header_str(&request, &HeaderName::from_static("x-request-id")),
            None
        );
    }
}
