//! Response handling and transformation.
//!
//! # Responsibilities
//! - Turn the destination's response head into the head relayed to the client
//! - Wrap the relayed body so every chunk is captured on its way out
//!
//! # Design Decisions
//! - Status, version and end-to-end headers pass through unchanged
//! - Hop-by-hop headers are stripped; hyper frames the client response itself
//! - The body is a stream, never collected here

use axum::body::Body;
use axum::response::Response;
use bytes::Bytes;
use futures_util::stream::BoxStream;

use crate::capture::{CaptureStream, ResponseHead};
use crate::security::headers::strip_hop_by_hop;

/// Destination body as relayed to the client.
pub type RelayStream = BoxStream<'static, reqwest::Result<Bytes>>;

/// Head of the destination response, as the client will see it.
pub fn relay_head(response: &reqwest::Response) -> ResponseHead {
    let mut headers = response.headers().clone();
    strip_hop_by_hop(&mut headers);
    ResponseHead::new(response.status(), response.version(), headers)
}

/// Build the client response from the relayed head and captured body.
pub fn client_response(head: &ResponseHead, body: CaptureStream<RelayStream>) -> Response {
    let mut response = Response::new(Body::from_stream(body));
    *response.status_mut() = head.status;
    *response.headers_mut() = head.headers.clone();
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{closed_signal, CaptureBuffer, ContentClass};
    use axum::body::to_bytes;
    use axum::http::{header, HeaderMap, HeaderValue, StatusCode, Version};
    use futures_util::{stream, StreamExt};

    #[test]
    fn test_relay_head_strips_hop_by_hop() {
        let upstream = axum::http::Response::builder()
            .status(StatusCode::CREATED)
            .header(header::CONTENT_TYPE, "text/event-stream")
            .header(header::TRANSFER_ENCODING, "chunked")
            .header(header::CONNECTION, "keep-alive")
            .header("x-trace", "abc")
            .body(Vec::<u8>::new())
            .unwrap();
        let head = relay_head(&reqwest::Response::from(upstream));

        assert_eq!(head.status, StatusCode::CREATED);
        assert_eq!(head.class, ContentClass::Streaming);
        assert_eq!(head.headers["x-trace"], "abc");
        assert!(head.headers.get(header::TRANSFER_ENCODING).is_none());
        assert!(head.headers.get(header::CONNECTION).is_none());
    }

    #[tokio::test]
    async fn test_client_response_captures_body() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        headers.insert("x-trace", HeaderValue::from_static("abc"));
        let head = ResponseHead::new(StatusCode::ACCEPTED, Version::HTTP_11, headers);

        let chunks: Vec<reqwest::Result<Bytes>> =
            vec![Ok(Bytes::from_static(b"he")), Ok(Bytes::from_static(b"llo"))];
        let buffer = CaptureBuffer::new();
        let (guard, watch) = closed_signal();
        let body = CaptureStream::new(stream::iter(chunks).boxed(), buffer.clone(), guard);

        let response = client_response(&head, body);
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers()["x-trace"], "abc");

        let bytes = to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&bytes[..], b"hello");
        watch.closed().await;
        assert_eq!(&buffer.snapshot()[..], b"hello");
    }
}
