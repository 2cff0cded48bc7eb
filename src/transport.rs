//! Network transport seam
//!
//! The interceptor forwards requests it cannot (or must not) answer from the cache to
//! the next link of the chain. Queries and mutations produce one response; a
//! subscription may produce any number. A failure ends the sequence.

use crate::error::NetworkError;
use crate::operation::GraphqlError;
use crate::request::{Request, Response};
use futures::Stream;
use serde_json::Value;
use std::pin::Pin;

/// Lazy sequence of responses produced by a transport
pub type ResponseSequence = Pin<Box<dyn Stream<Item = Result<Response, NetworkError>> + Send>>;

/// Downstream link of the interceptor chain
pub trait Transport: Send + Sync {
    fn proceed(&self, request: Request) -> ResponseSequence;
}

/// Decode a GraphQL-over-HTTP JSON body (`{"data": .., "errors": [..]}`) into a response
pub fn decode_response(request: &Request, body: &str) -> Result<Response, NetworkError> {
    let payload: Value =
        serde_json::from_str(body).map_err(|e| NetworkError::Decode(e.to_string()))?;
    let Value::Object(mut payload) = payload else {
        return Err(NetworkError::Decode(
            "response body must be a JSON object".to_string(),
        ));
    };
    let data = payload.remove("data").filter(|data| !data.is_null());
    let errors = match payload.remove("errors") {
        None | Some(Value::Null) => None,
        Some(errors) => Some(
            serde_json::from_value::<Vec<GraphqlError>>(errors)
                .map_err(|e| NetworkError::Decode(format!("invalid errors entry: {}", e)))?,
        ),
    };
    if data.is_none() && errors.is_none() {
        return Err(NetworkError::Decode(
            "response has neither data nor errors".to_string(),
        ));
    }
    Ok(Response::new(request, data, errors))
}
