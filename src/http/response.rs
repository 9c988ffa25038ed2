//! Values handlers attach to their responses for the request logger.
//!
//! Handlers return these as response parts:
//! ```ignore
//! (StatusCode::BAD_GATEWAY, HandlerErrors::from(HandlerError::private("upstream down")), "try later")
//! ```

use std::convert::Infallible;

use axum::response::{IntoResponseParts, Response, ResponseParts};
use serde_json::Value;

use crate::policy::HandlerError;

/// Errors reported by the handler chain. Any entry forces ERROR severity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerErrors(pub Vec<HandlerError>);

impl HandlerErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: HandlerError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append `error` to the errors already attached to `response`.
    pub fn attach(response: &mut Response, error: HandlerError) {
        let extensions = response.extensions_mut();
        match extensions.get_mut::<HandlerErrors>() {
            Some(existing) => existing.push(error),
            None => {
                extensions.insert(HandlerErrors(vec![error]));
            }
        }
    }
}

impl From<HandlerError> for HandlerErrors {
    fn from(error: HandlerError) -> Self {
        Self(vec![error])
    }
}

impl IntoResponseParts for HandlerErrors {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        let extensions = res.extensions_mut();
        match extensions.get_mut::<HandlerErrors>() {
            Some(existing) => existing.0.extend(self.0),
            None => {
                extensions.insert(self);
            }
        }
        Ok(res)
    }
}

/// Opaque correlation value copied into the entry's `at` field.
///
/// Read from the response first, then from the request extensions.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationKey(pub Value);

impl CorrelationKey {
    pub fn new(value: impl Into<Value>) -> Self {
        Self(value.into())
    }
}

impl IntoResponseParts for CorrelationKey {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        res.extensions_mut().insert(self);
        Ok(res)
    }
}
