//! Types of the `http_request` façade.

use candid::{CandidType, Deserialize, Reserved};

pub use callback::StreamingCallback;

/// A header as an ordered `(name, value)` pair, `record { text; text }` on the wire.
#[derive(Clone, Debug, PartialEq, Eq, CandidType, Deserialize)]
pub struct HttpHeader(pub String, pub String);

impl HttpHeader {
    /// Create a header.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self(name.into(), value.into())
    }

    /// Header name.
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Header value.
    pub fn value(&self) -> &str {
        &self.1
    }
}

/// Argument of `http_request`.
#[derive(Clone, Debug, Default, PartialEq, Eq, CandidType, Deserialize)]
pub struct HttpRequest {
    /// Request URL, usually a path.
    pub url: String,
    /// HTTP method.
    pub method: String,
    /// Optional request body.
    pub body: Option<Vec<u8>>,
    /// Headers, in order.
    pub headers: Vec<HttpHeader>,
}

impl HttpRequest {
    /// A request with no body and no headers.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            ..Self::default()
        }
    }

    /// Append a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(HttpHeader::new(name, value));
        self
    }

    /// Set the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }
}

mod callback {
    #![allow(missing_docs)]

    candid::define_function!(pub StreamingCallback : () -> ());
}

/// Continuation of a streamed body. Decoded when present, never followed.
///
/// The service's token is a record of its own choosing; it is kept opaque.
#[derive(Clone, Debug, PartialEq, Eq, CandidType, Deserialize)]
pub struct CallbackStrategy {
    /// Method to call for the next chunk.
    pub callback: StreamingCallback,
    /// Whatever the service passes back to the callback.
    pub token: Reserved,
}

/// How the remainder of a large body can be fetched.
#[derive(Clone, Debug, PartialEq, Eq, CandidType, Deserialize)]
pub enum StreamingStrategy {
    /// Fetch further chunks through a callback method.
    Callback(CallbackStrategy),
}

/// Reply of `http_request`.
#[derive(Clone, Debug, Default, PartialEq, Eq, CandidType, Deserialize)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status_code: u16,
    /// Headers, in order.
    pub headers: Vec<HttpHeader>,
    /// Response body.
    pub body: Vec<u8>,
    /// `Some(true)` asks the caller to repeat the call in update mode.
    pub upgrade: Option<bool>,
    /// Continuation for streamed bodies.
    pub streaming_strategy: Option<StreamingStrategy>,
}

impl HttpResponse {
    /// Whether the reply must be re-requested as an update call.
    pub fn wants_upgrade(&self) -> bool {
        self.upgrade == Some(true)
    }
}
