//! Outgoing responses whose body is produced by a deferred writer.

use std::fmt;
use std::io::Write;

use crate::error::RewriteError;

/// Writes a response body into the transport's sink.
pub type BodyProducer = Box<dyn FnOnce(&mut dyn Write) -> Result<(), RewriteError> + Send>;

/// Response produced by a handler.
pub struct Response {
  /// HTTP status code.
  pub status: u16,
  /// Value of the `Content-Type` header, including any `charset` parameter.
  pub content_type: String,
  body: BodyProducer,
}

impl Response {
  /// Create a response from an arbitrary body producer.
  pub fn new(status: u16, content_type: impl Into<String>, body: BodyProducer) -> Self {
    Self {
      status,
      content_type: content_type.into(),
      body,
    }
  }

  /// `200 OK` UTF-8 HTML response.
  pub fn html(body: impl Into<String>) -> Self {
    Self::from_bytes(200, "text/html; charset=utf-8", body.into().into_bytes())
  }

  /// Response writing `bytes` verbatim.
  pub fn from_bytes(status: u16, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
    Self::new(
      status,
      content_type,
      Box::new(move |sink: &mut dyn Write| -> Result<(), RewriteError> {
        sink.write_all(&bytes)?;
        Ok(())
      }),
    )
  }

  /// Replace the body producer with one derived from the current producer.
  pub fn map_body<F>(self, wrap: F) -> Self
  where
    F: FnOnce(BodyProducer) -> BodyProducer,
  {
    Self {
      status: self.status,
      content_type: self.content_type,
      body: wrap(self.body),
    }
  }

  /// Run the body producer against `sink`.
  pub fn write_body(self, sink: &mut dyn Write) -> Result<(), RewriteError> {
    (self.body)(sink)
  }

  /// Run the body producer into memory.
  pub fn into_bytes(self) -> Result<Vec<u8>, RewriteError> {
    let mut buffer = Vec::new();
    self.write_body(&mut buffer)?;
    Ok(buffer)
  }
}

impl fmt::Debug for Response {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Response")
      .field("status", &self.status)
      .field("content_type", &self.content_type)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn html_responses_write_their_body() {
    let response = Response::html("<p>hi</p>");
    assert_eq!(response.status, 200);
    assert_eq!(response.content_type, "text/html; charset=utf-8");
    assert_eq!(response.into_bytes().unwrap(), b"<p>hi</p>");
  }

  #[test]
  fn map_body_wraps_the_producer() {
    let response = Response::from_bytes(404, "text/plain", b"missing".to_vec()).map_body(|inner| {
      Box::new(move |sink: &mut dyn Write| -> Result<(), RewriteError> {
        sink.write_all(b"[")?;
        inner(&mut *sink)?;
        sink.write_all(b"]")?;
        Ok(())
      })
    });
    assert_eq!(response.status, 404);
    assert_eq!(response.into_bytes().unwrap(), b"[missing]");
  }
}
