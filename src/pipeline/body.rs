//! Response payloads and the per-request body cell.

use axum::body::Bytes;

/// A response payload that has not been written yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Binary(Bytes),
}

impl Payload {
    pub fn into_bytes(self) -> Bytes {
        match self {
            Payload::Text(text) => Bytes::from(text),
            Payload::Binary(bytes) => bytes,
        }
    }

    /// Text view; binary payloads are decoded lossily.
    pub fn into_text(self) -> String {
        match self {
            Payload::Text(text) => text,
            Payload::Binary(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            Payload::Binary(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Payload::Text(text) => text.len(),
            Payload::Binary(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Payload {
    fn default() -> Self {
        Payload::Text(String::new())
    }
}

/// Conversion from handler return values. `None` means "no result".
pub trait IntoBody {
    fn into_body(self) -> Option<Payload>;
}

impl IntoBody for Payload {
    fn into_body(self) -> Option<Payload> {
        Some(self)
    }
}

impl IntoBody for String {
    fn into_body(self) -> Option<Payload> {
        Some(Payload::Text(self))
    }
}

impl IntoBody for &'static str {
    fn into_body(self) -> Option<Payload> {
        Some(Payload::Text(self.to_string()))
    }
}

impl IntoBody for Vec<u8> {
    fn into_body(self) -> Option<Payload> {
        Some(Payload::Binary(Bytes::from(self)))
    }
}

impl IntoBody for Bytes {
    fn into_body(self) -> Option<Payload> {
        Some(Payload::Binary(self))
    }
}

impl IntoBody for serde_json::Value {
    fn into_body(self) -> Option<Payload> {
        Some(Payload::Text(self.to_string()))
    }
}

impl IntoBody for () {
    fn into_body(self) -> Option<Payload> {
        None
    }
}

impl<T: IntoBody> IntoBody for Option<T> {
    fn into_body(self) -> Option<Payload> {
        self.and_then(IntoBody::into_body)
    }
}

/// Single mutable cell holding the response payload until serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Body {
    content: Option<Payload>,
}

impl Body {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.content.is_some()
    }

    pub fn is_unset(&self) -> bool {
        self.content.is_none()
    }

    pub fn get(&self) -> Option<&Payload> {
        self.content.as_ref()
    }

    pub fn set(&mut self, content: impl IntoBody) {
        if let Some(payload) = content.into_body() {
            self.content = Some(payload);
        }
    }

    /// Set only when nothing has been set yet.
    pub fn set_if_unset(&mut self, content: Option<Payload>) {
        if self.content.is_none() {
            self.content = content;
        }
    }

    pub fn clear(&mut self) {
        self.content = None;
    }

    /// Move the payload out for serialization.
    pub(crate) fn take(&mut self) -> Option<Payload> {
        self.content.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_lifecycle() {
        let mut body = Body::new();
        assert!(body.is_unset());

        body.set("hello");
        assert!(body.is_set());
        assert_eq!(body.get().and_then(Payload::as_text), Some("hello"));

        body.set_if_unset(Some(Payload::Text("ignored".into())));
        assert_eq!(body.get().and_then(Payload::as_text), Some("hello"));

        assert_eq!(body.take(), Some(Payload::Text("hello".into())));
        assert!(body.is_unset());
    }

    #[test]
    fn test_absent_results_leave_body_unset() {
        let mut body = Body::new();
        body.set(());
        body.set(None::<String>);
        assert!(body.is_unset());
    }

    #[test]
    fn test_binary_payloads() {
        let payload = b"Hello World!".to_vec().into_body().unwrap();
        assert_eq!(payload.len(), 12);
        assert_eq!(payload.into_text(), "Hello World!");
    }
}
