//! # Errors
//!
//! Every failure that reaches a client is a [`SocietyError`]: a kind with a
//! status code, a Feathers-style `name`/`className`, a message and optional
//! per-field `errors`. It travels inside `anyhow::Error` through services and
//! hooks, and the HTTP adapter downcasts it back to shape the response.

use std::fmt;

use anyhow::Error as AnyError;
use serde_json::Value;

pub type SocietyResult<T> = std::result::Result<T, AnyError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,
    NotAuthenticated,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    Conflict,
    Gone,
    Unprocessable,
    GeneralError,
    NotImplemented,
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotAuthenticated => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::MethodNotAllowed => 405,
            ErrorKind::Conflict => 409,
            ErrorKind::Gone => 410,
            ErrorKind::Unprocessable => 422,
            ErrorKind::GeneralError => 500,
            ErrorKind::NotImplemented => 501,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::NotAuthenticated => "NotAuthenticated",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::MethodNotAllowed => "MethodNotAllowed",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::Gone => "Gone",
            ErrorKind::Unprocessable => "Unprocessable",
            ErrorKind::GeneralError => "GeneralError",
            ErrorKind::NotImplemented => "NotImplemented",
        }
    }

    /// Kebab-cased `className`.
    pub fn class_name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad-request",
            ErrorKind::NotAuthenticated => "not-authenticated",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not-found",
            ErrorKind::MethodNotAllowed => "method-not-allowed",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Gone => "gone",
            ErrorKind::Unprocessable => "unprocessable",
            ErrorKind::GeneralError => "general-error",
            ErrorKind::NotImplemented => "not-implemented",
        }
    }
}

#[derive(Debug)]
pub struct SocietyError {
    pub kind: ErrorKind,
    pub message: String,
    pub data: Option<Value>,
    pub errors: Option<Value>,
    pub source: Option<AnyError>,
}

impl SocietyError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            data: None,
            errors: None,
            source: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_errors(mut self, errors: Value) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn with_source(mut self, source: AnyError) -> Self {
        self.source = Some(source);
        self
    }

    pub fn code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn class_name(&self) -> &'static str {
        self.kind.class_name()
    }

    pub fn into_anyhow(self) -> AnyError {
        AnyError::new(self)
    }

    /// Find a `SocietyError` anywhere in the context chain of `err`.
    pub fn from_anyhow(err: &AnyError) -> Option<&SocietyError> {
        err.chain().find_map(|e| e.downcast_ref::<SocietyError>())
    }

    /// Keep a `SocietyError` as is, wrap anything else as `GeneralError`.
    pub fn normalize(err: AnyError) -> SocietyError {
        match err.downcast::<SocietyError>() {
            Ok(e) => e,
            Err(other) => SocietyError::general_error(other.to_string()).with_source(other),
        }
    }

    /// Copy without the inner source, safe to hand to clients.
    pub fn sanitize_for_client(&self) -> SocietyError {
        SocietyError {
            kind: self.kind,
            message: self.message.clone(),
            data: self.data.clone(),
            errors: self.errors.clone(),
            source: None,
        }
    }

    pub fn to_json(&self) -> Value {
        let mut base = serde_json::json!({
            "name": self.name(),
            "message": self.message,
            "code": self.code(),
            "className": self.class_name(),
        });

        if let Some(d) = &self.data {
            base["data"] = d.clone();
        }
        if let Some(e) = &self.errors {
            base["errors"] = e.clone();
        }
        base
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, msg)
    }
    pub fn not_authenticated(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotAuthenticated, msg)
    }
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, msg)
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }
    pub fn method_not_allowed(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::MethodNotAllowed, msg)
    }
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, msg)
    }
    pub fn gone(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Gone, msg)
    }
    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unprocessable, msg)
    }
    pub fn general_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::GeneralError, msg)
    }
    pub fn not_implemented(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotImplemented, msg)
    }
}

impl fmt::Display for SocietyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.code(), self.message)
    }
}

impl std::error::Error for SocietyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// `return Err(SocietyError::<ctor>(msg).into_anyhow())`
#[macro_export]
macro_rules! bail_society {
    ($ctor:ident, $msg:expr) => {
        return Err($crate::errors::SocietyError::$ctor($msg).into_anyhow())
    };
    ($ctor:ident, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::errors::SocietyError::$ctor(format!($fmt, $($arg)*)).into_anyhow())
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn normalize_keeps_structured_errors() {
        let err = SocietyError::conflict("already paid").into_anyhow();
        let e = SocietyError::normalize(err);
        assert_eq!(e.kind, ErrorKind::Conflict);
        assert_eq!(e.code(), 409);
    }

    #[test]
    fn normalize_wraps_plain_errors_as_general() {
        let e = SocietyError::normalize(anyhow::anyhow!("disk on fire"));
        assert_eq!(e.kind, ErrorKind::GeneralError);
        assert!(e.source.is_some());
        assert!(e.sanitize_for_client().source.is_none());
    }

    #[test]
    fn from_anyhow_sees_through_context() {
        let err: anyhow::Result<()> = Err(SocietyError::not_found("Resident not found").into_anyhow());
        let err = err.context("loading resident").unwrap_err();
        let found = SocietyError::from_anyhow(&err).unwrap();
        assert_eq!(found.kind, ErrorKind::NotFound);
    }

    #[test]
    fn json_payload_has_feathers_fields() {
        let body = SocietyError::unprocessable("Residents schema validation failed")
            .with_errors(serde_json::json!({"email": ["must be a valid email"]}))
            .to_json();
        assert_eq!(body["name"], "Unprocessable");
        assert_eq!(body["className"], "unprocessable");
        assert_eq!(body["code"], 422);
        assert_eq!(body["errors"]["email"][0], "must be a valid email");
    }
}
