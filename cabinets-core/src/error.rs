//! Error types for store setup and dispatch.
//!
//! Every failure carries an [`ErrorInfo`] bundle describing the store, the
//! action (or attempted operations), the state and payload at the time of
//! failure, and the underlying message.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = CabinetsError> = std::result::Result<T, E>;

/// Context captured when a setup or dispatch step fails.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorInfo {
    pub store: Option<String>,
    pub action: Option<String>,
    pub operations: Option<Vec<String>>,
    pub state: Option<Value>,
    pub payload: Option<Value>,
    pub error: String,
}

impl ErrorInfo {
    /// Start a bundle from the underlying error message.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            ..Self::default()
        }
    }

    /// Start a bundle from a callback error, keeping its context chain.
    pub(crate) fn from_anyhow(error: &anyhow::Error) -> Self {
        Self::new(format!("{error:#}"))
    }

    pub fn with_store(mut self, store: impl Into<String>) -> Self {
        self.store = Some(store.into());
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_operations<I, S>(mut self, operations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.operations = Some(operations.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_state(mut self, state: Value) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_payload(mut self, payload: Option<Value>) -> Self {
        self.payload = payload;
        self
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(store) = &self.store {
            parts.push(format!("Store : {}", Value::from(store.as_str())));
        }
        if let Some(action) = &self.action {
            parts.push(format!("Action : {}", Value::from(action.as_str())));
        }
        if let Some(operations) = &self.operations {
            parts.push(format!("Operations : {}", Value::from(operations.clone())));
        }
        if let Some(state) = &self.state {
            parts.push(format!("State : {state}"));
        }
        if let Some(payload) = &self.payload {
            parts.push(format!("Payload : {payload}"));
        }
        parts.push(format!("Error : {}", Value::from(self.error.as_str())));
        f.write_str(&parts.join(" , "))
    }
}

/// Errors raised by store setup, composition and dispatch.
#[derive(Debug, Error)]
pub enum CabinetsError {
    /// The store could not be built or mounted.
    #[error("failed to set up store: {0}")]
    SetupStore(ErrorInfo),

    /// The action's payload map failed; the reducer was not invoked.
    #[error("failed to map payload before reducing: {0}")]
    Mapping(ErrorInfo),

    /// The interceptor failed; the reducer was not invoked.
    #[error("interceptor failed before reducing: {0}")]
    Interceptor(ErrorInfo),

    /// A synchronous reducer returned an error.
    #[error("reducer failed: {0}")]
    Reducer(ErrorInfo),

    /// An asynchronous reducer's future resolved to an error.
    #[error("async reducer failed: {0}")]
    AsyncReducer(ErrorInfo),

    /// No store owns the action, or the dispatch failed for another reason.
    #[error("failed to dispatch action: {0}")]
    Dispatch(ErrorInfo),

    #[error("store `{name}` is not mounted")]
    NotMounted { name: String },

    /// The state could not be decoded into the requested type.
    #[error("failed to decode state of store `{store}`: {source}")]
    Decode {
        store: String,
        #[source]
        source: serde_json::Error,
    },
}

impl CabinetsError {
    /// The context bundle, for the variants that carry one.
    pub fn info(&self) -> Option<&ErrorInfo> {
        match self {
            Self::SetupStore(info)
            | Self::Mapping(info)
            | Self::Interceptor(info)
            | Self::Reducer(info)
            | Self::AsyncReducer(info)
            | Self::Dispatch(info) => Some(info),
            Self::NotMounted { .. } | Self::Decode { .. } => None,
        }
    }

    /// Short name of the error kind, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SetupStore(_) => "setup_store",
            Self::Mapping(_) => "mapping",
            Self::Interceptor(_) => "interceptor",
            Self::Reducer(_) => "reducer",
            Self::AsyncReducer(_) => "async_reducer",
            Self::Dispatch(_) => "dispatch",
            Self::NotMounted { .. } => "not_mounted",
            Self::Decode { .. } => "decode",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn info_renders_present_fields_only() {
        let info = ErrorInfo::new("boom")
            .with_store("counter")
            .with_action("inc")
            .with_state(json!({"count": 1}));

        assert_eq!(
            info.to_string(),
            r#"Store : "counter" , Action : "inc" , State : {"count":1} , Error : "boom""#
        );
    }

    #[test]
    fn payload_is_rendered_when_supplied() {
        let info = ErrorInfo::new("bad").with_payload(Some(json!(0)));
        assert_eq!(info.to_string(), r#"Payload : 0 , Error : "bad""#);
    }

    #[test]
    fn operations_are_listed() {
        let info = ErrorInfo::new("empty").with_operations(Vec::<String>::new());
        assert_eq!(info.to_string(), r#"Operations : [] , Error : "empty""#);
    }

    #[test]
    fn anyhow_context_chain_is_kept() {
        let err = anyhow::anyhow!("root cause").context("while mapping");
        let info = ErrorInfo::from_anyhow(&err);
        assert_eq!(info.error, "while mapping: root cause");
    }

    #[test]
    fn kinds_expose_info() {
        let err = CabinetsError::Reducer(ErrorInfo::new("x").with_store("s"));
        assert_eq!(err.kind(), "reducer");
        assert_eq!(err.info().and_then(|i| i.store.as_deref()), Some("s"));

        let err = CabinetsError::NotMounted { name: "s".into() };
        assert!(err.info().is_none());
        assert_eq!(err.to_string(), "store `s` is not mounted");
    }
}
