//! Cabinets Core
//!
//! This crate provides named state stores for applications that need
//! centralized, observable state without a framework. It implements:
//!
//! - Stores holding a JSON value and a table of named operations (reducers)
//! - Action creators with per-operation payload maps
//! - A dispatch pipeline: map → intercept → reduce → notify
//! - Synchronous and asynchronous (lazy) operations
//! - Subscriptions filtered by the state paths a listener depends on
//! - Store composition: folding several stores into one
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `registry`: the [`Cabinet`], owning mounted stores by name
//! - `store`: setup, action creators, operation tables and composition
//! - `dispatch`: the pipeline behind `fire` and `lazy_fire`
//! - `subscription`: listeners and dependency filtering
//!
//! # Example
//!
//! ```rust,ignore
//! use cabinets_core::{Cabinet, Listener, StoreSetup};
//! use serde_json::json;
//!
//! let cabinet = Cabinet::new();
//! let todos = cabinet.setup_store(
//!     StoreSetup::new("todos", json!({"items": [], "filter": "all"}))
//!         .operation("add", |state, payload, _ctx| {
//!             let mut state = state.clone();
//!             state["items"].as_array_mut().unwrap().extend(payload);
//!             Ok(state)
//!         }),
//! )?;
//!
//! // Only runs when `items` changes
//! todos.subscribe_with_deps(&Listener::new(|state| println!("{state}")), ["items"]);
//!
//! todos.fire(&todos.action("add").unwrap().with_payload("write docs"))?;
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod registry;
pub mod store;
pub mod subscription;

pub use config::CabinetConfig;
pub use dispatch::{Context, DispatchKind, LazyDispatch};
pub use error::{CabinetsError, ErrorInfo, Result};
pub use registry::Cabinet;
pub use store::{
    create_action, create_action_with_map, Action, ActionCreator, Intercept, StoreHandle,
    StoreSetup,
};
pub use subscription::{Dependency, Listener, SubscriberId, Subscription};
