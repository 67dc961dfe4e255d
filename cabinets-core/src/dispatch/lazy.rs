//! Lazy (asynchronous) dispatch.
//!
//! Mapping and interception run synchronously inside `lazy_fire`, so their
//! failures are returned right away. The reducer's future is spawned on the
//! ambient tokio runtime; its continuation replaces the state and notifies
//! subscribers only once the future resolves. A future that never resolves
//! never touches the store.
//!
//! A rejected future becomes [`CabinetsError::AsyncReducer`]: it is logged
//! and returned through the [`LazyDispatch`] handle, and the state is left
//! as it was.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};

use futures::future::FutureExt;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use super::pipeline::{failure_info, report, Prepared};
use super::scope::DispatchScope;
use super::DispatchKind;
use crate::error::{CabinetsError, ErrorInfo, Result};
use crate::registry::Cabinet;
use crate::store::Action;

/// A lazy dispatch in flight.
///
/// Awaiting it yields the store's new state once the reducer resolves.
/// Dropping it does not cancel the dispatch; [`abort`](Self::abort) does.
#[derive(Debug)]
pub struct LazyDispatch {
    store: String,
    action_type: String,
    task: JoinHandle<Result<Value>>,
}

impl LazyDispatch {
    pub fn store_name(&self) -> &str {
        &self.store
    }

    pub fn action_type(&self) -> &str {
        &self.action_type
    }

    /// Cancel the dispatch. If the reducer has not resolved yet, the state
    /// is never replaced and no subscriber is notified.
    pub fn abort(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Future for LazyDispatch {
    type Output = Result<Value>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        match self.task.poll_unpin(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(err)) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Poll::Ready(Err(_)) => Poll::Ready(Err(CabinetsError::Dispatch(
                ErrorInfo::new("lazy dispatch was aborted")
                    .with_store(self.store.clone())
                    .with_action(self.action_type.clone()),
            ))),
        }
    }
}

impl Cabinet {
    /// Dispatch an asynchronous action.
    ///
    /// Returns as soon as the reducer's future is spawned. Must be called
    /// from within a tokio runtime.
    pub fn lazy_fire(&self, action: &Action) -> Result<LazyDispatch> {
        self.dispatch_lazy(action)
            .map_err(|err| report(action, DispatchKind::Lazy, err))
    }

    fn dispatch_lazy(&self, action: &Action) -> Result<LazyDispatch> {
        let record = self.locate(action, DispatchKind::Lazy)?;
        let runtime = Handle::try_current().map_err(|err| {
            CabinetsError::Dispatch(failure_info(
                ErrorInfo::new(format!("lazy dispatch needs a tokio runtime: {err}")),
                &record,
                action,
                &record.state(),
            ))
        })?;

        let scope = DispatchScope::enter(&record.name, action.action_type());
        tracing::trace!(
            store = %record.name,
            action = %action,
            depth = scope.depth(),
            reentrant = scope.is_reentrant(),
            "dispatching lazily"
        );

        let Prepared {
            old_state,
            state,
            payload,
            ctx,
        } = self.prepare(&record, action)?;

        let reducer = record
            .lazy_reducer
            .get(action.action_type())
            .cloned()
            .ok_or_else(|| {
                CabinetsError::Dispatch(failure_info(
                    ErrorInfo::new("no lazy reducer registered for action"),
                    &record,
                    action,
                    &old_state,
                ))
            })?;

        let info = failure_info(ErrorInfo::default(), &record, action, &old_state);
        let future = reducer(state, payload, ctx);
        let task_record = Arc::clone(&record);
        let task = runtime.spawn(async move {
            match future.await {
                Ok(new_state) => {
                    task_record.replace_state(new_state.clone());
                    task_record.notify(&old_state, &new_state);
                    tracing::trace!(store = %task_record.name, "lazy dispatch resolved");
                    Ok(new_state)
                }
                Err(err) => {
                    let err = CabinetsError::AsyncReducer(ErrorInfo {
                        error: format!("{err:#}"),
                        ..info
                    });
                    tracing::error!(
                        store = %task_record.name,
                        error_kind = err.kind(),
                        error = %err,
                        "lazy dispatch failed"
                    );
                    Err(err)
                }
            }
        });

        Ok(LazyDispatch {
            store: record.name.clone(),
            action_type: action.action_type().to_string(),
            task,
        })
    }
}
