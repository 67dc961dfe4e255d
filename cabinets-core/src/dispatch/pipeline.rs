//! Dispatch Pipeline
//!
//! Every dispatch runs the same steps against the store that owns the
//! action's type:
//!
//! 1. Locate the owning store through the cabinet's action index.
//! 2. Snapshot the current state; dependency filtering compares against it.
//! 3. Map the payload with the action's bound map, or with the store's own
//!    map when the action was created for another store.
//! 4. Run the interceptor (the action type's own, else `"def"`), which may
//!    override the state and payload handed to the reducer.
//! 5. Reduce. The sync path replaces the state and notifies right away; the
//!    lazy path does so once the reducer's future resolves.
//!
//! A failing step stops the pipeline; later steps never run. Each failure
//! is logged once at the dispatch boundary and returned unchanged.

use std::sync::Arc;

use serde_json::Value;

use super::context::Context;
use super::scope::DispatchScope;
use super::DispatchKind;
use crate::error::{CabinetsError, ErrorInfo, Result};
use crate::registry::Cabinet;
use crate::store::record::StoreRecord;
use crate::store::{Action, Intercept};

/// Reducer inputs produced by steps 2 to 4.
pub(crate) struct Prepared {
    pub(crate) old_state: Value,
    pub(crate) state: Value,
    pub(crate) payload: Option<Value>,
    pub(crate) ctx: Context,
}

/// Attach the dispatch's store, action, state and payload to `info`.
pub(crate) fn failure_info(
    info: ErrorInfo,
    record: &StoreRecord,
    action: &Action,
    state: &Value,
) -> ErrorInfo {
    info.with_store(record.name.clone())
        .with_action(action.action_type())
        .with_state(state.clone())
        .with_payload(action.payload().cloned())
}

/// Log a dispatch failure and hand it back.
///
/// The failed dispatch's scope has ended by now, so `within` names the
/// dispatch it was nested in, if any.
pub(crate) fn report(action: &Action, kind: DispatchKind, err: CabinetsError) -> CabinetsError {
    tracing::error!(
        action = %action,
        kind = %kind,
        within = ?DispatchScope::current(),
        error_kind = err.kind(),
        error = %err,
        "dispatch failed"
    );
    err
}

impl Cabinet {
    /// Dispatch a synchronous action and return the store's new state.
    ///
    /// Subscribers have been notified by the time this returns.
    pub fn fire(&self, action: &Action) -> Result<Value> {
        self.dispatch_sync(action)
            .map_err(|err| report(action, DispatchKind::Sync, err))
    }

    fn dispatch_sync(&self, action: &Action) -> Result<Value> {
        let record = self.locate(action, DispatchKind::Sync)?;
        let scope = DispatchScope::enter(&record.name, action.action_type());
        tracing::trace!(
            store = %record.name,
            action = %action,
            depth = scope.depth(),
            reentrant = scope.is_reentrant(),
            "dispatching"
        );

        let Prepared {
            old_state,
            state,
            payload,
            ctx,
        } = self.prepare(&record, action)?;

        let reducer = record.reducer.get(action.action_type()).ok_or_else(|| {
            CabinetsError::Dispatch(failure_info(
                ErrorInfo::new("no reducer registered for action"),
                &record,
                action,
                &old_state,
            ))
        })?;

        let new_state = reducer(&state, payload, &ctx).map_err(|err| {
            CabinetsError::Reducer(failure_info(
                ErrorInfo::from_anyhow(&err),
                &record,
                action,
                &old_state,
            ))
        })?;

        record.replace_state(new_state.clone());
        record.notify(&old_state, &new_state);
        Ok(new_state)
    }

    /// Find the mounted store that handles the action.
    ///
    /// The store the action was created for wins while it is mounted and
    /// still has the operation; otherwise the action index decides.
    pub(crate) fn locate(&self, action: &Action, kind: DispatchKind) -> Result<Arc<StoreRecord>> {
        let bound = action
            .store_name()
            .and_then(|store| self.find(store))
            .filter(|record| record.owns(kind, action.action_type()));

        bound.or_else(|| self.owner_of(kind, action.action_type())).ok_or_else(|| {
            CabinetsError::Dispatch(
                ErrorInfo::new(format!("no mounted store owns {kind} action type"))
                    .with_action(action.action_type())
                    .with_payload(action.payload().cloned()),
            )
        })
    }

    /// Snapshot, map and intercept.
    pub(crate) fn prepare(&self, record: &StoreRecord, action: &Action) -> Result<Prepared> {
        let old_state = record.state();

        // An action bound to a store that has since been folded into this
        // one maps with this store's table, like its interceptor and reducer.
        let rebound = action
            .store_name()
            .is_some_and(|store| store != record.name);
        let mapped = match record.map_for(action.action_type()) {
            Some(map) if rebound => map(&old_state, action.payload().cloned()),
            _ => action.map_payload(&old_state),
        }
        .map_err(|err| {
            CabinetsError::Mapping(failure_info(
                ErrorInfo::from_anyhow(&err),
                record,
                action,
                &old_state,
            ))
        })?;

        let ctx = Context::new(self, record);
        let intercept = match record.interceptor_for(action.action_type()) {
            Some(interceptor) => interceptor(&old_state, mapped.as_ref(), &ctx).map_err(|err| {
                CabinetsError::Interceptor(failure_info(
                    ErrorInfo::from_anyhow(&err),
                    record,
                    action,
                    &old_state,
                ))
            })?,
            None => Intercept::pass(),
        };

        let (state, payload) = intercept.apply(old_state.clone(), mapped);
        Ok(Prepared {
            old_state,
            state,
            payload,
            ctx,
        })
    }
}
