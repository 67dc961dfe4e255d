//! Store composition.
//!
//! Combining folds several mounted stores into a new one:
//!
//! - the new state is an object keyed by source name, holding each source's
//!   state as of the call;
//! - each source's reducers, maps and interceptors are wrapped to work on
//!   that source's slice, so an operation only ever updates its own key;
//! - the wrapped tables are unioned in input order, the earliest store
//!   winning on a key collision;
//! - subscriptions are concatenated in input order, their dependencies moved
//!   under the source's name so they keep matching the namespaced state;
//! - the sources are unmounted.
//!
//! A store listed more than once is combined once.
//!
//! Stores sharing an action type shadow each other silently, so combined
//! stores should use disjoint operation names.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::FutureExt;
use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::handle::StoreHandle;
use super::record::StoreRecord;
use super::setup::StoreSetup;
use super::table::{
    merge_first_wins, Intercept, InterceptorFn, LazyReducerFn, MapFn, ReducerFn, DEFAULT_KEY,
};
use crate::dispatch::Context;
use crate::error::{CabinetsError, ErrorInfo, Result};
use crate::registry::Cabinet;
use crate::subscription::Subscription;

/// A source store's tables, rewritten to work on its slice of the
/// combined state.
struct SlicedTables {
    reducer: IndexMap<String, ReducerFn>,
    lazy_reducer: IndexMap<String, LazyReducerFn>,
    maps: IndexMap<String, MapFn>,
    interceptors: IndexMap<String, InterceptorFn>,
}

impl SlicedTables {
    fn of(record: &StoreRecord) -> Self {
        let ns: Arc<str> = Arc::from(record.name.as_str());
        let operations = record
            .reducer
            .action_types()
            .chain(record.lazy_reducer.action_types());

        let mut maps = IndexMap::new();
        let mut interceptors = IndexMap::new();
        for op in operations.chain([DEFAULT_KEY]) {
            if let Some(map) = record.maps.get(op).or_else(|| record.maps.get(DEFAULT_KEY)) {
                maps.entry(op.to_string())
                    .or_insert_with(|| slice_map(&ns, Arc::clone(map)));
            }
            if let Some(interceptor) = record.interceptor_for(op) {
                interceptors
                    .entry(op.to_string())
                    .or_insert_with(|| slice_interceptor(&ns, Arc::clone(interceptor)));
            }
        }

        Self {
            reducer: record
                .reducer
                .ops()
                .iter()
                .map(|(op, f)| (op.clone(), slice_reducer(&ns, Arc::clone(f))))
                .collect(),
            lazy_reducer: record
                .lazy_reducer
                .ops()
                .iter()
                .map(|(op, f)| (op.clone(), slice_lazy_reducer(&ns, Arc::clone(f))))
                .collect(),
            maps,
            interceptors,
        }
    }
}

fn slice_of(state: &Value, ns: &str) -> Value {
    state.get(ns).cloned().unwrap_or(Value::Null)
}

fn with_slice(state: Value, ns: &str, slice: Value) -> Value {
    let mut map = match state {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    map.insert(ns.to_string(), slice);
    Value::Object(map)
}

fn slice_reducer(ns: &Arc<str>, reducer: ReducerFn) -> ReducerFn {
    let ns = Arc::clone(ns);
    Arc::new(move |state: &Value, payload: Option<Value>, ctx: &Context| -> anyhow::Result<Value> {
        let slice = reducer(&slice_of(state, &ns), payload, ctx)?;
        Ok(with_slice(state.clone(), &ns, slice))
    })
}

/// The slice is written back into the state current at resolution, so
/// dispatches to other slices made in the meantime are kept.
fn slice_lazy_reducer(ns: &Arc<str>, reducer: LazyReducerFn) -> LazyReducerFn {
    let ns = Arc::clone(ns);
    Arc::new(move |state: Value, payload: Option<Value>, ctx: Context| {
        let future = reducer(slice_of(&state, &ns), payload, ctx.clone());
        let ns = Arc::clone(&ns);
        async move {
            let slice = future.await?;
            let current = ctx.current_state().unwrap_or(state);
            Ok::<_, anyhow::Error>(with_slice(current, &ns, slice))
        }
        .boxed()
    })
}

fn slice_map(ns: &Arc<str>, map: MapFn) -> MapFn {
    let ns = Arc::clone(ns);
    Arc::new(move |state: &Value, payload: Option<Value>| -> anyhow::Result<Option<Value>> {
        map(&slice_of(state, &ns), payload)
    })
}

fn slice_interceptor(ns: &Arc<str>, interceptor: InterceptorFn) -> InterceptorFn {
    let ns = Arc::clone(ns);
    Arc::new(move |state: &Value, payload: Option<&Value>, ctx: &Context| -> anyhow::Result<Intercept> {
        let intercept = interceptor(&slice_of(state, &ns), payload, ctx)?;
        Ok(Intercept {
            state: intercept
                .state
                .map(|slice| with_slice(state.clone(), &ns, slice)),
            payload: intercept.payload,
        })
    })
}

impl Cabinet {
    /// Combine mounted stores into one and unmount the sources.
    ///
    /// Without a `name` the combined store is named after its sources,
    /// joined by [`CabinetConfig::combined_name_separator`](crate::CabinetConfig).
    pub fn combine_stores(&self, name: Option<&str>, stores: &[&StoreHandle]) -> Result<StoreHandle> {
        if stores.is_empty() {
            return Err(CabinetsError::SetupStore(
                ErrorInfo::new("no stores to combine").with_store(name.unwrap_or_default()),
            ));
        }

        let mut records = stores
            .iter()
            .map(|handle| {
                self.find(handle.name()).ok_or_else(|| CabinetsError::NotMounted {
                    name: handle.name().to_string(),
                })
            })
            .collect::<Result<Vec<Arc<StoreRecord>>>>()?;

        // A store passed twice is folded in once.
        let mut seen = HashSet::new();
        records.retain(|record| seen.insert(record.name.clone()));

        let combined_name = match name {
            Some(name) => name.to_string(),
            None => records
                .iter()
                .map(|record| record.name.as_str())
                .collect::<Vec<_>>()
                .join(&self.config().combined_name_separator),
        };

        let mut state = Map::new();
        for record in &records {
            state
                .entry(record.name.clone())
                .or_insert_with(|| record.state());
        }

        let sliced: Vec<SlicedTables> = records.iter().map(|r| SlicedTables::of(r)).collect();
        let setup = StoreSetup::from_tables(
            combined_name.clone(),
            Value::Object(state),
            merge_first_wins(sliced.iter().map(|t| &t.reducer)),
            merge_first_wins(sliced.iter().map(|t| &t.lazy_reducer)),
            merge_first_wins(sliced.iter().map(|t| &t.maps)),
            merge_first_wins(sliced.iter().map(|t| &t.interceptors)),
        );
        let combined = Arc::new(setup.build()?);

        let subscriptions: Vec<Subscription> = records
            .iter()
            .flat_map(|record| {
                record
                    .subscriptions()
                    .into_iter()
                    .map(|subscription| subscription.namespaced(&record.name))
                    .collect::<Vec<_>>()
            })
            .collect();
        combined.set_subscriptions(subscriptions);

        let sources: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        self.mount_absorbing(Arc::clone(&combined), &sources);
        for record in &records {
            if record.name != combined_name && self.is_mounted(&record.name) {
                self.unmount(&record.name);
            }
        }

        tracing::debug!(
            store = %combined_name,
            sources = ?sources,
            "stores combined"
        );
        Ok(StoreHandle::new(self, &combined))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::Listener;
    use crate::CabinetConfig;
    use serde_json::json;

    fn counter(cabinet: &Cabinet, name: &str, op: &str) -> StoreHandle {
        cabinet
            .setup_store(StoreSetup::new(name, json!(0)).operation(op, |state, _payload, _ctx| {
                Ok(json!(state.as_i64().unwrap_or_default() + 1))
            }))
            .unwrap()
    }

    #[test]
    fn default_name_joins_sources() {
        let cabinet = Cabinet::new();
        let x = counter(&cabinet, "X", "incX");
        let y = counter(&cabinet, "Y", "incY");

        let z = cabinet.combine_stores(None, &[&x, &y]).unwrap();
        assert_eq!(z.name(), "X-Y");
        assert!(cabinet.is_mounted("X-Y"));
    }

    #[test]
    fn separator_comes_from_config() {
        let cabinet = Cabinet::with_config(CabinetConfig {
            combined_name_separator: "+".to_string(),
            ..CabinetConfig::default()
        });
        let x = counter(&cabinet, "X", "incX");
        let y = counter(&cabinet, "Y", "incY");

        let z = cabinet.combine_stores(None, &[&x, &y]).unwrap();
        assert_eq!(z.name(), "X+Y");
    }

    #[test]
    fn first_store_wins_on_shared_action_types() {
        let cabinet = Cabinet::new();
        let a = cabinet
            .setup_store(StoreSetup::new("A", json!("a")).operation("set", |_s, _p, _c| Ok(json!("from A"))))
            .unwrap();
        let b = cabinet
            .setup_store(StoreSetup::new("B", json!("b")).operation("set", |_s, _p, _c| Ok(json!("from B"))))
            .unwrap();

        let combined = cabinet.combine_stores(Some("AB"), &[&a, &b]).unwrap();
        let state = combined.fire(&combined.action("set").unwrap().action()).unwrap();
        assert_eq!(state, json!({"A": "from A", "B": "b"}));
    }

    #[test]
    fn operations_work_on_their_slice() {
        let cabinet = Cabinet::new();
        let calc = cabinet
            .setup_store(
                StoreSetup::new("calc", json!(0))
                    .operation("add", |state, payload, _ctx| {
                        let add = payload.and_then(|p| p.as_i64()).unwrap_or_default();
                        Ok(json!(state.as_i64().unwrap_or_default() + add))
                    })
                    .map("add", |_state, payload| {
                        Ok(payload.and_then(|p| p.as_i64()).map(|p| json!(p * 2)))
                    })
                    .interceptor("add", |state, _payload, _ctx| {
                        Ok(Intercept::replace_state(state.as_i64().unwrap_or_default() + 1))
                    }),
            )
            .unwrap();
        let y = counter(&cabinet, "Y", "incY");

        let combined = cabinet.combine_stores(None, &[&calc, &y]).unwrap();
        combined.fire(&combined.action("add").unwrap().with_payload(5)).unwrap();
        assert_eq!(combined.get_state(), Some(json!({"calc": 11, "Y": 0})));

        combined.fire(&combined.action("incY").unwrap().action()).unwrap();
        assert_eq!(combined.get_state(), Some(json!({"calc": 11, "Y": 1})));
    }

    #[test]
    fn source_creators_keep_working_after_combination() {
        let cabinet = Cabinet::new();
        let calc = cabinet
            .setup_store(
                StoreSetup::new("calc", json!(1))
                    .operation("add", |state, payload, _ctx| {
                        let add = payload.and_then(|p| p.as_i64()).unwrap_or_default();
                        Ok(json!(state.as_i64().unwrap_or_default() + add))
                    })
                    .map("add", |state, payload| {
                        let base = state
                            .as_i64()
                            .ok_or_else(|| anyhow::anyhow!("state not a number: {state}"))?;
                        Ok(payload.and_then(|p| p.as_i64()).map(|p| json!(base + p)))
                    }),
            )
            .unwrap();
        let y = counter(&cabinet, "Y", "incY");
        let old_add = calc.action("add").unwrap().clone();

        let z = cabinet.combine_stores(Some("Z"), &[&calc, &y]).unwrap();
        z.fire(&z.action("add").unwrap().with_payload(1)).unwrap();
        assert_eq!(z.get_state(), Some(json!({"calc": 3, "Y": 0})));

        let state = cabinet.fire(&old_add.with_payload(1)).unwrap();
        assert_eq!(state, json!({"calc": 7, "Y": 0}));
    }

    #[test]
    fn combined_stores_nest() {
        let cabinet = Cabinet::new();
        let x = counter(&cabinet, "X", "incX");
        let y = counter(&cabinet, "Y", "incY");
        let w = counter(&cabinet, "W", "incW");

        let xy = cabinet.combine_stores(Some("XY"), &[&x, &y]).unwrap();
        let all = cabinet.combine_stores(Some("all"), &[&xy, &w]).unwrap();
        all.fire(&all.action("incY").unwrap().action()).unwrap();

        assert_eq!(
            all.get_state(),
            Some(json!({"XY": {"X": 0, "Y": 1}, "W": 0}))
        );
        assert_eq!(cabinet.store_names(), vec!["all".to_string()]);
    }

    #[test]
    fn unmounted_source_is_rejected() {
        let cabinet = Cabinet::new();
        let x = counter(&cabinet, "X", "incX");
        cabinet.unmount("X");

        let err = cabinet.combine_stores(Some("Z"), &[&x]).unwrap_err();
        assert!(matches!(err, CabinetsError::NotMounted { .. }));
        assert!(!cabinet.is_mounted("Z"));
    }

    #[test]
    fn empty_input_is_rejected() {
        let cabinet = Cabinet::new();
        let err = cabinet.combine_stores(Some("Z"), &[]).unwrap_err();
        assert_eq!(err.kind(), "setup_store");
    }

    #[test]
    fn reusing_a_source_name_keeps_the_combined_store() {
        let cabinet = Cabinet::new();
        let x = counter(&cabinet, "X", "incX");
        let y = counter(&cabinet, "Y", "incY");

        let combined = cabinet.combine_stores(Some("X"), &[&x, &y]).unwrap();
        assert!(cabinet.is_mounted("X"));
        assert!(!cabinet.is_mounted("Y"));
        assert_eq!(combined.get_state(), Some(json!({"X": 0, "Y": 0})));
    }

    #[test]
    fn repeated_source_is_folded_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let cabinet = Cabinet::new();
        let x = counter(&cabinet, "X", "incX");
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        x.subscribe(&Listener::new(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        }));

        let z = cabinet.combine_stores(None, &[&x, &x]).unwrap();
        assert_eq!(z.name(), "X");
        assert_eq!(cabinet.find("X").unwrap().subscriptions().len(), 1);

        z.fire(&z.action("incX").unwrap().action()).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(z.get_state(), Some(json!({"X": 1})));
    }

    #[test]
    fn subscriptions_are_carried_with_namespaced_deps() {
        let cabinet = Cabinet::new();
        let x = counter(&cabinet, "X", "incX");
        let listener = Listener::new(|_| {});
        x.subscribe_with_deps(&listener, ["count"]);

        let z = cabinet.combine_stores(Some("Z"), &[&x]).unwrap();
        let record = cabinet.find(z.name()).unwrap();
        let subscriptions = record.subscriptions();

        assert_eq!(subscriptions.len(), 1);
        assert_eq!(subscriptions[0].listener().id(), listener.id());
        assert_eq!(subscriptions[0].deps()[0].to_string(), "X.count");
    }
}
