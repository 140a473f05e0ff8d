#![forbid(unsafe_code)]

//! Push and pull paths for synchronized properties.
//!
//! Every path goes through the property's [`SyncGuard`](crate::guard::SyncGuard)
//! and holds only a weak handle to the external object, so the scope stays
//! its exclusive owner.

use std::rc::Rc;

use mapsync_core::api::{EventTarget, NativeEvent};
use mapsync_core::{OptionValue, Value};

use crate::options::Transform;
use crate::reactive::{Bindings, Observable};
use crate::scope::BoundScope;

/// Model → external: run `apply` under the guard whenever `observable`
/// changes.
pub fn push_on_change<O>(
    scope: &mut BoundScope<O>,
    property: &'static str,
    observable: &Observable<Value>,
    apply: impl Fn(&O, &Value) + 'static,
) where
    O: ?Sized + EventTarget + 'static,
{
    let guard = scope.guard(property);
    let object = scope.weak_object();
    let subscription = observable.subscribe(move |value| {
        let Some(object) = object.upgrade() else {
            return;
        };
        guard.push(|| apply(&*object, value));
    });
    scope.hold(subscription);
}

/// External → model: on every `event`, write `read(object)` into
/// `observable` under the guard.
pub fn pull_on_event<O>(
    scope: &mut BoundScope<O>,
    property: &'static str,
    event: &str,
    observable: &Observable<Value>,
    read: impl Fn(&O) -> Value + 'static,
) where
    O: ?Sized + EventTarget + 'static,
{
    let listener = pull_listener(scope, property, observable, read);
    scope.listen(event, listener);
}

/// Like [`pull_on_event`], for the next occurrence of `event` only.
pub fn pull_once_on_event<O>(
    scope: &mut BoundScope<O>,
    property: &'static str,
    event: &str,
    observable: &Observable<Value>,
    read: impl Fn(&O) -> Value + 'static,
) where
    O: ?Sized + EventTarget + 'static,
{
    let listener = pull_listener(scope, property, observable, read);
    scope.listen_once(event, listener);
}

fn pull_listener<O>(
    scope: &mut BoundScope<O>,
    property: &'static str,
    observable: &Observable<Value>,
    read: impl Fn(&O) -> Value + 'static,
) -> Rc<dyn Fn(&dyn NativeEvent)>
where
    O: ?Sized + EventTarget + 'static,
{
    let guard = scope.guard(property);
    let object = scope.weak_object();
    let target = observable.clone();
    Rc::new(move |_: &dyn NativeEvent| {
        let Some(object) = object.upgrade() else {
            return;
        };
        guard.pull(|| target.set(read(&*object)));
    })
}

/// One-way observe: if `property` is observable, push every change through
/// `transform` (or the pass-through) into `apply`.
///
/// Returns whether a subscription was installed.
pub fn try_observe_binding<O>(
    scope: &mut BoundScope<O>,
    bindings: &Bindings,
    property: &'static str,
    transform: Option<Transform>,
    apply: impl Fn(&O, &OptionValue) + 'static,
) -> bool
where
    O: ?Sized + EventTarget + 'static,
{
    let Some(observable) = bindings.observable(property).cloned() else {
        return false;
    };
    push_on_change(scope, property, &observable, move |object, value| {
        let converted = match transform {
            Some(transform) => transform(value),
            None => OptionValue::from(value.clone()),
        };
        apply(object, &converted);
    });
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::ScopeLifecycle;
    use mapsync_core::api::{ListenerId, NativeListener};
    use mapsync_core::transform::bool_option;
    use std::cell::{Cell, RefCell};

    /// Minimal target: one mutable number that echoes `changed` from its
    /// setter, like a host object would.
    #[derive(Default)]
    struct Dial {
        value: Cell<f64>,
        listeners: RefCell<Vec<(u64, String, NativeListener)>>,
        next_id: Cell<u64>,
        set_calls: Cell<u32>,
        max: Cell<Option<f64>>,
    }

    struct NoEvent;

    impl NativeEvent for NoEvent {
        fn lat_lng(&self) -> Option<mapsync_core::api::LatLng> {
            None
        }
        fn stop(&self) {}
    }

    impl Dial {
        fn set(&self, value: f64) {
            self.set_calls.set(self.set_calls.get() + 1);
            self.value.set(self.max.get().map_or(value, |max| value.min(max)));
            self.fire("changed");
        }

        fn fire(&self, event: &str) {
            let matching: Vec<NativeListener> = self
                .listeners
                .borrow()
                .iter()
                .filter(|(_, name, _)| name == event)
                .map(|(_, _, l)| Rc::clone(l))
                .collect();
            for listener in matching {
                listener(&NoEvent);
            }
        }
    }

    impl EventTarget for Dial {
        fn add_listener(&self, event: &str, listener: NativeListener) -> ListenerId {
            let id = self.next_id.get();
            self.next_id.set(id + 1);
            self.listeners
                .borrow_mut()
                .push((id, event.to_owned(), listener));
            ListenerId::new(id)
        }

        fn add_listener_once(&self, event: &str, listener: NativeListener) -> ListenerId {
            self.add_listener(event, listener)
        }

        fn remove_listener(&self, id: ListenerId) {
            self.listeners.borrow_mut().retain(|(raw, _, _)| *raw != id.get());
        }
    }

    fn scope() -> BoundScope<Dial> {
        BoundScope::new(ScopeLifecycle::new("dial"), Rc::new(Dial::default()))
    }

    #[test]
    fn echoing_setter_does_not_write_back() {
        let mut scope = scope();
        let model = Observable::new(Value::from(1.0));
        push_on_change(&mut scope, "value", &model, |dial, v| {
            dial.set(v.as_number().unwrap_or_default());
        });
        pull_on_event(&mut scope, "value", "changed", &model, |dial| {
            Value::from(dial.value.get())
        });

        model.set(Value::from(5.0));
        assert_eq!(scope.object().set_calls.get(), 1);
        assert_eq!(model.version(), 1);
        assert_eq!(scope.object().value.get(), 5.0);
    }

    #[test]
    fn clamped_echo_does_not_write_back() {
        let mut scope = scope();
        scope.object().max.set(Some(10.0));
        let model = Observable::new(Value::from(1.0));
        push_on_change(&mut scope, "value", &model, |dial, v| {
            dial.set(v.as_number().unwrap_or_default());
        });
        pull_on_event(&mut scope, "value", "changed", &model, |dial| {
            Value::from(dial.value.get())
        });

        model.set(Value::from(50.0));
        assert_eq!(scope.object().value.get(), 10.0);
        assert_eq!(scope.object().set_calls.get(), 1);
        assert_eq!(model.get(), Value::from(50.0));
        assert_eq!(model.version(), 1);
    }

    #[test]
    fn pull_writes_model_once() {
        let mut scope = scope();
        let model = Observable::new(Value::from(0.0));
        push_on_change(&mut scope, "value", &model, |dial, v| {
            dial.set(v.as_number().unwrap_or_default());
        });
        pull_on_event(&mut scope, "value", "changed", &model, |dial| {
            Value::from(dial.value.get())
        });

        scope.object().value.set(3.0);
        scope.object().fire("changed");
        assert_eq!(model.get(), Value::from(3.0));
        assert_eq!(scope.object().set_calls.get(), 0);
    }

    #[test]
    fn release_disconnects_both_paths() {
        let mut scope = scope();
        let model = Observable::new(Value::from(0.0));
        push_on_change(&mut scope, "value", &model, |dial, v| {
            dial.set(v.as_number().unwrap_or_default());
        });
        pull_on_event(&mut scope, "value", "changed", &model, |dial| {
            Value::from(dial.value.get())
        });
        scope.release();

        model.set(Value::from(9.0));
        assert_eq!(scope.object().set_calls.get(), 0);
        assert!(scope.object().listeners.borrow().is_empty());
    }

    #[test]
    fn observe_only_when_observable() {
        let mut scope = scope();
        let seen = Rc::new(Cell::new(false));
        let flag = Observable::new(Value::from(0));
        let bindings = Bindings::new().with("on", &flag).with("off", 1);

        let s = Rc::clone(&seen);
        assert!(try_observe_binding(
            &mut scope,
            &bindings,
            "on",
            Some(bool_option),
            move |_, v| s.set(v.as_bool().unwrap_or(false)),
        ));
        assert!(!try_observe_binding(&mut scope, &bindings, "off", None, |_, _| {}));

        flag.set(Value::from(2));
        assert!(seen.get());
        assert_eq!(scope.subscription_count(), 1);
    }
}
