//! Change observers registered per address.
//!
//! Observers are kept in a side table rather than on the nodes, so the tree
//! stays plain data. Value leaves notify with the new value; buttons notify
//! with the whole tree, because a button's action usually reads several
//! parameters at once.

use std::collections::HashMap;
use std::fmt;

use super::tree::ParamTree;
use super::value::ParamValue;

/// Receives change notifications for the addresses it is registered on.
///
/// Both methods default to no-ops so implementors only write the one that
/// matches the node kind they watch.
pub trait Observer {
    /// A value leaf changed (from a control edit, the peer, or a restore).
    fn value_changed(&mut self, _address: &str, _value: &ParamValue) {}

    /// A button was pressed (locally or by the peer).
    fn triggered(&mut self, _address: &str, _tree: &ParamTree) {}
}

/// Adapter turning a closure into a value observer.
pub struct OnValue<F>(pub F);

impl<F: FnMut(&ParamValue)> Observer for OnValue<F> {
    fn value_changed(&mut self, _address: &str, value: &ParamValue) {
        (self.0)(value);
    }
}

impl<F> fmt::Debug for OnValue<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OnValue(..)")
    }
}

/// Adapter turning a closure into a button observer.
pub struct OnTrigger<F>(pub F);

impl<F: FnMut(&ParamTree)> Observer for OnTrigger<F> {
    fn triggered(&mut self, _address: &str, tree: &ParamTree) {
        (self.0)(tree);
    }
}

impl<F> fmt::Debug for OnTrigger<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OnTrigger(..)")
    }
}

/// Observers keyed by address.
#[derive(Default)]
pub struct ObserverTable {
    by_address: HashMap<String, Vec<Box<dyn Observer>>>,
}

impl fmt::Debug for ObserverTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverTable")
            .field("addresses", &self.by_address.len())
            .field("observers", &self.len())
            .finish()
    }
}

impl ObserverTable {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `observer` for `address`. Observers fire in registration order.
    pub fn register(&mut self, address: impl Into<String>, observer: Box<dyn Observer>) {
        self.by_address.entry(address.into()).or_default().push(observer);
    }

    /// Total number of registered observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_address.values().map(Vec::len).sum()
    }

    /// Whether no observers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Notify observers of `address` that its value changed.
    pub fn notify_value(&mut self, address: &str, value: &ParamValue) {
        if let Some(observers) = self.by_address.get_mut(address) {
            for observer in observers {
                observer.value_changed(address, value);
            }
        }
    }

    /// Notify observers of `address` that the button was pressed.
    pub fn notify_trigger(&mut self, address: &str, tree: &ParamTree) {
        if let Some(observers) = self.by_address.get_mut(address) {
            for observer in observers {
                observer.triggered(address, tree);
            }
        }
    }
}
