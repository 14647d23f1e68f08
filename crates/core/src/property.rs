// Observable properties with synchronous change notification

use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::Arc;

/// Receives the name of a property whose value changed
pub trait PropertyObserver: Send + Sync {
    fn property_changed(&self, property: &'static str);
}

impl<F> PropertyObserver for F
where
    F: Fn(&'static str) + Send + Sync,
{
    fn property_changed(&self, property: &'static str) {
        self(property)
    }
}

/// Named value that notifies observers when it is set to something different.
///
/// Observers run on the setter's thread, after the new value is visible, so
/// they may read the property back.
pub struct Observable<T> {
    name: &'static str,
    value: RwLock<T>,
    observers: Mutex<Vec<Arc<dyn PropertyObserver>>>,
}

impl<T: Clone + PartialEq> Observable<T> {
    pub fn new(name: &'static str, initial: T) -> Self {
        Self {
            name,
            value: RwLock::new(initial),
            observers: Mutex::new(Vec::new()),
        }
    }

    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    pub fn subscribe(&self, observer: Arc<dyn PropertyObserver>) {
        self.observers.lock().push(observer);
    }

    /// Store `value` and notify observers if it differs from the previous one.
    /// Returns the previous value.
    pub fn set(&self, value: T) -> T {
        let (previous, changed) = self.swap(value);
        if changed {
            self.notify();
        }
        previous
    }

    /// Store `value` without notifying. Returns the previous value and whether
    /// it changed; the caller owes a `notify` for each change.
    pub fn swap(&self, value: T) -> (T, bool) {
        let mut current = self.value.write();
        let changed = *current != value;
        (std::mem::replace(&mut *current, value), changed)
    }

    pub fn notify(&self) {
        let observers = self.observers.lock().clone();
        log::trace!("Property '{}' changed, notifying {} observer(s)", self.name, observers.len());
        for observer in observers.iter() {
            observer.property_changed(self.name);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("name", &self.name)
            .field("value", &*self.value.read())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, Arc<dyn PropertyObserver>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let observer: Arc<dyn PropertyObserver> =
            Arc::new(move |name: &'static str| sink.lock().push(name));
        (seen, observer)
    }

    #[test]
    fn test_notifies_only_on_change() {
        let prop = Observable::new("Volume", 0);
        let (seen, observer) = recorder();
        prop.subscribe(observer);

        prop.set(0);
        assert!(seen.lock().is_empty());

        assert_eq!(prop.set(50), 0);
        prop.set(50);
        prop.set(70);

        assert_eq!(seen.lock().as_slice(), &["Volume", "Volume"]);
        assert_eq!(prop.get(), 70);
    }

    #[test]
    fn test_observer_can_read_back() {
        let prop = Arc::new(Observable::new("Name", None::<String>));
        let read = Arc::new(Mutex::new(None));
        let (reader, slot) = (prop.clone(), read.clone());
        prop.subscribe(Arc::new(move |_: &'static str| {
            *slot.lock() = reader.get();
        }));

        prop.set(Some("first".to_string()));

        assert_eq!(read.lock().as_deref(), Some("first"));
    }

    #[test]
    fn test_swap_defers_notification() {
        let prop = Observable::new("Volume", 0);
        let (seen, observer) = recorder();
        prop.subscribe(observer);

        assert_eq!(prop.swap(40), (0, true));
        assert_eq!(prop.swap(40), (40, false));
        assert!(seen.lock().is_empty());
        assert_eq!(prop.get(), 40);

        prop.notify();
        assert_eq!(seen.lock().as_slice(), &["Volume"]);
    }
}
