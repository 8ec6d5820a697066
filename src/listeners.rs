use std::any::Any;
use std::error::Error;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use log::{error, warn};

pub type ListenerResult = Result<(), Box<dyn Error>>;

type Listener<E> = Rc<dyn Fn(&E) -> ListenerResult>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// Ordered list of observers for one event kind.
///
/// Delivery is synchronous and in registration order. A listener that
/// returns an error or panics is logged and skipped; the rest still run.
pub struct ObserverList<E> {
    name: &'static str,
    entries: Vec<(ListenerId, Listener<E>)>,
}

impl<E> ObserverList<E> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: Vec::new(),
        }
    }

    pub fn add(&mut self, id: ListenerId, listener: impl Fn(&E) -> ListenerResult + 'static) {
        self.entries.push((id, Rc::new(listener)));
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(existing, _)| *existing != id);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of listeners that failed.
    pub fn notify(&self, event: &E) -> usize {
        let snapshot = self
            .entries
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect::<Vec<_>>();

        let mut failures = 0;
        for listener in snapshot {
            match panic::catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    failures += 1;
                    warn!("{} listener failed: {err}", self.name);
                }
                Err(payload) => {
                    failures += 1;
                    error!(
                        "{} listener panicked: {}",
                        self.name,
                        panic_message(payload.as_ref())
                    );
                }
            }
        }
        failures
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
