use super::server::ServerRecord;
use std::any::Any;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, Weak};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("no server with id {0:?} in the store")]
    UnknownServer(String),
}

/// Commands accepted by [`Store::dispatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Add { server: ServerRecord },
    SetPing { id: String, ping: f64 },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreState {
    pub servers: HashMap<String, ServerRecord>,
    /// Insertion order, used for list rendering. May contain an id twice if it was added twice.
    pub server_ids: Vec<String>,
}

/// Part of the state a projection read or a command changed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Slice {
    Order,
    Server(String),
    AllServers,
}

impl Slice {
    fn covers(&self, changed: &Slice) -> bool {
        match (self, changed) {
            (Slice::AllServers, Slice::Server(_)) => true,
            _ => self == changed,
        }
    }
}

/// Read-only access to the state handed to projections.
/// Every accessor records the slice it touched, so the store knows when to re-run the projection.
pub struct StateView<'a> {
    state: &'a StoreState,
    reads: RefCell<HashSet<Slice>>,
}

impl<'a> StateView<'a> {
    fn new(state: &'a StoreState) -> Self {
        Self {
            state,
            reads: RefCell::new(HashSet::new()),
        }
    }

    pub fn server_ids(&self) -> &'a [String] {
        self.touch(Slice::Order);
        &self.state.server_ids
    }

    pub fn server(&self, id: &str) -> Option<&'a ServerRecord> {
        self.touch(Slice::Server(id.to_string()));
        self.state.servers.get(id)
    }

    pub fn servers(&self) -> &'a HashMap<String, ServerRecord> {
        self.touch(Slice::AllServers);
        &self.state.servers
    }

    fn touch(&self, slice: Slice) {
        self.reads.borrow_mut().insert(slice);
    }

    fn into_reads(self) -> HashSet<Slice> {
        self.reads.into_inner()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

trait Subscriber: Send {
    fn notify(&mut self, state: &StoreState, changed: &[Slice]);

    /// `false` once the handle that owns this subscription has been dropped.
    fn is_alive(&self) -> bool;
}

struct Subscription<T, P, C> {
    projection: P,
    callback: C,
    last: T,
    reads: HashSet<Slice>,
    owner: Option<Weak<dyn Any + Send + Sync>>,
}

impl<T, P, C> Subscriber for Subscription<T, P, C>
where
    T: PartialEq + Send,
    P: Fn(&StateView<'_>) -> T + Send,
    C: FnMut(&T) + Send,
{
    fn notify(&mut self, state: &StoreState, changed: &[Slice]) {
        let affected = self
            .reads
            .iter()
            .any(|read| changed.iter().any(|slice| read.covers(slice)));
        if !affected {
            return;
        }

        let view = StateView::new(state);
        let next = (self.projection)(&view);
        // A projection may branch on what it reads, so its slices are refreshed every run
        self.reads = view.into_reads();

        if next != self.last {
            self.last = next;
            (self.callback)(&self.last);
        }
    }

    fn is_alive(&self) -> bool {
        self.owner
            .as_ref()
            .is_none_or(|owner| owner.strong_count() > 0)
    }
}

/// Observable container of server records.
///
/// State only changes through [`Store::dispatch`]. Subscribers register a projection and
/// a callback; after each command the callback runs if the command changed a slice the
/// projection read and the projected value differs from the previous one.
#[derive(Default)]
pub struct Store {
    state: StoreState,
    subscribers: Vec<(SubscriptionId, Box<dyn Subscriber>)>,
    next_subscription: u64,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &StoreState {
        &self.state
    }

    pub fn len(&self) -> usize {
        self.state.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.servers.is_empty()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Applies one command and notifies affected subscribers before returning.
    pub fn dispatch(&mut self, event: StoreEvent) -> Result<(), StoreError> {
        let changed = match event {
            StoreEvent::Add { server } => {
                let id = server.id.clone();
                self.state.servers.insert(id.clone(), server);
                self.state.server_ids.push(id.clone());
                vec![Slice::Order, Slice::Server(id)]
            }
            StoreEvent::SetPing { id, ping } => {
                let server = self
                    .state
                    .servers
                    .get_mut(&id)
                    .ok_or_else(|| StoreError::UnknownServer(id.clone()))?;
                server.ping = Some(ping);
                vec![Slice::Server(id)]
            }
        };

        self.subscribers.retain(|(_, subscriber)| subscriber.is_alive());
        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber.notify(&self.state, &changed);
        }
        Ok(())
    }

    /// The subscription stays registered until [`Store::unsubscribe`] is called.
    pub fn subscribe<T, P, C>(&mut self, projection: P, callback: C) -> SubscriptionId
    where
        T: PartialEq + Send + 'static,
        P: Fn(&StateView<'_>) -> T + Send + 'static,
        C: FnMut(&T) + Send + 'static,
    {
        self.register(projection, callback, None)
    }

    fn register<T, P, C>(
        &mut self,
        projection: P,
        callback: C,
        owner: Option<Weak<dyn Any + Send + Sync>>,
    ) -> SubscriptionId
    where
        T: PartialEq + Send + 'static,
        P: Fn(&StateView<'_>) -> T + Send + 'static,
        C: FnMut(&T) + Send + 'static,
    {
        let view = StateView::new(&self.state);
        let last = projection(&view);
        let reads = view.into_reads();

        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.subscribers.push((
            id,
            Box::new(Subscription {
                projection,
                callback,
                last,
                reads,
                owner,
            }),
        ));
        id
    }

    /// Returns `false` if the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    pub fn select<T, P>(&mut self, projection: P) -> Selector<T>
    where
        T: Clone + PartialEq + Send + 'static,
        P: Fn(&StateView<'_>) -> T + Send + 'static,
    {
        self.select_with(projection, || {})
    }

    /// Like [`Store::select`], and runs `on_change` after every new value is stored.
    ///
    /// Once every clone of the returned selector is dropped, the subscription is removed
    /// on the next dispatch.
    pub fn select_with<T, P, F>(&mut self, projection: P, mut on_change: F) -> Selector<T>
    where
        T: Clone + PartialEq + Send + 'static,
        P: Fn(&StateView<'_>) -> T + Send + 'static,
        F: FnMut() + Send + 'static,
    {
        let initial = projection(&StateView::new(&self.state));
        let slot = Arc::new(Mutex::new(Selected {
            value: initial,
            version: 1,
        }));

        let sink = Arc::downgrade(&slot);
        let owner: Weak<dyn Any + Send + Sync> = sink.clone();
        let callback = move |value: &T| {
            let Some(slot) = sink.upgrade() else {
                return;
            };
            {
                let mut selected = slot.lock().expect("Failed to lock selection for update");
                selected.value = value.clone();
                selected.version += 1;
            }
            on_change();
        };
        let id = self.register(projection, callback, Some(owner));

        Selector { id, slot }
    }
}

#[derive(Debug)]
struct Selected<T> {
    value: T,
    version: u64,
}

/// Latest value of a projection, kept current by the store.
#[derive(Debug, Clone)]
pub struct Selector<T> {
    id: SubscriptionId,
    slot: Arc<Mutex<Selected<T>>>,
}

impl<T: Clone> Selector<T> {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn get(&self) -> T {
        self.snapshot().0
    }

    /// Starts at 1 and grows by one each time the selected value changes.
    pub fn version(&self) -> u64 {
        self.slot
            .lock()
            .expect("Failed to lock selection for reading")
            .version
    }

    pub fn snapshot(&self) -> (T, u64) {
        let selected = self.slot.lock().expect("Failed to lock selection for reading");
        (selected.value.clone(), selected.version)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
