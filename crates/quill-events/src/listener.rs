use std::{
    error::Error,
    panic::{self, AssertUnwindSafe},
    sync::{
        mpsc::{self, Receiver, Sender},
        Arc, Mutex, PoisonError,
    },
};

use tracing::debug;

use crate::lifecycle::RequestLifecycle;

pub type ListenerResult = Result<(), Box<dyn Error + Send + Sync>>;

/// Observer of request lifecycles.
///
/// Both hooks run synchronously on the dispatching thread. Errors and panics
/// they raise are swallowed by [`Listeners`] and never reach the caller.
pub trait RequestListener: Send + Sync {
    fn on_request(&self, _lifecycle: &RequestLifecycle) -> ListenerResult {
        Ok(())
    }

    fn on_response(&self, _lifecycle: &RequestLifecycle) -> ListenerResult {
        Ok(())
    }
}

/// Shared handle to a listener.
pub type ListenerHandle = Arc<dyn RequestListener>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

#[derive(Debug, Clone)]
pub enum RequestEvent {
    Started(RequestLifecycle),
    Finished(RequestLifecycle),
}

/// Listener that forwards lifecycle snapshots through an mpsc channel.
pub struct ChannelListener {
    sender: Sender<RequestEvent>,
}

impl ChannelListener {
    pub fn new() -> (Self, Receiver<RequestEvent>) {
        let (sender, receiver) = mpsc::channel();
        (
            Self {
                sender,
            },
            receiver,
        )
    }
}

impl RequestListener for ChannelListener {
    fn on_request(&self, lifecycle: &RequestLifecycle) -> ListenerResult {
        let _ = self.sender.send(RequestEvent::Started(lifecycle.clone()));
        Ok(())
    }

    fn on_response(&self, lifecycle: &RequestLifecycle) -> ListenerResult {
        let _ = self.sender.send(RequestEvent::Finished(lifecycle.clone()));
        Ok(())
    }
}

/// Stores every event for later inspection.
#[derive(Default)]
pub struct CollectorListener {
    events: Mutex<Vec<RequestEvent>>,
}

impl CollectorListener {
    pub fn events(&self) -> Vec<RequestEvent> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<RequestEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RequestListener for CollectorListener {
    fn on_request(&self, lifecycle: &RequestLifecycle) -> ListenerResult {
        self.lock().push(RequestEvent::Started(lifecycle.clone()));
        Ok(())
    }

    fn on_response(&self, lifecycle: &RequestLifecycle) -> ListenerResult {
        self.lock().push(RequestEvent::Finished(lifecycle.clone()));
        Ok(())
    }
}

type Hook = Box<dyn Fn(&RequestLifecycle) -> ListenerResult + Send + Sync>;

/// Listener assembled from closures; either hook may be left unset.
///
/// ```
/// use quill_events::Hooks;
///
/// let hooks = Hooks::new()
///     .on_request(|lc| {
///         println!("-> {}", lc.id);
///         Ok(())
///     })
///     .on_response(|lc| {
///         println!("<- {} {:?}", lc.id, lc.status);
///         Ok(())
///     });
/// ```
#[derive(Default)]
pub struct Hooks {
    on_request: Option<Hook>,
    on_response: Option<Hook>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_request<F>(mut self, hook: F) -> Self
    where
        F: Fn(&RequestLifecycle) -> ListenerResult + Send + Sync + 'static,
    {
        self.on_request = Some(Box::new(hook));
        self
    }

    pub fn on_response<F>(mut self, hook: F) -> Self
    where
        F: Fn(&RequestLifecycle) -> ListenerResult + Send + Sync + 'static,
    {
        self.on_response = Some(Box::new(hook));
        self
    }
}

impl RequestListener for Hooks {
    fn on_request(&self, lifecycle: &RequestLifecycle) -> ListenerResult {
        self.on_request.as_ref().map_or(Ok(()), |hook| hook(lifecycle))
    }

    fn on_response(&self, lifecycle: &RequestLifecycle) -> ListenerResult {
        self.on_response.as_ref().map_or(Ok(()), |hook| hook(lifecycle))
    }
}

#[derive(Clone, Copy)]
enum Phase {
    Request,
    Response,
}

impl Phase {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Request => "on_request",
            Self::Response => "on_response",
        }
    }
}

/// Registry of listeners, notified in registration order.
#[derive(Default)]
pub struct Listeners {
    inner: Mutex<Registry>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<(ListenerId, ListenerHandle)>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: ListenerHandle) -> ListenerId {
        let mut registry = self.lock();
        let id = ListenerId(registry.next_id);
        registry.next_id += 1;
        registry.entries.push((id, listener));
        id
    }

    /// Returns whether a listener was registered under `id`.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut registry = self.lock();
        let before = registry.entries.len();
        registry.entries.retain(|(entry, _)| *entry != id);
        registry.entries.len() != before
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn notify_request(&self, lifecycle: &RequestLifecycle, debug: bool) {
        self.notify(Phase::Request, lifecycle, debug);
    }

    pub fn notify_response(&self, lifecycle: &RequestLifecycle, debug: bool) {
        self.notify(Phase::Response, lifecycle, debug);
    }

    // Listeners run outside the lock so they may (de)register listeners.
    fn notify(&self, phase: Phase, lifecycle: &RequestLifecycle, debug: bool) {
        let snapshot: Vec<ListenerHandle> = self
            .lock()
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in snapshot {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                match phase {
                    Phase::Request => listener.on_request(lifecycle),
                    Phase::Response => listener.on_response(lifecycle),
                }
            }));

            let failure = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => err.to_string(),
                Err(_) => "listener panicked".to_string(),
            };

            if debug {
                debug!(
                    request_id = %lifecycle.id,
                    hook = phase.as_str(),
                    "listener failed: {failure}"
                );
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use quill_http::HttpRequest;

    use super::*;
    use crate::lifecycle::RequestStatus;

    fn lifecycle() -> RequestLifecycle {
        RequestLifecycle::new(HttpRequest::new("http://localhost/graphql"))
    }

    #[test]
    fn test_channel_listener() {
        let (listener, rx) = ChannelListener::new();
        let lc = lifecycle();
        listener.on_request(&lc).unwrap();
        listener.on_response(&lc).unwrap();

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], RequestEvent::Started(l) if l.id == lc.id));
        assert!(matches!(&events[1], RequestEvent::Finished(_)));
    }

    #[test]
    fn test_channel_listener_receiver_dropped() {
        let (listener, rx) = ChannelListener::new();
        drop(rx);
        assert!(listener.on_request(&lifecycle()).is_ok());
    }

    #[test]
    fn test_registry_order_and_removal() {
        let listeners = Listeners::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let ids: Vec<_> = (0..3)
            .map(|n| {
                let order = Arc::clone(&order);
                listeners.add(Arc::new(Hooks::new().on_request(move |_| {
                    order.lock().unwrap().push(n);
                    Ok(())
                })))
            })
            .collect();

        listeners.notify_request(&lifecycle(), false);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);

        assert!(listeners.remove(ids[1]));
        assert!(!listeners.remove(ids[1]));
        listeners.notify_request(&lifecycle(), false);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 0, 2]);

        listeners.clear();
        assert!(listeners.is_empty());
    }

    #[test]
    fn test_failing_listeners_are_isolated() {
        let listeners = Listeners::new();
        let calls = Arc::new(AtomicUsize::new(0));

        listeners.add(Arc::new(
            Hooks::new().on_response(|_| Err("boom".into())),
        ));
        listeners.add(Arc::new(
            Hooks::new().on_response(|_| panic!("listener bug")),
        ));
        let counter = Arc::clone(&calls);
        listeners.add(Arc::new(Hooks::new().on_response(move |lc| {
            assert_eq!(lc.status, RequestStatus::Pending);
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })));

        listeners.notify_response(&lifecycle(), true);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_collector_listener() {
        let collector = Arc::new(CollectorListener::default());
        let listeners = Listeners::new();
        listeners.add(collector.clone());

        let lc = lifecycle();
        listeners.notify_request(&lc, false);
        listeners.notify_response(&lc, false);

        assert_eq!(collector.len(), 2);
        assert!(matches!(collector.events()[1], RequestEvent::Finished(_)));
    }

    #[test]
    fn test_listener_types_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ChannelListener>();
        assert_send_sync::<CollectorListener>();
        assert_send_sync::<Hooks>();
        assert_send_sync::<Listeners>();
    }
}
