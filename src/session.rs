//! In-memory cart sessions, one per app session.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::cart::CartState;
use crate::error::{AppError, AppResult, CartError};
use crate::notify::{DEFAULT_TOAST_TTL_SECS, ToastQueue};

#[derive(Debug, Clone)]
pub struct CartSession {
    pub cart: CartState,
    pub toasts: ToastQueue,
    pub payment_in_flight: bool,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl CartSession {
    fn new(toast_ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            cart: CartState::new(),
            toasts: ToastQueue::new(toast_ttl),
            payment_in_flight: false,
            created_at: now,
            last_seen: now,
        }
    }

    /// The cart, for changes made on the customer's behalf.
    ///
    /// Refused while a payment is in flight: the payment was priced from the
    /// cart as it stood, and a capture empties it.
    pub fn cart_mut(&mut self) -> Result<&mut CartState, CartError> {
        if self.payment_in_flight {
            return Err(CartError::CheckoutInProgress);
        }
        Ok(&mut self.cart)
    }
}

/// Sessions keyed by id.
///
/// Closures passed to [`SessionStore::with_session`] run under a shard lock and
/// must not block; async work happens between two calls.
pub struct SessionStore {
    sessions: DashMap<Uuid, CartSession>,
    toast_ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_TOAST_TTL_SECS))
    }
}

impl SessionStore {
    pub fn new(toast_ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            toast_ttl,
        }
    }

    pub fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions.insert(id, CartSession::new(self.toast_ttl));
        id
    }

    /// Run `f` against session `id` and mark it as seen.
    pub fn with_session<R>(&self, id: Uuid, f: impl FnOnce(&mut CartSession) -> R) -> AppResult<R> {
        let mut session = self.sessions.get_mut(&id).ok_or(AppError::NotFound)?;
        session.last_seen = Utc::now();
        Ok(f(&mut *session))
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.sessions.contains_key(&id)
    }

    /// End session `id`. A session with a payment in flight is kept.
    pub fn remove(&self, id: Uuid) -> AppResult<()> {
        match self.sessions.remove_if(&id, |_, s| !s.payment_in_flight) {
            Some(_) => Ok(()),
            None if self.sessions.contains_key(&id) => Err(CartError::CheckoutInProgress.into()),
            None => Err(AppError::NotFound),
        }
    }

    /// Drop sessions untouched for `max_idle`, sparing any with a payment in
    /// flight. Returns how many were evicted.
    pub fn evict_idle(&self, max_idle: Duration, now: DateTime<Utc>) -> usize {
        let mut evicted = 0;
        self.sessions.retain(|_, s| {
            let keep = s.payment_in_flight || now - s.last_seen < max_idle;
            if !keep {
                evicted += 1;
            }
            keep
        });
        evicted
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_session_is_not_found() {
        let store = SessionStore::default();
        let result = store.with_session(Uuid::new_v4(), |s| s.cart.is_empty());
        assert!(matches!(result, Err(AppError::NotFound)));
        assert!(matches!(store.remove(Uuid::new_v4()), Err(AppError::NotFound)));
    }

    #[test]
    fn sessions_are_isolated() {
        let store = SessionStore::default();
        let a = store.create();
        let b = store.create();
        store
            .with_session(a, |s| s.payment_in_flight = true)
            .unwrap();
        assert!(!store.with_session(b, |s| s.payment_in_flight).unwrap());
        assert!(store.remove(b).is_ok());
        assert!(!store.contains(b));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn session_paying_cannot_be_removed() {
        let store = SessionStore::default();
        let id = store.create();
        store.with_session(id, |s| s.payment_in_flight = true).unwrap();
        assert!(matches!(store.remove(id), Err(AppError::Conflict(_))));
        assert!(store.contains(id));
    }

    #[test]
    fn cart_is_locked_while_paying() {
        let store = SessionStore::default();
        let id = store.create();
        let locked = store
            .with_session(id, |s| {
                s.payment_in_flight = true;
                s.cart_mut().map(|_| ())
            })
            .unwrap();
        assert_eq!(locked, Err(CartError::CheckoutInProgress));
    }

    #[test]
    fn idle_sessions_are_evicted() {
        let store = SessionStore::default();
        let idle = store.create();
        let paying = store.create();
        store.with_session(paying, |s| s.payment_in_flight = true).unwrap();

        let later = Utc::now() + Duration::hours(2);
        let fresh = store.create();
        store
            .with_session(fresh, |s| s.last_seen = later)
            .unwrap();

        assert_eq!(store.evict_idle(Duration::hours(1), later), 1);
        assert!(!store.contains(idle));
        assert!(store.contains(paying));
        assert!(store.contains(fresh));
    }
}
