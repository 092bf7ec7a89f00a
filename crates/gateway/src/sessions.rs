//! Server-side session storage.
//!
//! Each conversant's [`Session`] lives behind its own async mutex, so two
//! requests on the same cookie run one after the other while different
//! conversants never wait on each other. The outer map lock is only held
//! to find or create a slot.

use campusdesk_config::GatewayConfig;
use campusdesk_core::session::{Session, SessionId};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::{debug, info};

/// One conversant's session plus its last activity time.
pub struct SessionSlot {
    session: Mutex<Session>,
    last_seen: std::sync::Mutex<DateTime<Utc>>,
}

impl SessionSlot {
    fn new() -> Self {
        Self {
            session: Mutex::new(Session::new()),
            last_seen: std::sync::Mutex::new(Utc::now()),
        }
    }

    /// Take the single-writer lock for a turn.
    pub async fn lock(&self) -> MutexGuard<'_, Session> {
        let guard = self.session.lock().await;
        self.touch();
        guard
    }

    fn touch(&self) {
        *self.last_seen.lock().unwrap_or_else(|e| e.into_inner()) = Utc::now();
    }

    fn last_seen(&self) -> DateTime<Utc> {
        *self.last_seen.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// A turn holds or is about to take this slot. Call with the map's
    /// write lock held, so no new handle can appear meanwhile.
    fn in_use(self: &Arc<Self>) -> bool {
        Arc::strong_count(self) > 1 || self.session.try_lock().is_err()
    }
}

pub struct SessionStore {
    slots: RwLock<HashMap<SessionId, Arc<SessionSlot>>>,
    idle: Duration,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(idle: Duration, max_sessions: usize) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            idle,
            max_sessions: max_sessions.max(1),
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(
            Duration::minutes(config.session_idle_minutes as i64),
            config.max_sessions,
        )
    }

    /// The slot for `id`, created empty if unknown.
    pub async fn slot(&self, id: &SessionId) -> Arc<SessionSlot> {
        if let Some(slot) = self.slots.read().await.get(id) {
            return slot.clone();
        }

        let mut slots = self.slots.write().await;
        if let Some(slot) = slots.get(id) {
            return slot.clone();
        }
        self.make_room(&mut slots);
        let slot = Arc::new(SessionSlot::new());
        slots.insert(id.clone(), slot.clone());
        debug!(session = %id, "Session created");
        slot
    }

    /// The slot for `id` if this store issued it and still holds it.
    pub async fn existing(&self, id: &SessionId) -> Option<Arc<SessionSlot>> {
        self.slots.read().await.get(id).cloned()
    }

    /// Replace whatever `id` held with a fresh session.
    pub async fn reset(&self, id: &SessionId) {
        let mut slots = self.slots.write().await;
        if slots.remove(id).is_none() {
            self.make_room(&mut slots);
        }
        slots.insert(id.clone(), Arc::new(SessionSlot::new()));
    }

    pub async fn remove(&self, id: &SessionId) -> bool {
        self.slots.write().await.remove(id).is_some()
    }

    pub async fn contains(&self, id: &SessionId) -> bool {
        self.slots.read().await.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.slots.read().await.is_empty()
    }

    /// Drop sessions idle for longer than the configured window.
    pub async fn evict_idle(&self) -> usize {
        let mut slots = self.slots.write().await;
        self.evict_idle_locked(&mut slots, Utc::now())
    }

    fn evict_idle_locked(
        &self,
        slots: &mut HashMap<SessionId, Arc<SessionSlot>>,
        now: DateTime<Utc>,
    ) -> usize {
        let before = slots.len();
        slots.retain(|_, slot| slot.in_use() || now - slot.last_seen() < self.idle);
        before - slots.len()
    }

    /// Ensure there is space for one more slot: idle sessions go first,
    /// then the least recently active one. Slots in use are never taken,
    /// so the store may briefly exceed its bound.
    fn make_room(&self, slots: &mut HashMap<SessionId, Arc<SessionSlot>>) {
        if slots.len() < self.max_sessions {
            return;
        }
        let evicted = self.evict_idle_locked(slots, Utc::now());
        if evicted > 0 {
            info!(evicted, "Evicted idle sessions");
        }
        while slots.len() >= self.max_sessions {
            let oldest = slots
                .iter()
                .filter(|(_, slot)| !slot.in_use())
                .min_by_key(|(_, slot)| slot.last_seen())
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    slots.remove(&id);
                    debug!(session = %id, "Evicted least recently active session");
                }
                None => break,
            }
        }
    }

    /// Sweep idle sessions every `every` until the store is dropped.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        every: std::time::Duration,
    ) -> tokio::task::JoinHandle<()> {
        let store = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(store) = store.upgrade() else { break };
                let evicted = store.evict_idle().await;
                if evicted > 0 {
                    info!(evicted, "Session sweep");
                }
            }
        })
    }

    #[cfg(test)]
    async fn backdate(&self, id: &SessionId, by: Duration) {
        if let Some(slot) = self.slots.read().await.get(id) {
            *slot.last_seen.lock().unwrap() = Utc::now() - by;
        }
    }
}
