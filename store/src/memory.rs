//! In-memory storage backend.
//!
//! Backs tests and single-instance deployments. All three traits are
//! implemented over mutex-guarded maps; the state table and its session
//! index live under one lock so a compare-and-set write and its index
//! update are a single atomic step.

use crate::error::StoreError;
use crate::log::VerificationLogStore;
use crate::rate_limit::{RateDecision, RateLimitStore};
use crate::state::VerificationStateStore;
use agegate_types::{
    SessionId, StateRecord, Timestamp, UserId, VerificationLogEntry, VerificationState,
};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct StateTable {
    records: HashMap<UserId, StateRecord>,
    /// Every session id ever assigned, including superseded ones, so late
    /// webhooks still resolve to a user.
    sessions: HashMap<SessionId, UserId>,
}

/// In-memory implementation of all agegate storage traits.
#[derive(Default)]
pub struct MemoryStore {
    states: Mutex<StateTable>,
    logs: Mutex<Vec<VerificationLogEntry>>,
    attempts: Mutex<HashMap<String, Vec<u64>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_states(&self) -> std::sync::MutexGuard<'_, StateTable> {
        self.states.lock().expect("state table lock poisoned")
    }
}

impl VerificationStateStore for MemoryStore {
    fn get_state(&self, user: &UserId) -> Result<StateRecord, StoreError> {
        let table = self.lock_states();
        Ok(table
            .records
            .get(user)
            .cloned()
            .unwrap_or_else(|| StateRecord::unverified(user.clone())))
    }

    fn put_state(
        &self,
        user: &UserId,
        expected_version: u64,
        state: &VerificationState,
    ) -> Result<u64, StoreError> {
        let mut table = self.lock_states();

        let found = table
            .records
            .get(user)
            .map(|r| r.version)
            .unwrap_or(0);
        if found != expected_version {
            return Err(StoreError::Conflict {
                expected: expected_version,
                found,
            });
        }

        if let Some(session_id) = state.session_id() {
            match table.sessions.get(session_id) {
                Some(owner) if owner != user => {
                    return Err(StoreError::Duplicate(session_id.to_string()));
                }
                _ => {}
            }
            table.sessions.insert(session_id.clone(), user.clone());
        }

        let version = expected_version + 1;
        table.records.insert(
            user.clone(),
            StateRecord {
                user_id: user.clone(),
                version,
                state: state.clone(),
            },
        );
        Ok(version)
    }

    fn find_user_by_session(&self, session: &SessionId) -> Result<Option<UserId>, StoreError> {
        let table = self.lock_states();
        Ok(table.sessions.get(session).cloned())
    }

    fn iter_in_flight(&self) -> Result<Vec<StateRecord>, StoreError> {
        let table = self.lock_states();
        Ok(table
            .records
            .values()
            .filter(|r| r.state.is_in_flight())
            .cloned()
            .collect())
    }
}

impl VerificationLogStore for MemoryStore {
    fn append(&self, entry: &VerificationLogEntry) -> Result<(), StoreError> {
        self.logs
            .lock()
            .expect("log table lock poisoned")
            .push(entry.clone());
        Ok(())
    }

    fn for_user(&self, user: &UserId, limit: usize) -> Result<Vec<VerificationLogEntry>, StoreError> {
        let logs = self.logs.lock().expect("log table lock poisoned");
        Ok(logs
            .iter()
            .rev()
            .filter(|e| &e.user_id == user)
            .take(limit)
            .cloned()
            .collect())
    }
}

impl RateLimitStore for MemoryStore {
    fn check_and_record(
        &self,
        identifier: &str,
        now: Timestamp,
        window_millis: u64,
        max_requests: u32,
    ) -> Result<RateDecision, StoreError> {
        let mut attempts = self.attempts.lock().expect("attempt table lock poisoned");
        let list = attempts.entry(identifier.to_string()).or_default();

        let window_start = now.as_millis().saturating_sub(window_millis);
        list.retain(|&ts| ts > window_start);

        if list.len() as u32 >= max_requests {
            let oldest = list.iter().copied().min().unwrap_or(now.as_millis());
            return Ok(RateDecision {
                allowed: false,
                remaining: 0,
                reset_at: Timestamp::from_millis(oldest.saturating_add(window_millis)),
            });
        }

        list.push(now.as_millis());
        let oldest = list.iter().copied().min().unwrap_or(now.as_millis());
        Ok(RateDecision {
            allowed: true,
            remaining: max_requests - list.len() as u32,
            reset_at: Timestamp::from_millis(oldest.saturating_add(window_millis)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agegate_types::{PendingSession, ProviderKind};

    fn pending(session: &str, started_secs: u64) -> VerificationState {
        VerificationState::Pending(PendingSession {
            provider: ProviderKind::Veriff,
            session_id: SessionId::new(session),
            session_url: format!("https://verify.example/s/{session}"),
            started_at: Timestamp::from_secs(started_secs),
        })
    }

    #[test]
    fn missing_user_reads_as_unverified_version_zero() {
        let store = MemoryStore::new();
        let record = store.get_state(&UserId::new("u-1")).unwrap();
        assert_eq!(record.version, 0);
        assert_eq!(record.state, VerificationState::Unverified);
    }

    #[test]
    fn put_state_bumps_version() {
        let store = MemoryStore::new();
        let user = UserId::new("u-1");

        let v1 = store.put_state(&user, 0, &pending("s-1", 100)).unwrap();
        assert_eq!(v1, 1);

        let record = store.get_state(&user).unwrap();
        assert_eq!(record.version, 1);
        assert_eq!(record.state.status_str(), "pending");
    }

    #[test]
    fn put_state_with_stale_version_conflicts() {
        let store = MemoryStore::new();
        let user = UserId::new("u-1");
        store.put_state(&user, 0, &pending("s-1", 100)).unwrap();

        let err = store.put_state(&user, 0, &pending("s-2", 200)).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { expected: 0, found: 1 }));
    }

    #[test]
    fn session_id_cannot_belong_to_two_users() {
        let store = MemoryStore::new();
        store
            .put_state(&UserId::new("u-1"), 0, &pending("s-shared", 100))
            .unwrap();

        let err = store
            .put_state(&UserId::new("u-2"), 0, &pending("s-shared", 100))
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[test]
    fn superseded_sessions_still_resolve_to_the_user() {
        let store = MemoryStore::new();
        let user = UserId::new("u-1");
        store.put_state(&user, 0, &pending("s-old", 100)).unwrap();
        store.put_state(&user, 1, &pending("s-new", 200)).unwrap();

        assert_eq!(
            store.find_user_by_session(&SessionId::new("s-old")).unwrap(),
            Some(user.clone())
        );
        assert_eq!(
            store.find_user_by_session(&SessionId::new("s-new")).unwrap(),
            Some(user)
        );
        assert_eq!(
            store.find_user_by_session(&SessionId::new("s-none")).unwrap(),
            None
        );
    }

    #[test]
    fn stale_pending_users_filters_by_cutoff() {
        let store = MemoryStore::new();
        store
            .put_state(&UserId::new("u-old"), 0, &pending("s-1", 100))
            .unwrap();
        store
            .put_state(&UserId::new("u-new"), 0, &pending("s-2", 900))
            .unwrap();

        let stale = store.stale_pending_users(Timestamp::from_secs(500)).unwrap();
        assert_eq!(stale, vec![UserId::new("u-old")]);
    }

    #[test]
    fn logs_return_newest_first_up_to_limit() {
        let store = MemoryStore::new();
        let user = UserId::new("u-1");
        for i in 0..5 {
            store
                .append(&VerificationLogEntry {
                    user_id: user.clone(),
                    provider: "veriff".into(),
                    event: format!("event-{i}"),
                    status: "pending".into(),
                    payload: serde_json::Value::Null,
                    ip_address: None,
                    user_agent: None,
                    created_at: Timestamp::from_secs(i),
                })
                .unwrap();
        }

        let entries = store.for_user(&user, 3).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].event, "event-4");
        assert_eq!(entries[2].event, "event-2");
    }

    #[test]
    fn rate_limit_denies_sixth_attempt_in_window() {
        let store = MemoryStore::new();
        let now = Timestamp::from_millis(1_000_000);

        for i in 0..5 {
            let decision = store
                .check_and_record("10.0.0.1", now, 3_600_000, 5)
                .unwrap();
            assert!(decision.allowed, "attempt {i} should be allowed");
            assert_eq!(decision.remaining, 4 - i);
        }

        let denied = store
            .check_and_record("10.0.0.1", now, 3_600_000, 5)
            .unwrap();
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
        assert_eq!(denied.reset_at, Timestamp::from_millis(1_000_000 + 3_600_000));
    }

    #[test]
    fn rate_limit_window_slides() {
        let store = MemoryStore::new();
        let t0 = Timestamp::from_millis(0);
        for _ in 0..5 {
            assert!(store.check_and_record("ip", t0, 1000, 5).unwrap().allowed);
        }
        assert!(!store.check_and_record("ip", t0, 1000, 5).unwrap().allowed);

        // After the window elapses, attempts are pruned and the call succeeds.
        let later = Timestamp::from_millis(1001);
        assert!(store.check_and_record("ip", later, 1000, 5).unwrap().allowed);
    }

    #[test]
    fn rate_limit_identifiers_are_independent() {
        let store = MemoryStore::new();
        let now = Timestamp::from_millis(50);
        for _ in 0..5 {
            store.check_and_record("a", now, 1000, 5).unwrap();
        }
        assert!(!store.check_and_record("a", now, 1000, 5).unwrap().allowed);
        assert!(store.check_and_record("b", now, 1000, 5).unwrap().allowed);
    }
}
