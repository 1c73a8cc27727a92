use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use ulid::Ulid;

use crate::limits::MAX_SESSIONS;
use crate::model::{Role, StaffMember};

/// Identity carried by a bearer credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub staff_id: Ulid,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Clone)]
struct Session {
    context: AuthContext,
    expires_at: DateTime<Utc>,
}

/// Hash a password as `salt$digest`, both base64url. The digest is
/// SHA-256 over salt ‖ password.
pub fn hash_password(password: &str) -> String {
    let salt: [u8; 16] = rand::random();
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    let digest = hasher.finalize();
    format!(
        "{}${}",
        URL_SAFE_NO_PAD.encode(salt),
        URL_SAFE_NO_PAD.encode(digest)
    )
}

/// Verify a password against a stored `salt$digest` string.
/// Malformed stored hashes verify as false, never panic.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_b64, digest_b64)) = stored.split_once('$') else {
        return false;
    };
    let Ok(salt) = URL_SAFE_NO_PAD.decode(salt_b64) else {
        return false;
    };
    let Ok(expected) = URL_SAFE_NO_PAD.decode(digest_b64) else {
        return false;
    };
    let mut hasher = Sha256::new();
    hasher.update(&salt);
    hasher.update(password.as_bytes());
    let computed = hasher.finalize();
    constant_time_eq::constant_time_eq(&computed, &expected)
}

fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// In-memory bearer-token sessions with a fixed TTL.
///
/// Tokens are opaque random strings. A restart invalidates every outstanding
/// session.
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    ttl: chrono::Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl: chrono::Duration::seconds(ttl.as_secs() as i64),
        }
    }

    /// Issue a fresh bearer token for a staff member.
    pub fn issue(&self, staff: &StaffMember) -> String {
        if self.sessions.len() >= MAX_SESSIONS {
            self.purge_expired(Utc::now());
        }
        let token = generate_token();
        self.sessions.insert(
            token.clone(),
            Session {
                context: AuthContext {
                    staff_id: staff.id,
                    username: staff.username.clone(),
                    role: staff.role,
                },
                expires_at: Utc::now() + self.ttl,
            },
        );
        metrics::gauge!(crate::observability::SESSIONS_ACTIVE).set(self.sessions.len() as f64);
        token
    }

    /// Resolve a bearer token to its identity. Expired tokens are dropped on
    /// the spot rather than waiting for the reaper.
    pub fn authenticate(&self, token: &str) -> Option<AuthContext> {
        let expired = {
            let session = self.sessions.get(token)?;
            if session.expires_at <= Utc::now() {
                true
            } else {
                return Some(session.context.clone());
            }
        };
        if expired {
            self.sessions.remove(token);
        }
        None
    }

    /// Drop every session past its expiry. Returns how many were removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.expires_at > now);
        let removed = before - self.sessions.len();
        metrics::gauge!(crate::observability::SESSIONS_ACTIVE).set(self.sessions.len() as f64);
        removed
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

    fn staff() -> StaffMember {
        StaffMember {
            id: Ulid::new(),
            username: "frontdesk1".into(),
            password_hash: hash_password("correct horse"),
            role: Role::Staff,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn password_roundtrip() {
        let hash = hash_password("s3cret-pass");
        assert!(verify_password("s3cret-pass", &hash));
        assert!(!verify_password("wrong-pass", &hash));
    }

    #[test]
    fn same_password_different_salts() {
        let a = hash_password("hunter22");
        let b = hash_password("hunter22");
        assert_ne!(a, b);
        assert!(verify_password("hunter22", &a));
        assert!(verify_password("hunter22", &b));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("anything", ""));
        assert!(!verify_password("anything", "no-separator"));
        assert!(!verify_password("anything", "!!bad!!$also-bad"));
    }

    #[test]
    fn tokens_are_unique_and_opaque() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert!(a.len() >= 40); // 32 bytes base64url
    }

    #[test]
    fn issue_then_authenticate() {
        let store = SessionStore::new(Duration::from_secs(3600));
        let member = staff();
        let token = store.issue(&member);

        let ctx = store.authenticate(&token).unwrap();
        assert_eq!(ctx.staff_id, member.id);
        assert_eq!(ctx.username, "frontdesk1");
        assert_eq!(ctx.role, Role::Staff);

        assert!(store.authenticate("not-a-token").is_none());
    }

    #[test]
    fn expired_session_rejected_and_dropped() {
        let store = SessionStore::new(Duration::ZERO);
        let token = store.issue(&staff());
        assert!(store.authenticate(&token).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn purge_removes_only_expired() {
        let live = SessionStore::new(Duration::from_secs(3600));
        live.issue(&staff());
        assert_eq!(live.purge_expired(Utc::now()), 0);
        assert_eq!(live.len(), 1);

        let dead = SessionStore::new(Duration::ZERO);
        dead.issue(&staff());
        dead.issue(&staff());
        assert_eq!(dead.purge_expired(Utc::now()), 2);
        assert!(dead.is_empty());
    }
}
