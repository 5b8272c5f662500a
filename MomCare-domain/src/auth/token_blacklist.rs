use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use once_cell::sync::Lazy;
use tracing::{debug, info, warn};

/// Global blacklist shared by the token validator and logout
static TOKEN_BLACKLIST: Lazy<TokenBlacklist> = Lazy::new(TokenBlacklist::new);

#[derive(Debug, Clone, Copy)]
struct Revocation {
    /// Unix seconds; tokens issued at or before this are rejected
    revoked_at: i64,
    /// Unix seconds after which every revoked token has expired anyway
    expires_at: i64,
}

/// Per-user revocation instants
///
/// Logging out revokes every token the user holds at that moment. Tokens
/// issued later stay valid.
pub struct TokenBlacklist {
    revocations: Mutex<HashMap<String, Revocation>>,
    /// Entry count that triggers pruning
    max_size: usize,
}

impl Default for TokenBlacklist {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenBlacklist {
    pub fn new() -> Self {
        Self::with_max_size(10_000)
    }

    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            revocations: Mutex::new(HashMap::new()),
            max_size: max_size.max(1),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Revocation>> {
        self.revocations.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Revoke every token of `user_id` issued up to `revoked_at`
    pub fn revoke_user(&self, user_id: &str, revoked_at: i64, expires_at: i64) {
        let mut entries = self.entries();

        if entries.len() >= self.max_size && !entries.contains_key(user_id) {
            warn!("Token blacklist reached max size ({}), pruning", self.max_size);
            Self::prune(&mut entries, revoked_at);
            if entries.len() >= self.max_size {
                Self::remove_oldest(&mut entries, self.max_size / 2);
            }
        }

        entries.insert(user_id.to_string(), Revocation { revoked_at, expires_at });
        info!("Tokens revoked for user {}", user_id);
    }

    /// Whether a token issued at `issued_at` for `user_id` has been revoked
    pub fn is_revoked(&self, user_id: &str, issued_at: i64) -> bool {
        self.entries()
            .get(user_id)
            .is_some_and(|r| issued_at <= r.revoked_at)
    }

    /// Earliest issue time a new token may carry and still be valid
    pub fn next_issue_time(&self, user_id: &str, now: i64) -> i64 {
        match self.entries().get(user_id) {
            Some(r) if now <= r.revoked_at => r.revoked_at + 1,
            _ => now,
        }
    }

    pub fn size(&self) -> usize {
        self.entries().len()
    }

    /// Drop revocations whose tokens have all expired
    pub fn cleanup_expired(&self, now: i64) -> usize {
        let mut entries = self.entries();
        Self::prune(&mut entries, now)
    }

    fn prune(entries: &mut HashMap<String, Revocation>, now: i64) -> usize {
        let before = entries.len();
        entries.retain(|_, r| r.expires_at > now);
        let removed = before - entries.len();
        if removed > 0 {
            debug!("Removed {} expired revocations from blacklist", removed);
        }
        removed
    }

    fn remove_oldest(entries: &mut HashMap<String, Revocation>, count: usize) {
        let mut by_age: Vec<(String, i64)> = entries
            .iter()
            .map(|(user, r)| (user.clone(), r.revoked_at))
            .collect();
        by_age.sort_by_key(|(_, revoked_at)| *revoked_at);

        for (user, _) in by_age.into_iter().take(count) {
            entries.remove(&user);
        }
        debug!("Removed {} oldest entries from token blacklist", count);
    }
}

/// The process-wide blacklist
pub fn blacklist() -> &'static TokenBlacklist {
    &TOKEN_BLACKLIST
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revocation_is_by_issue_time() {
        let blacklist = TokenBlacklist::new();
        blacklist.revoke_user("u1", 1_000, 5_000);

        assert!(blacklist.is_revoked("u1", 999));
        assert!(blacklist.is_revoked("u1", 1_000));
        assert!(!blacklist.is_revoked("u1", 1_001));
        assert!(!blacklist.is_revoked("u2", 999));
    }

    #[test]
    fn test_next_issue_time_skips_revoked_second() {
        let blacklist = TokenBlacklist::new();
        assert_eq!(blacklist.next_issue_time("u1", 1_000), 1_000);

        blacklist.revoke_user("u1", 1_000, 5_000);
        assert_eq!(blacklist.next_issue_time("u1", 1_000), 1_001);
        assert_eq!(blacklist.next_issue_time("u1", 1_200), 1_200);
    }

    #[test]
    fn test_cleanup_expired() {
        let blacklist = TokenBlacklist::new();
        blacklist.revoke_user("old", 100, 200);
        blacklist.revoke_user("current", 100, 900);

        assert_eq!(blacklist.cleanup_expired(500), 1);
        assert_eq!(blacklist.size(), 1);
        assert!(blacklist.is_revoked("current", 50));
    }

    #[test]
    fn test_max_size_removes_oldest() {
        let blacklist = TokenBlacklist::with_max_size(4);
        for i in 0..4 {
            blacklist.revoke_user(&format!("user-{}", i), 100 + i, 10_000);
        }
        assert_eq!(blacklist.size(), 4);

        blacklist.revoke_user("newest", 200, 10_000);
        assert_eq!(blacklist.size(), 3);
        assert!(!blacklist.is_revoked("user-0", 0));
        assert!(!blacklist.is_revoked("user-1", 0));
        assert!(blacklist.is_revoked("newest", 150));
    }
}
