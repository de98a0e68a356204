//! Which pools' events reach a connection.
//!
//! A connection follows individual pools, or everything after `"*"`.
//! Unfollowing a single pool while following everything mutes that pool
//! until it is followed again or `"*"` is dropped.

use std::collections::HashSet;

use crate::domain::PoolId;

/// Event filter of one WebSocket connection.
#[derive(Debug, Default)]
pub struct PoolFilter {
    followed: HashSet<PoolId>,
    muted: HashSet<PoolId>,
    everything: bool,
}

impl PoolFilter {
    /// Creates a filter that admits nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts following `ids`, and every pool when `everything` is set.
    pub fn follow(&mut self, ids: &[PoolId], everything: bool) {
        if everything {
            self.everything = true;
            self.muted.clear();
        }
        for id in ids {
            self.muted.remove(id);
            self.followed.insert(*id);
        }
    }

    /// Stops following `ids`. With `everything` set the filter falls back to
    /// the individually followed pools.
    pub fn unfollow(&mut self, ids: &[PoolId], everything: bool) {
        if everything {
            self.everything = false;
            self.muted.clear();
        }
        for id in ids {
            self.followed.remove(id);
            if self.everything {
                self.muted.insert(*id);
            }
        }
    }

    /// Returns `true` if events of `pool_id` are forwarded.
    #[must_use]
    pub fn admits(&self, pool_id: PoolId) -> bool {
        !self.muted.contains(&pool_id) && (self.everything || self.followed.contains(&pool_id))
    }

    /// Reply payload describing the filter after a change.
    #[must_use]
    pub fn state(&self) -> serde_json::Value {
        let mut followed: Vec<String> = self.followed.iter().map(ToString::to_string).collect();
        followed.sort();
        serde_json::json!({
            "followed": followed,
            "count": self.followed.len(),
            "wildcard": self.everything,
            "muted": self.muted.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_filter_admits_nothing() {
        assert!(!PoolFilter::new().admits(PoolId::new()));
    }

    #[test]
    fn individual_pools() {
        let mut filter = PoolFilter::new();
        let (a, b) = (PoolId::new(), PoolId::new());
        filter.follow(&[a, a, b], false);
        assert!(filter.admits(a));
        assert_eq!(filter.state()["count"], 2);

        filter.unfollow(&[a], false);
        assert!(!filter.admits(a));
        assert!(filter.admits(b));
        assert_eq!(filter.state()["muted"], 0);
    }

    #[test]
    fn unfollowing_under_wildcard_mutes_until_followed_again() {
        let mut filter = PoolFilter::new();
        let noisy = PoolId::new();
        filter.follow(&[], true);
        assert!(filter.admits(noisy));

        filter.unfollow(&[noisy], false);
        assert!(!filter.admits(noisy));
        assert!(filter.admits(PoolId::new()));

        filter.follow(&[noisy], false);
        assert!(filter.admits(noisy));
    }

    #[test]
    fn dropping_wildcard_keeps_individual_pools() {
        let mut filter = PoolFilter::new();
        let kept = PoolId::new();
        filter.follow(&[kept], true);
        filter.unfollow(&[PoolId::new()], false);

        filter.unfollow(&[], true);
        assert_eq!(filter.state()["wildcard"], false);
        assert_eq!(filter.state()["muted"], 0);
        assert!(filter.admits(kept));
        assert!(!filter.admits(PoolId::new()));
    }
}
