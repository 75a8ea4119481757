use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Named command counters. Increments are relaxed atomics; a snapshot is
/// point-in-time per counter, not consistent across counters.
#[derive(Default)]
pub struct Stats {
    num_get: AtomicU64,
    num_gets: AtomicU64,
    num_set: AtomicU64,
    num_cas: AtomicU64,
    num_delete: AtomicU64,
    err_num_unsupported_cmds: AtomicU64,
}

/// Snapshot of all counters. This is the read contract of the admin
/// surface: serializable as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub num_get: u64,
    pub num_gets: u64,
    pub num_set: u64,
    pub num_cas: u64,
    pub num_delete: u64,
    pub err_num_unsupported_cmds: u64,
}

impl Stats {
    pub fn new() -> Stats {
        Default::default()
    }

    pub fn incr_get(&self) {
        self.num_get.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_gets(&self) {
        self.num_gets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_set(&self) {
        self.num_set.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_cas(&self) {
        self.num_cas.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_delete(&self) {
        self.num_delete.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_unsupported(&self) {
        self.err_num_unsupported_cmds.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            num_get: self.num_get.load(Ordering::Relaxed),
            num_gets: self.num_gets.load(Ordering::Relaxed),
            num_set: self.num_set.load(Ordering::Relaxed),
            num_cas: self.num_cas.load(Ordering::Relaxed),
            num_delete: self.num_delete.load(Ordering::Relaxed),
            err_num_unsupported_cmds: self.err_num_unsupported_cmds.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_stats_snapshot_is_zeroed() {
        let snapshot = Stats::new().snapshot();
        assert_eq!(snapshot.num_get, 0);
        assert_eq!(snapshot.num_gets, 0);
        assert_eq!(snapshot.num_set, 0);
        assert_eq!(snapshot.num_cas, 0);
        assert_eq!(snapshot.num_delete, 0);
        assert_eq!(snapshot.err_num_unsupported_cmds, 0);
    }

    #[test]
    fn increments_show_up_in_snapshot() {
        let stats = Stats::new();
        stats.incr_get();
        stats.incr_get();
        stats.incr_set();
        stats.incr_unsupported();
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.num_get, 2);
        assert_eq!(snapshot.num_set, 1);
        assert_eq!(snapshot.err_num_unsupported_cmds, 1);
        assert_eq!(snapshot.num_delete, 0);
    }

    #[test]
    fn snapshot_serializes_with_counter_names() {
        let stats = Stats::new();
        stats.incr_cas();
        let json = serde_json::to_value(stats.snapshot()).unwrap();
        assert_eq!(json["num_cas"], 1);
        assert_eq!(json["err_num_unsupported_cmds"], 0);
    }
}
