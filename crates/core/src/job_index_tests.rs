// SPDX-License-Identifier: MIT

use super::*;
use crate::tserver::TabletServerId;

fn tsi(n: u16) -> TabletServerId {
    TabletServerId::new("host", n, format!("tok-{n}"))
}

#[test]
fn pick_highest_returns_none_on_empty_queue() {
    let idx = JobIndex::new();
    let q = idx.intern("Q");
    assert!(idx.pick_highest(&q).is_none());
}

#[test]
fn priority_preemption_picks_higher_priority_first() {
    let idx = JobIndex::new();
    idx.add(tsi(1), "Q", 10);
    idx.add(tsi(2), "Q", 20);
    let q = idx.intern("Q");
    let (priority, picked) = idx.pick_highest(&q).unwrap();
    assert_eq!(priority, 20);
    assert_eq!(picked, tsi(2));
}

#[test]
fn fifo_within_a_priority() {
    let idx = JobIndex::new();
    idx.add(tsi(1), "Q", 10);
    idx.add(tsi(2), "Q", 10);
    let q = idx.intern("Q");
    let (_, first) = idx.pick_highest(&q).unwrap();
    let (_, second) = idx.pick_highest(&q).unwrap();
    assert_eq!(first, tsi(1));
    assert_eq!(second, tsi(2));
}

#[test]
fn add_is_idempotent() {
    let idx = JobIndex::new();
    idx.add(tsi(1), "Q", 10);
    idx.add(tsi(1), "Q", 10);
    let q = idx.intern("Q");
    assert!(idx.pick_highest(&q).is_some());
    assert!(idx.pick_highest(&q).is_none(), "duplicate add must not double the bucket");
}

#[test]
fn a_tserver_can_appear_in_many_buckets_simultaneously() {
    let idx = JobIndex::new();
    idx.add(tsi(1), "Q1", 10);
    idx.add(tsi(1), "Q2", 5);
    let q1 = idx.intern("Q1");
    let q2 = idx.intern("Q2");
    assert_eq!(idx.pick_highest(&q1), Some((10, tsi(1))));
    assert_eq!(idx.pick_highest(&q2), Some((5, tsi(1))));
}

#[test]
fn remove_tserver_purges_every_bucket_it_appears_in() {
    let idx = JobIndex::new();
    idx.add(tsi(1), "Q1", 10);
    idx.add(tsi(1), "Q2", 5);
    idx.add(tsi(2), "Q1", 10);

    let removed = idx.remove_tserver(&tsi(1));
    assert_eq!(removed.len(), 2);

    let q1 = idx.intern("Q1");
    let q2 = idx.intern("Q2");
    assert_eq!(idx.pick_highest(&q2), None, "Q2 bucket should be pruned entirely");
    assert_eq!(idx.pick_highest(&q1), Some((10, tsi(2))), "Q1 still has tsi(2)");
}

#[test]
fn remove_tserver_on_unknown_tserver_is_a_no_op() {
    let idx = JobIndex::new();
    idx.add(tsi(1), "Q", 10);
    assert!(idx.remove_tserver(&tsi(99)).is_empty());
    let q = idx.intern("Q");
    assert!(idx.pick_highest(&q).is_some());
}

#[test]
fn no_empty_buckets_left_after_draining_a_queue() {
    let idx = JobIndex::new();
    idx.add(tsi(1), "Q", 10);
    let q = idx.intern("Q");
    idx.pick_highest(&q);
    let snap = idx.snapshot();
    assert_eq!(snap.queue_count, 0);
    assert_eq!(snap.advertisement_count, 0);
    assert_eq!(snap.tserver_count, 0);
    idx.assert_invariants();
}

#[test]
fn snapshot_counts_advertisements_across_queues_and_priorities() {
    let idx = JobIndex::new();
    idx.add(tsi(1), "Q1", 10);
    idx.add(tsi(2), "Q1", 10);
    idx.add(tsi(3), "Q2", 1);
    let snap = idx.snapshot();
    assert_eq!(snap.queue_count, 2);
    assert_eq!(snap.advertisement_count, 3);
    assert_eq!(snap.tserver_count, 3);
}

#[test]
fn interning_returns_the_same_handle_for_the_same_name() {
    let idx = JobIndex::new();
    let a = idx.intern("Q");
    let b = idx.intern("Q");
    assert_eq!(a, b);
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Clone, Debug)]
    enum Op {
        Add { tsi: u8, queue: u8, priority: i8 },
        PickHighest { queue: u8 },
        RemoveTserver { tsi: u8 },
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..4, 0u8..3, -3i8..3).prop_map(|(tsi, queue, priority)| Op::Add {
                tsi,
                queue,
                priority: priority as i8
            }),
            (0u8..3).prop_map(|queue| Op::PickHighest { queue }),
            (0u8..4).prop_map(|tsi| Op::RemoveTserver { tsi }),
        ]
    }

    proptest! {
        /// After any sequence of add/pickHighest/removeTserver, the
        /// forward/reverse bijection holds and no bucket is left empty.
        #[test]
        fn invariants_hold_after_any_operation_sequence(ops in proptest::collection::vec(op_strategy(), 0..200)) {
            let idx = JobIndex::new();
            for op in ops {
                match op {
                    Op::Add { tsi, queue, priority } => {
                        idx.add(
                            TabletServerId::new("h", tsi as u16, format!("tok-{tsi}")),
                            &format!("q{queue}"),
                            priority as i64,
                        );
                    }
                    Op::PickHighest { queue } => {
                        let q = idx.intern(&format!("q{queue}"));
                        idx.pick_highest(&q);
                    }
                    Op::RemoveTserver { tsi } => {
                        idx.remove_tserver(&TabletServerId::new("h", tsi as u16, format!("tok-{tsi}")));
                    }
                }
                idx.assert_invariants();
            }
        }

        /// pickHighest always returns the maximal non-empty priority.
        #[test]
        fn pick_highest_always_returns_the_max_priority(
            entries in proptest::collection::vec((0u16..10, -5i64..5), 1..20)
        ) {
            let idx = JobIndex::new();
            for (i, (tsi_n, priority)) in entries.iter().enumerate() {
                idx.add(TabletServerId::new("h", *tsi_n, format!("tok-{i}")), "Q", *priority);
            }
            let q = idx.intern("Q");
            let max_priority = entries.iter().map(|(_, p)| *p).max().unwrap();
            let (picked_priority, _) = idx.pick_highest(&q).unwrap();
            prop_assert_eq!(picked_priority, max_priority);
        }
    }
}
