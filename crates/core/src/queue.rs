// SPDX-License-Identifier: MIT

//! Queue names and the (queue, priority) scheduling key.

use std::fmt;
use std::sync::Arc;

/// An interned queue name.
///
/// Queue names arrive repeatedly from every poll cycle of every tablet
/// server; interning means a hot (queue, priority) bucket compares and
/// hashes an `Arc<str>` pointer-sized value instead of re-hashing the bytes
/// of the name on every lookup. Interning happens in [`crate::job_index::JobIndex`],
/// under the same mutex that guards the forward/reverse maps.
#[derive(Clone, Eq)]
pub struct QueueName(Arc<str>);

impl QueueName {
    /// Construct directly from an already-owned `Arc<str>`.
    ///
    /// Only [`crate::job_index::JobIndex`]'s interner should call this; everyone
    /// else should go through `JobIndex::intern`, which this type intentionally
    /// does not expose a public uninterned constructor for.
    pub(crate) fn from_arc(s: Arc<str>) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for QueueName {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl std::hash::Hash for QueueName {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Debug for QueueName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl fmt::Display for QueueName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl serde::Serialize for QueueName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

/// Deserializes to an uninterned `QueueName` — equality still works (it
/// falls back to string comparison when the `Arc` pointers differ), but a
/// value crossing the wire this way will never pointer-match one held by a
/// `JobIndex`. Fine for carrying a `JobDescriptor` through a response; only
/// `JobIndex::intern` produces the canonical, pointer-comparable handle.
impl<'de> serde::Deserialize<'de> for QueueName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(QueueName::from_arc(Arc::from(s)))
    }
}

/// A (queue, priority) pair: the scheduling key a tablet server advertises
/// into, and a compactor pulls against. Larger `priority` means more urgent.
#[derive(Clone, Eq, Debug)]
pub struct QueueAndPriority {
    pub queue: QueueName,
    pub priority: i64,
}

impl PartialEq for QueueAndPriority {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.queue == other.queue
    }
}

impl std::hash::Hash for QueueAndPriority {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.queue.hash(state);
        self.priority.hash(state);
    }
}

/// Priority ordering: higher priority sorts first. Used as the key of the
/// forward map's per-queue `BTreeMap` so `first_key_value()` yields the
/// highest-priority non-empty bucket.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Descending(pub i64);

impl From<i64> for Descending {
    fn from(p: i64) -> Self {
        Descending(-p)
    }
}

impl Descending {
    pub fn priority(self) -> i64 {
        -self.0
    }
}

impl fmt::Display for Descending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.priority())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job_index::JobIndex;

    #[test]
    fn queue_name_round_trips_through_json_by_value_not_identity() {
        let original = JobIndex::new().intern("Q");
        let json = serde_json::to_string(&original).unwrap();
        let restored: QueueName = serde_json::from_str(&json).unwrap();
        assert_eq!(original, restored, "equality falls back to string comparison across the wire");
    }

    #[test]
    fn descending_orders_highest_priority_first() {
        let mut v = vec![Descending::from(10), Descending::from(20), Descending::from(5)];
        v.sort();
        let priorities: Vec<i64> = v.into_iter().map(|d| d.priority()).collect();
        assert_eq!(priorities, vec![20, 10, 5]);
    }
}
