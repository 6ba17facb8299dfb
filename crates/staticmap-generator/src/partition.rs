//! Fixed-capacity sharding.

use std::num::NonZeroUsize;

/// Number of shards `total` items occupy at `capacity` items per shard.
pub fn shard_count(total: usize, capacity: NonZeroUsize) -> usize {
    total.div_ceil(capacity.get())
}

/// Split items into consecutive shards of `capacity` items, the last one
/// possibly shorter. Order is preserved.
pub fn partition<T>(items: Vec<T>, capacity: NonZeroUsize) -> Vec<Vec<T>> {
    let capacity = capacity.get();
    let mut shards = Vec::with_capacity(items.len().div_ceil(capacity));
    let mut iter = items.into_iter().peekable();

    while iter.peek().is_some() {
        shards.push(iter.by_ref().take(capacity).collect());
    }

    shards
}
