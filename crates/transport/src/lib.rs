//! # Transport
//!
//! Realizes the host's "Redistribute transport" and "Point-to-point
//! messaging" contracts (§6) as Rust traits, plus the three cross-peer
//! collectives built on top of them: global size lower bound (§4.8) and
//! the bloom/chunk-filter `globalExchange` (§4.2).
//!
//! This crate ships exactly one concrete implementation,
//! [`local::LocalTransport`]: an in-process, thread-based simulation of N
//! peers, meant for tests and the demo CLI. A real host supplies its own
//! implementation of [`Messenger`] + [`RedistributeTransport`] backed by
//! whatever network fabric it already has; the join core never opens a
//! socket itself (§1 Non-goals).

mod local;

pub use local::{build_cluster, LocalTransport};

use bloom::{BloomFilter, ChunkFilter};
use value::{JoinError, JoinResult, Tuple};

pub type InstanceId = usize;

/// Non-blocking send / blocking receive of opaque byte buffers (§6).
pub trait Messenger: Send + Sync {
    fn my_instance_id(&self) -> InstanceId;
    fn num_instances(&self) -> usize;
    fn send(&self, to: InstanceId, buf: Vec<u8>) -> JoinResult<()>;
    fn receive(&self, from: InstanceId) -> JoinResult<Vec<u8>>;
}

/// `replicate`/`shuffleByFirstDim` (§6). Both operate on already-tupled
/// rows: the core never hands the host raw array cells to redistribute,
/// only tuples it has already read and (for shuffle) hashed.
pub trait RedistributeTransport {
    /// Returns the same logical relation, fully replicated, on every peer.
    fn replicate(&self, local_rows: Vec<Tuple>) -> JoinResult<Vec<Tuple>>;

    /// `rows` are `(target_instance, tuple)` pairs; returns every tuple
    /// whose target is `self`.
    fn shuffle_by_first_dim(&self, rows: Vec<(InstanceId, Tuple)>) -> JoinResult<Vec<Tuple>>;
}

/// The combined contract the join core needs from one peer's transport.
pub trait PeerTransport: Messenger + RedistributeTransport {}
impl<T: Messenger + RedistributeTransport> PeerTransport for T {}

/// All-to-all sum: every peer sends its local lower-bound estimate (§4.8),
/// receives the other N-1, and returns the total. A global synchronization
/// point -- every peer must call this before any of them proceeds.
pub fn global_lower_bound(local: u64, messenger: &dyn Messenger) -> JoinResult<u64> {
    let me = messenger.my_instance_id();
    let n = messenger.num_instances();
    let payload = local.to_le_bytes().to_vec();
    for peer in 0..n {
        if peer != me {
            messenger.send(peer, payload.clone())?;
        }
    }
    let mut total = local;
    for peer in 0..n {
        if peer != me {
            let buf = messenger.receive(peer)?;
            let bytes: [u8; 8] = buf
                .try_into()
                .map_err(|_| JoinError::Invariant("malformed size-exchange payload".to_string()))?;
            total += u64::from_le_bytes(bytes);
        }
    }
    Ok(total)
}

/// Two-phase all-reduce for a [`BloomFilter`] (§4.2 `globalExchange`):
/// non-coordinators send their filter to `coordinator` and await the
/// merged result; the coordinator receives from every peer, ORs each into
/// its own, then broadcasts the union back. Peak memory on a
/// non-coordinator is two filters (its own plus the one merged result it
/// receives).
pub fn global_exchange_bloom(
    filter: &mut BloomFilter,
    coordinator: InstanceId,
    messenger: &dyn Messenger,
) -> JoinResult<()> {
    let me = messenger.my_instance_id();
    let n = messenger.num_instances();

    if me != coordinator {
        messenger.send(coordinator, filter.to_bytes())?;
        let merged = messenger.receive(coordinator)?;
        *filter = BloomFilter::from_bytes(&merged)?;
        return Ok(());
    }

    for peer in 0..n {
        if peer != me {
            let buf = messenger.receive(peer)?;
            let theirs = BloomFilter::from_bytes(&buf)?;
            filter.merge_from(&theirs)?;
        }
    }
    let merged_bytes = filter.to_bytes();
    for peer in 0..n {
        if peer != me {
            messenger.send(peer, merged_bytes.clone())?;
        }
    }
    Ok(())
}

/// Same two-phase all-reduce, for a [`ChunkFilter`]'s inner bloom.
pub fn global_exchange_chunk_filter(
    filter: &mut ChunkFilter,
    coordinator: InstanceId,
    messenger: &dyn Messenger,
) -> JoinResult<()> {
    let mut bloom = filter.bloom().clone();
    global_exchange_bloom(&mut bloom, coordinator, messenger)?;
    *filter.bloom_mut() = bloom;
    Ok(())
}
