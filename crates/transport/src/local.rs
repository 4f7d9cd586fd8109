//! An in-process [`LocalTransport`]: one OS thread per simulated peer,
//! messaging over an N×N matrix of `mpsc` channels, and replicate/shuffle
//! rounds synchronized by a shared, barrier-guarded staging area.
//!
//! Lets tests and the demo binary exercise the real shuffle/exchange code
//! paths without a real multi-host cluster.

use crate::{InstanceId, Messenger, RedistributeTransport};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Barrier, Mutex};
use value::{JoinError, JoinResult, Tuple};

struct Shared {
    num_instances: usize,
    /// `inboxes[from][to]` -- locked per-peer so `send` never blocks the
    /// caller and `receive` only blocks on the one channel it reads.
    senders: Vec<Vec<Sender<Vec<u8>>>>,
    receivers: Vec<Mutex<Vec<Option<Receiver<Vec<u8>>>>>>,
    /// Two barriers per round (fill, drain) so a peer can never race ahead
    /// into the next round's fill before every peer has drained this one.
    fill_barrier: Barrier,
    drain_barrier: Barrier,
    replicate_stage: Mutex<Vec<Vec<Tuple>>>,
    shuffle_stage: Mutex<Vec<Vec<Tuple>>>,
}

/// One peer's handle onto a simulated cluster. Cheap to clone-by-`Arc`;
/// hand one to each worker thread along with its `instance_id`.
pub struct LocalTransport {
    shared: Arc<Shared>,
    instance_id: InstanceId,
}

/// Builds `n` peer handles wired into the same simulated cluster. Typical
/// use: spawn one thread per handle, each running the join driver with
/// `instance_id = i`.
pub fn build_cluster(n: usize) -> Vec<LocalTransport> {
    assert!(n > 0, "a cluster needs at least one instance");

    let mut senders: Vec<Vec<Sender<Vec<u8>>>> = Vec::with_capacity(n);
    let mut receivers: Vec<Vec<Option<Receiver<Vec<u8>>>>> = (0..n).map(|_| Vec::with_capacity(n)).collect();

    for _from in 0..n {
        let mut row_senders = Vec::with_capacity(n);
        for to in 0..n {
            let (tx, rx) = std::sync::mpsc::channel::<Vec<u8>>();
            row_senders.push(tx);
            receivers[to].push(Some(rx));
        }
        senders.push(row_senders);
    }

    let shared = Arc::new(Shared {
        num_instances: n,
        senders,
        receivers: receivers.into_iter().map(Mutex::new).collect(),
        fill_barrier: Barrier::new(n),
        drain_barrier: Barrier::new(n),
        replicate_stage: Mutex::new(vec![Vec::new(); n]),
        shuffle_stage: Mutex::new(vec![Vec::new(); n]),
    });

    (0..n).map(|i| LocalTransport { shared: Arc::clone(&shared), instance_id: i }).collect()
}

impl Messenger for LocalTransport {
    fn my_instance_id(&self) -> InstanceId {
        self.instance_id
    }

    fn num_instances(&self) -> usize {
        self.shared.num_instances
    }

    fn send(&self, to: InstanceId, buf: Vec<u8>) -> JoinResult<()> {
        self.shared.senders[self.instance_id][to]
            .send(buf)
            .map_err(|_| JoinError::Invariant("peer channel closed".to_string()))
    }

    fn receive(&self, from: InstanceId) -> JoinResult<Vec<u8>> {
        let rx = self.shared.receivers[self.instance_id]
            .lock()
            .expect("receivers mutex poisoned")[from]
            .take()
            .ok_or_else(|| JoinError::Invariant("receive called twice for the same sender".to_string()))?;
        let buf = rx
            .recv()
            .map_err(|_| JoinError::Invariant("peer channel closed before sending".to_string()))?;
        self.shared.receivers[self.instance_id].lock().expect("receivers mutex poisoned")[from] = Some(rx);
        Ok(buf)
    }
}

impl RedistributeTransport for LocalTransport {
    /// Fill phase: stage `local_rows` at `self`'s slot. Drain phase: every
    /// peer reads every slot and concatenates. The two barriers bracket the
    /// round so no peer can start restaging for a *later* call before all
    /// peers have read this round's data.
    fn replicate(&self, local_rows: Vec<Tuple>) -> JoinResult<Vec<Tuple>> {
        {
            let mut stage = self.shared.replicate_stage.lock().expect("replicate stage poisoned");
            stage[self.instance_id] = local_rows;
        }
        self.shared.fill_barrier.wait();

        let result = {
            let stage = self.shared.replicate_stage.lock().expect("replicate stage poisoned");
            stage.iter().flat_map(|rows| rows.iter().cloned()).collect()
        };
        self.shared.drain_barrier.wait();
        Ok(result)
    }

    /// Fill phase: every peer appends each of its rows into the target
    /// peer's slot. Drain phase: each peer takes (and clears) its own slot.
    fn shuffle_by_first_dim(&self, rows: Vec<(InstanceId, Tuple)>) -> JoinResult<Vec<Tuple>> {
        {
            let mut stage = self.shared.shuffle_stage.lock().expect("shuffle stage poisoned");
            for (to, tuple) in rows {
                stage[to].push(tuple);
            }
        }
        self.shared.fill_barrier.wait();

        let mine = {
            let mut stage = self.shared.shuffle_stage.lock().expect("shuffle stage poisoned");
            std::mem::take(&mut stage[self.instance_id])
        };
        self.shared.drain_barrier.wait();
        Ok(mine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use value::Value;

    #[test]
    fn replicate_delivers_union_to_every_peer() {
        let cluster = build_cluster(3);
        let handles: Vec<_> = cluster
            .into_iter()
            .enumerate()
            .map(|(i, t)| std::thread::spawn(move || t.replicate(vec![vec![Value::Int32(i as i32)]]).unwrap()))
            .collect();
        let results: Vec<Vec<Tuple>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for r in &results {
            assert_eq!(r.len(), 3);
        }
    }

    #[test]
    fn shuffle_routes_rows_to_their_target() {
        let cluster = build_cluster(2);
        let handles: Vec<_> = cluster
            .into_iter()
            .enumerate()
            .map(|(i, t)| {
                std::thread::spawn(move || {
                    // Every peer sends one row to peer 0.
                    let rows = vec![(0usize, vec![Value::Int32(i as i32)])];
                    t.shuffle_by_first_dim(rows).unwrap()
                })
            })
            .collect();
        let results: Vec<Vec<Tuple>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results[0].len(), 2);
        assert_eq!(results[1].len(), 0);
    }

    #[test]
    fn repeated_rounds_do_not_corrupt_each_other() {
        let cluster = build_cluster(2);
        let handles: Vec<_> = cluster
            .into_iter()
            .map(|t| {
                std::thread::spawn(move || {
                    let first = t.replicate(vec![vec![Value::Int32(1)]]).unwrap();
                    let second = t.replicate(vec![vec![Value::Int32(2)]]).unwrap();
                    (first.len(), second.len())
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), (2, 2));
        }
    }
}
