//! Worker pool coordination: registration, the pending-job queue and
//! dispatch.
//!
//! All methods are synchronous state transitions; the returned [`Outbound`]
//! publishes are performed by the caller once the mutation is done. Between
//! those publishes other handlers may run, so nothing here assumes it will
//! observe the transport side effects of its own return value.

use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};

use skiff_types::{Account, BlockHash, Timestamp, WalletId, WorkNonce};

use crate::outbound::Outbound;

/// A proof-of-work request from a wallet, keyed by block hash.
#[derive(Clone, Debug)]
pub struct Job {
    pub hash: BlockHash,
    pub wallet: WalletId,
    pub account: Account,
    pub received_at: Timestamp,
    pub dispatched_at: Option<Timestamp>,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub result: Option<WorkNonce>,
}

impl Job {
    pub fn new(hash: BlockHash, wallet: WalletId, account: Account, now: Timestamp) -> Self {
        Self {
            hash,
            wallet,
            account,
            received_at: now,
            dispatched_at: None,
            started_at: None,
            completed_at: None,
            result: None,
        }
    }
}

/// One compute worker. The entry survives unregistration so registration
/// history is inspectable; only `online` flips.
#[derive(Clone, Debug)]
pub struct Worker {
    pub id: String,
    pub online: bool,
    pub assigned: Option<Job>,
    pub registered_at: Timestamp,
    pub meta: Value,
}

/// Tracks compute workers and the FIFO queue of jobs awaiting dispatch.
///
/// Invariants: a worker holds at most one job; a queued job belongs to no
/// worker. A job with no eligible worker stays queued until the next
/// dispatch trigger — there is no expiry.
pub struct WorkerPool {
    workers: HashMap<String, Worker>,
    queue: VecDeque<Job>,
}

impl WorkerPool {
    pub fn new() -> Self {
        Self {
            workers: HashMap::new(),
            queue: VecDeque::new(),
        }
    }

    /// Insert or refresh a worker entry and mark it online.
    pub fn register_worker(&mut self, id: &str, meta: Value, now: Timestamp) {
        match self.workers.get_mut(id) {
            Some(worker) => {
                worker.online = true;
                worker.meta = meta;
                tracing::info!(worker = id, "worker re-registered");
            }
            None => {
                self.workers.insert(
                    id.to_string(),
                    Worker {
                        id: id.to_string(),
                        online: true,
                        assigned: None,
                        registered_at: now,
                        meta,
                    },
                );
                tracing::info!(worker = id, "worker registered");
            }
        }
    }

    /// Mark a worker offline, keeping its entry.
    pub fn unregister_worker(&mut self, id: &str, meta: Value) {
        match self.workers.get_mut(id) {
            Some(worker) => {
                worker.online = false;
                worker.meta = meta;
                tracing::info!(worker = id, "worker unregistered");
            }
            None => {
                tracing::error!(worker = id, "unregister for unknown worker dropped");
            }
        }
    }

    /// Stamp the assigned job's start time.
    pub fn mark_working(&mut self, id: &str, now: Timestamp) {
        let job = self.workers.get_mut(id).and_then(|w| w.assigned.as_mut());
        match job {
            Some(job) => {
                job.started_at = Some(now);
                tracing::debug!(worker = id, hash = %job.hash, "worker started on job");
            }
            None => {
                tracing::error!(worker = id, "working signal without an assigned job dropped");
            }
        }
    }

    /// Append a job to the queue and immediately attempt dispatch.
    pub fn enqueue_job(&mut self, job: Job, now: Timestamp) -> Option<Outbound> {
        tracing::debug!(hash = %job.hash, wallet = %job.wallet, "job queued");
        self.queue.push_back(job);
        self.dispatch(now)
    }

    /// Hand the oldest queued job to the first online, unassigned worker.
    ///
    /// Selection is arbitrary among eligible workers — each carries at most
    /// one job, so there is nothing to rank. Returns the job-request publish
    /// for that worker, or `None` when the queue is empty or no worker is
    /// eligible (the job just stays queued).
    pub fn dispatch(&mut self, now: Timestamp) -> Option<Outbound> {
        if self.queue.is_empty() {
            return None;
        }
        let worker_id = self
            .workers
            .values()
            .find(|w| w.online && w.assigned.is_none())
            .map(|w| w.id.clone())?;
        let mut job = self.queue.pop_front()?;

        job.dispatched_at = Some(now);
        let topic = format!("worker/{worker_id}/request");
        let payload = json!({ "hash": job.hash });
        tracing::info!(worker = %worker_id, hash = %job.hash, "job dispatched");

        if let Some(worker) = self.workers.get_mut(&worker_id) {
            worker.assigned = Some(job);
        }
        Some(Outbound::new(topic, payload))
    }

    /// Complete a worker's assigned job and relay the answer to the wallet
    /// that requested it, then drain the queue again.
    pub fn submit_answer(&mut self, id: &str, result: WorkNonce, now: Timestamp) -> Vec<Outbound> {
        let Some(worker) = self.workers.get_mut(id) else {
            tracing::error!(worker = id, "answer from unknown worker dropped");
            return Vec::new();
        };
        let Some(mut job) = worker.assigned.take() else {
            tracing::error!(worker = id, "answer without an assigned job dropped");
            return Vec::new();
        };

        job.completed_at = Some(now);
        job.result = Some(result);
        // Workers that never sent a working signal fall back to dispatch time.
        let started = job
            .started_at
            .or(job.dispatched_at)
            .unwrap_or(job.received_at);
        let elapsed = started.elapsed_since(now);
        tracing::info!(
            worker = id,
            hash = %job.hash,
            wallet = %job.wallet,
            elapsed_ms = elapsed,
            "work answer relayed"
        );

        let answer = Outbound::new(
            format!("wallet/{}/work", job.wallet),
            json!({
                "hash": job.hash,
                "work": result,
                "time": elapsed,
                "account": job.account,
            }),
        );

        let mut outbound = vec![answer];
        outbound.extend(self.dispatch(now));
        outbound
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn online_workers(&self) -> usize {
        self.workers.values().filter(|w| w.online).count()
    }

    pub fn worker(&self, id: &str) -> Option<&Worker> {
        self.workers.get(id)
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn hash(byte: u8) -> BlockHash {
        BlockHash::new([byte; 32])
    }

    fn job(byte: u8, now: Timestamp) -> Job {
        Job::new(
            hash(byte),
            WalletId::new(format!("wallet-{byte}")),
            Account::new(format!("acc_{byte}")),
            now,
        )
    }

    #[test]
    fn enqueue_dispatches_to_free_worker() {
        let mut pool = WorkerPool::new();
        let now = Timestamp::new(1_000);
        pool.register_worker("w1", json!({}), now);

        let out = pool.enqueue_job(job(1, now), now).expect("dispatched");
        assert_eq!(out.topic, "worker/w1/request");
        assert_eq!(out.payload["hash"], json!(hash(1).to_hex()));
        assert_eq!(pool.queue_len(), 0);
        assert!(pool.worker("w1").unwrap().assigned.is_some());
    }

    #[test]
    fn job_waits_when_no_worker_is_free() {
        let mut pool = WorkerPool::new();
        let now = Timestamp::new(1_000);

        assert!(pool.enqueue_job(job(1, now), now).is_none());
        assert_eq!(pool.queue_len(), 1);
    }

    #[test]
    fn queued_job_is_assigned_on_next_trigger() {
        let mut pool = WorkerPool::new();
        let now = Timestamp::new(1_000);

        assert!(pool.enqueue_job(job(1, now), now).is_none());
        pool.register_worker("w1", json!({}), now);

        let out = pool.dispatch(now).expect("dispatched after worker freed up");
        assert_eq!(out.topic, "worker/w1/request");
        assert_eq!(pool.queue_len(), 0);
    }

    #[test]
    fn busy_worker_is_not_double_assigned() {
        let mut pool = WorkerPool::new();
        let now = Timestamp::new(1_000);
        pool.register_worker("w1", json!({}), now);

        assert!(pool.enqueue_job(job(1, now), now).is_some());
        assert!(pool.enqueue_job(job(2, now), now).is_none());
        assert_eq!(pool.queue_len(), 1);
    }

    #[test]
    fn offline_worker_is_not_assigned() {
        let mut pool = WorkerPool::new();
        let now = Timestamp::new(1_000);
        pool.register_worker("w1", json!({}), now);
        pool.unregister_worker("w1", json!({}));

        assert!(pool.enqueue_job(job(1, now), now).is_none());
        assert!(pool.worker("w1").unwrap().assigned.is_none());
    }

    #[test]
    fn unregister_keeps_the_entry() {
        let mut pool = WorkerPool::new();
        let now = Timestamp::new(1_000);
        pool.register_worker("w1", json!({"cores": 8}), now);
        pool.unregister_worker("w1", json!({"cores": 8, "reason": "shutdown"}));

        let worker = pool.worker("w1").expect("entry retained");
        assert!(!worker.online);
        assert_eq!(worker.meta["reason"], json!("shutdown"));
    }

    #[test]
    fn answer_relays_work_and_redispatches() {
        let mut pool = WorkerPool::new();
        pool.register_worker("w1", json!({}), Timestamp::new(0));

        pool.enqueue_job(job(1, Timestamp::new(1_000)), Timestamp::new(1_000));
        pool.mark_working("w1", Timestamp::new(1_200));
        pool.enqueue_job(job(2, Timestamp::new(1_300)), Timestamp::new(1_300));

        let outbound = pool.submit_answer("w1", WorkNonce(0xFEED), Timestamp::new(4_200));
        assert_eq!(outbound.len(), 2, "answer plus the next dispatch");

        let answer = &outbound[0];
        assert_eq!(answer.topic, "wallet/wallet-1/work");
        assert_eq!(answer.payload["hash"], json!(hash(1).to_hex()));
        assert_eq!(answer.payload["work"], json!(WorkNonce(0xFEED).to_hex()));
        assert_eq!(answer.payload["time"], json!(3_000));
        assert_eq!(answer.payload["account"], json!("acc_1"));

        assert_eq!(outbound[1].topic, "worker/w1/request");
        assert_eq!(pool.queue_len(), 0);
    }

    #[test]
    fn answer_without_assignment_is_dropped() {
        let mut pool = WorkerPool::new();
        pool.register_worker("w1", json!({}), Timestamp::new(0));

        assert!(pool
            .submit_answer("w1", WorkNonce(1), Timestamp::new(10))
            .is_empty());
        assert!(pool
            .submit_answer("ghost", WorkNonce(1), Timestamp::new(10))
            .is_empty());
    }

    #[test]
    fn working_without_assignment_is_dropped() {
        let mut pool = WorkerPool::new();
        pool.register_worker("w1", json!({}), Timestamp::new(0));
        pool.mark_working("w1", Timestamp::new(10));
        assert!(pool.worker("w1").unwrap().assigned.is_none());
    }

    #[test]
    fn re_registration_clears_nothing() {
        let mut pool = WorkerPool::new();
        let now = Timestamp::new(0);
        pool.register_worker("w1", json!({}), now);
        pool.enqueue_job(job(1, now), now);

        // A worker that reconnects mid-job keeps its assignment.
        pool.register_worker("w1", json!({"restarted": true}), Timestamp::new(50));
        assert!(pool.worker("w1").unwrap().assigned.is_some());
    }

    /// One step of a random operation sequence against the pool.
    #[derive(Clone, Debug)]
    enum Op {
        Register(u8),
        Unregister(u8),
        Enqueue(u8),
        Answer(u8),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..4).prop_map(Op::Register),
            (0u8..4).prop_map(Op::Unregister),
            any::<u8>().prop_map(Op::Enqueue),
            (0u8..4).prop_map(Op::Answer),
        ]
    }

    proptest! {
        /// Under any operation sequence, no worker ever holds more than one
        /// job, and dispatch never targets an offline or busy worker.
        #[test]
        fn assignment_invariants_hold(ops in proptest::collection::vec(op_strategy(), 1..64)) {
            let mut pool = WorkerPool::new();
            let mut assigned_before: HashMap<String, BlockHash> = HashMap::new();

            for (step, op) in ops.into_iter().enumerate() {
                let now = Timestamp::new(step as u64);
                match op {
                    Op::Register(n) => pool.register_worker(&format!("w{n}"), json!({}), now),
                    Op::Unregister(n) => pool.unregister_worker(&format!("w{n}"), json!({})),
                    Op::Enqueue(b) => { pool.enqueue_job(job(b, now), now); }
                    Op::Answer(n) => { pool.submit_answer(&format!("w{n}"), WorkNonce(step as u64), now); }
                }

                for n in 0u8..4 {
                    let id = format!("w{n}");
                    if let Some(worker) = pool.worker(&id) {
                        // A newly appearing assignment must go to an online worker.
                        if let Some(job) = &worker.assigned {
                            let is_new = assigned_before.get(&id) != Some(&job.hash);
                            if is_new {
                                prop_assert!(worker.online, "job assigned to offline worker");
                            }
                            assigned_before.insert(id, job.hash);
                        } else {
                            assigned_before.remove(&id);
                        }
                    }
                }
            }
        }

        /// Jobs are never lost: everything enqueued is either still queued
        /// or held by exactly one worker or already answered.
        #[test]
        fn jobs_are_conserved(count in 1usize..20) {
            let mut pool = WorkerPool::new();
            let now = Timestamp::new(0);
            pool.register_worker("w1", json!({}), now);

            for i in 0..count {
                pool.enqueue_job(job(i as u8, now), now);
            }

            let held = usize::from(pool.worker("w1").unwrap().assigned.is_some());
            prop_assert_eq!(pool.queue_len() + held, count);
        }
    }
}
