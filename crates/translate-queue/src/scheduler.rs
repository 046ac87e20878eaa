use std::collections::{HashSet, VecDeque};

use pipeline_ids::IdGenerator;
use pipeline_types::{JobId, JobKind, Priority, TranslationJob};

use crate::config::QueueConfig;
use crate::error::QueueError;
use crate::request::{EnqueueRequest, LinkedId};

pub type Key = (JobKind, LinkedId);

fn level_index(priority: Priority) -> usize {
    match priority {
        Priority::Low => 0,
        Priority::Normal => 1,
        Priority::High => 2,
    }
}

fn promote(priority: Priority) -> Priority {
    match priority {
        Priority::Low => Priority::Normal,
        Priority::Normal | Priority::High => Priority::High,
    }
}

pub(crate) struct QueuedJob {
    pub job: TranslationJob,
    pub linked_id: LinkedId,
}

/// Strict-priority FIFO scheduler with starvation promotion and at-most-one-
/// active-per-key dispatch (§4.5). Locked behind a single mutex in
/// [`crate::TranslateQueue`]; all mutation happens synchronously, so no
/// await point is ever held with the lock taken.
pub(crate) struct SchedulerState {
    config: QueueConfig,
    queues: [VecDeque<QueuedJob>; 3],
    queued_keys: HashSet<Key>,
    active_keys: HashSet<Key>,
    id_gen: Box<dyn IdGenerator>,
}

impl SchedulerState {
    pub(crate) fn new(config: QueueConfig, id_gen: Box<dyn IdGenerator>) -> Self {
        Self {
            config,
            queues: [VecDeque::new(), VecDeque::new(), VecDeque::new()],
            queued_keys: HashSet::new(),
            active_keys: HashSet::new(),
            id_gen,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.queues.iter().map(VecDeque::len).sum::<usize>() + self.active_keys.len()
    }

    pub(crate) fn active_count(&self) -> usize {
        self.active_keys.len()
    }

    /// Enqueues a new job, minting its id. A second enqueue that shares a
    /// `(kind, linked_id)` key with a job still sitting in a queue replaces
    /// it in place rather than growing the queue (§4.5); a job already
    /// dispatched is left running untouched.
    pub(crate) fn enqueue(
        &mut self,
        request: EnqueueRequest,
        now_ms: i64,
    ) -> Result<TranslationJob, QueueError> {
        let key: Key = (request.kind, request.linked_id.clone());

        if !self.queued_keys.contains(&key) && self.len() >= self.config.max_queue {
            return Err(QueueError::QueueFull {
                queued_and_active: self.len(),
                max_queue: self.config.max_queue,
            });
        }

        self.remove_queued(&key);

        let job = TranslationJob {
            id: JobId::from(self.id_gen.next_id()),
            kind: request.kind,
            priority: request.priority,
            source_text: request.source_text,
            source_lang: request.source_lang,
            target_lang: request.target_lang,
            enqueued_ts: now_ms,
            deadline_ts: None,
            correlation_id: request.correlation_id,
        };

        self.queued_keys.insert(key);
        self.queues[level_index(request.priority)]
            .push_back(QueuedJob { job: job.clone(), linked_id: request.linked_id });

        Ok(job)
    }

    fn remove_queued(&mut self, key: &Key) {
        if !self.queued_keys.remove(key) {
            return;
        }
        for queue in &mut self.queues {
            if let Some(pos) = queue.iter().position(|qj| &(qj.job.kind, qj.linked_id.clone()) == key) {
                queue.remove(pos);
                break;
            }
        }
    }

    /// Promotes jobs older than `max_wait_ms` one priority level, then picks
    /// the oldest job in the highest non-empty level whose key isn't
    /// already dispatched. Marks the chosen key active before returning it.
    pub(crate) fn pick_next(&mut self, now_ms: i64) -> Option<(TranslationJob, LinkedId)> {
        self.promote_aged(now_ms);

        for level in (0..3).rev() {
            let pos = self.queues[level]
                .iter()
                .position(|qj| !self.active_keys.contains(&(qj.job.kind, qj.linked_id.clone())));

            if let Some(pos) = pos {
                let picked = self.queues[level].remove(pos).unwrap();
                let key = (picked.job.kind, picked.linked_id.clone());
                self.queued_keys.remove(&key);
                self.active_keys.insert(key);
                return Some((picked.job, picked.linked_id));
            }
        }

        None
    }

    fn promote_aged(&mut self, now_ms: i64) {
        // Highest source level first so a job promoted from Low into Normal
        // this pass doesn't also jump straight to High in the same pass.
        for level in (0..2).rev() {
            let mut i = 0;
            while i < self.queues[level].len() {
                let age = now_ms - self.queues[level][i].job.enqueued_ts;
                if age >= self.config.max_wait_ms {
                    let mut queued = self.queues[level].remove(i).unwrap();
                    queued.job.priority = promote(queued.job.priority);
                    self.queues[level + 1].push_back(queued);
                } else {
                    i += 1;
                }
            }
        }
    }

    pub(crate) fn finish(&mut self, key: &Key) {
        self.active_keys.remove(key);
    }
}
