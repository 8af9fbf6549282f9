use {
    crate::domain::error::PipelineError,
    crate::domain::id::JobId,
    crate::domain::job::{Job, JobHandler, JobPayload},
    std::collections::{HashMap, VecDeque},
    std::sync::Arc,
    tokio::sync::{RwLock, mpsc, watch},
    tracing::Instrument,
};

/// A job handed from `enqueue` to the worker.
#[derive(Debug)]
pub struct QueuedJob {
    pub id: JobId,
    pub payload: JobPayload,
}

#[derive(Default)]
struct BoardInner {
    jobs: HashMap<JobId, Job>,
    // Insertion order, oldest first.
    order: VecDeque<JobId>,
}

impl BoardInner {
    /// Drops the oldest finished jobs until the board fits. Queued jobs and
    /// `keep`, the record just written, are never dropped.
    fn evict(&mut self, retention: usize, keep: &JobId) {
        while self.jobs.len() > retention {
            let jobs = &self.jobs;
            let Some(pos) = self.order.iter().position(|id| {
                id != keep && jobs.get(id).is_none_or(|job| job.status.is_terminal())
            }) else {
                break;
            };
            if let Some(id) = self.order.remove(pos) {
                self.jobs.remove(&id);
            }
        }
    }
}

/// Status records for every known job, capped at `retention` entries.
#[derive(Clone)]
pub struct JobBoard {
    inner: Arc<RwLock<BoardInner>>,
    retention: usize,
}

impl JobBoard {
    pub fn new(retention: usize) -> Self {
        Self {
            inner: Arc::default(),
            retention: retention.max(1),
        }
    }

    async fn insert_new(&self, job: Job) -> Result<(), PipelineError> {
        let mut inner = self.inner.write().await;
        if inner.jobs.contains_key(&job.id) {
            return Err(PipelineError::Conflict(format!("job {} already exists", job.id)));
        }
        let id = job.id.clone();
        inner.order.push_back(id.clone());
        inner.jobs.insert(id.clone(), job);
        inner.evict(self.retention, &id);
        Ok(())
    }

    /// Overwrites the record for `job.id`, inserting it if it was evicted.
    pub async fn set(&self, job: Job) {
        let mut inner = self.inner.write().await;
        let id = job.id.clone();
        if !inner.jobs.contains_key(&id) {
            inner.order.push_back(id.clone());
        }
        inner.jobs.insert(id.clone(), job);
        inner.evict(self.retention, &id);
    }

    pub async fn get(&self, id: &JobId) -> Option<Job> {
        self.inner.read().await.jobs.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.jobs.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Producer side of the job queue: a bounded FIFO plus the status board.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::Sender<QueuedJob>,
    board: JobBoard,
}

impl JobQueue {
    /// `retention` is raised above `capacity` when needed, so a full queue
    /// still leaves room for the record of the job it rejects.
    pub fn new(capacity: usize, retention: usize) -> (Self, mpsc::Receiver<QueuedJob>) {
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        let board = JobBoard::new(retention.max(capacity + 1));
        (Self { tx, board }, rx)
    }

    pub fn board(&self) -> JobBoard {
        self.board.clone()
    }

    /// Never waits for room: a full queue fails immediately and the job's
    /// status reads `error` from then on.
    pub async fn enqueue(
        &self,
        payload: JobPayload,
        id: Option<JobId>,
    ) -> Result<JobId, PipelineError> {
        let id = id.unwrap_or_else(JobId::generate);
        self.board.insert_new(Job::queued(id.clone(), &payload)).await?;

        let kind = payload.kind();
        let job = QueuedJob {
            id: id.clone(),
            payload,
        };
        let err = match self.tx.try_send(job) {
            Ok(()) => {
                tracing::info!(job_id = %id, kind, "job queued");
                return Ok(id);
            }
            Err(mpsc::error::TrySendError::Full(_)) => PipelineError::QueueFull,
            Err(mpsc::error::TrySendError::Closed(_)) => PipelineError::WorkerUnavailable,
        };

        tracing::warn!(job_id = %id, kind, error = %err, "job rejected");
        self.board.set(Job::failed(id, &err)).await;
        Err(err)
    }

    pub async fn get_job_status(&self, id: &str) -> Result<Job, PipelineError> {
        let id = JobId::new(id)?;
        self.board
            .get(&id)
            .await
            .ok_or_else(|| PipelineError::NotFound(format!("job {id}")))
    }
}

/// Single consumer: runs queued jobs one at a time in FIFO order.
pub async fn run_worker(
    mut rx: mpsc::Receiver<QueuedJob>,
    board: JobBoard,
    handler: Arc<dyn JobHandler>,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::info!("job worker started");

    loop {
        let job = tokio::select! {
            _ = shutdown.changed() => break,
            job = rx.recv() => match job {
                Some(job) => job,
                None => break,
            },
        };

        let span = tracing::info_span!("job", job_id = %job.id, kind = job.payload.kind());
        let record = run_one(&*handler, job).instrument(span).await;
        board.set(record).await;
    }

    // Jobs still buffered will never run; make that visible to pollers.
    rx.close();
    while let Some(job) = rx.recv().await {
        board
            .set(Job::failed(job.id, &PipelineError::WorkerUnavailable))
            .await;
    }

    tracing::info!("job worker shutting down");
}

async fn run_one(handler: &dyn JobHandler, job: QueuedJob) -> Job {
    let kind = job.payload.kind();
    match handler.handle(job.payload).await {
        Ok(data) => {
            tracing::info!("job done");
            Job::done(job.id, kind, data)
        }
        Err(e) => {
            tracing::warn!(error = %e, "job failed");
            Job::failed(job.id, &e)
        }
    }
}
