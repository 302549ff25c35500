//! Scatter-gather execution of filter sub-queries
//!
//! Every sub-query is spawned onto the runtime before any result is awaited.
//! Each task applies the per-query timeout itself, starting when the query
//! begins executing (after any concurrency permit is granted), and drops the
//! executor future once the timeout elapses. Outcomes are collected in
//! generation order, so one slow dimension cannot hold the others hostage.
//! Without a concurrency limit the whole gather is bounded by roughly one
//! timeout.
//!
//! Cancellation of the context's shutdown token aborts the gather: the
//! dimension being awaited is recorded as [`QueryOutcome::Interrupted`] and
//! every task not yet collected is aborted. Dropping the gather future
//! aborts every task still pending as well.

mod telemetry;

use crate::config::FilterConfig;
use crate::query::{QueryExecutor, QueryResponse, SubQuery};
use crate::{Error, Result};

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Result of a single sub-query
#[derive(Debug, Clone)]
pub enum QueryOutcome {
    Success(QueryResponse),
    /// The data source reported an error, or the task panicked
    ExecutionFailure(String),
    /// No answer within the configured timeout
    Timeout(Duration),
    /// The gather was cancelled while waiting on this query
    Interrupted,
}

impl QueryOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::ExecutionFailure(_) => "execution_failure",
            Self::Timeout(_) => "timeout",
            Self::Interrupted => "interrupted",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Lifecycle of one gather call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatherState {
    Running,
    /// Every sub-query produced an outcome
    Completed,
    /// Cancelled before every outcome was collected
    Aborted,
}

impl GatherState {
    /// `Running → Completed`; terminal states are unchanged
    pub fn complete(self) -> Self {
        match self {
            Self::Running => Self::Completed,
            terminal => terminal,
        }
    }

    /// `Running → Aborted`; terminal states are unchanged
    pub fn abort(self) -> Self {
        match self {
            Self::Running => Self::Aborted,
            terminal => terminal,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// An outcome attributed to the dimension that produced it
#[derive(Debug, Clone)]
pub struct DimensionOutcome {
    pub dimension: String,
    pub outcome: QueryOutcome,
}

/// Everything collected by one gather call
#[derive(Debug, Clone)]
pub struct GatherReport {
    /// Outcomes in generation order
    pub outcomes: Vec<DimensionOutcome>,
    pub state: GatherState,
    /// Dimensions whose outcome was never awaited (aborted gathers only)
    pub uncollected: Vec<String>,
}

impl GatherReport {
    pub fn is_complete(&self) -> bool {
        self.state == GatherState::Completed
    }

    pub fn outcome(&self, dimension: &str) -> Option<&QueryOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.dimension == dimension)
            .map(|o| &o.outcome)
    }
}

/// Execution resources for gather calls, owned by the caller
///
/// Clones share the executor, the concurrency limiter and the shutdown
/// token, so one context can be created at startup and handed to every
/// lookup.
#[derive(Clone)]
pub struct ExecutionContext {
    executor: Arc<dyn QueryExecutor>,
    per_query_timeout: Duration,
    limiter: Option<Arc<Semaphore>>,
    shutdown: CancellationToken,
}

impl ExecutionContext {
    pub fn new(executor: Arc<dyn QueryExecutor>, per_query_timeout: Duration) -> Self {
        Self {
            executor,
            per_query_timeout,
            limiter: None,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn from_config(executor: Arc<dyn QueryExecutor>, config: &FilterConfig) -> Self {
        let ctx = Self::new(executor, config.per_query_timeout);
        match config.max_concurrency {
            Some(limit) => ctx.with_max_concurrency(limit),
            None => ctx,
        }
    }

    /// Bound the number of sub-queries in flight. Zero means unbounded.
    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.limiter = (limit > 0).then(|| Arc::new(Semaphore::new(limit)));
        self
    }

    /// Use an externally owned shutdown token
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Token whose cancellation interrupts in-progress gathers
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn per_query_timeout(&self) -> Duration {
        self.per_query_timeout
    }

    pub fn executor(&self) -> &Arc<dyn QueryExecutor> {
        &self.executor
    }
}

/// `None` when the query did not finish within the per-query timeout
type TaskOutput = Option<Result<QueryResponse>>;

/// Aborts the task when dropped. A bare `JoinHandle` detaches on drop.
struct AbortOnDrop(JoinHandle<TaskOutput>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

struct PendingQuery {
    dimension: String,
    task: AbortOnDrop,
}

/// Scatter-gather executor for filter sub-queries
pub struct ScatterGather {
    ctx: ExecutionContext,
}

impl ScatterGather {
    pub fn new(ctx: ExecutionContext) -> Self {
        Self { ctx }
    }

    /// Run every query concurrently and collect one outcome per query.
    ///
    /// `dataset` is used for log context only.
    pub async fn gather(&self, dataset: &str, queries: &[SubQuery]) -> GatherReport {
        let started = Instant::now();
        let timeout = self.ctx.per_query_timeout;

        let mut pending: VecDeque<PendingQuery> =
            queries.iter().map(|query| self.spawn(query)).collect();

        debug!(
            "Dispatched {} filter queries for dataset '{}'",
            pending.len(),
            dataset
        );

        let mut state = GatherState::Running;
        let mut outcomes = Vec::with_capacity(pending.len());

        while let Some(PendingQuery {
            dimension,
            mut task,
        }) = pending.pop_front()
        {
            let waited = tokio::select! {
                biased;
                joined = &mut task.0 => Some(joined),
                _ = self.ctx.shutdown.cancelled() => None,
            };

            let outcome = match waited {
                Some(Ok(Some(Ok(response)))) => QueryOutcome::Success(response),
                Some(Ok(Some(Err(e)))) => {
                    error!(
                        dataset = %dataset,
                        dimension = %dimension,
                        error = %e,
                        "Execution error when getting filter"
                    );
                    QueryOutcome::ExecutionFailure(e.to_string())
                }
                Some(Ok(None)) => {
                    warn!(
                        dataset = %dataset,
                        dimension = %dimension,
                        timeout_ms = timeout.as_millis() as u64,
                        "Time out when getting filter"
                    );
                    QueryOutcome::Timeout(timeout)
                }
                Some(Err(join_error)) => {
                    error!(
                        dataset = %dataset,
                        dimension = %dimension,
                        error = %join_error,
                        "Filter query task failed"
                    );
                    QueryOutcome::ExecutionFailure(format!("task failed: {join_error}"))
                }
                None => {
                    warn!(
                        dataset = %dataset,
                        dimension = %dimension,
                        "Execution is interrupted when getting filter"
                    );
                    drop(task);
                    telemetry::record_outcome(QueryOutcome::Interrupted.label());
                    outcomes.push(DimensionOutcome {
                        dimension,
                        outcome: QueryOutcome::Interrupted,
                    });
                    state = state.abort();
                    break;
                }
            };

            telemetry::record_outcome(outcome.label());
            outcomes.push(DimensionOutcome { dimension, outcome });
        }

        // Dropping the remaining guards aborts their tasks
        let uncollected: Vec<String> = pending.into_iter().map(|p| p.dimension).collect();

        let state = state.complete();
        telemetry::record_gather(state, started.elapsed().as_secs_f64());

        GatherReport {
            outcomes,
            state,
            uncollected,
        }
    }

    fn spawn(&self, query: &SubQuery) -> PendingQuery {
        let executor = Arc::clone(&self.ctx.executor);
        let limiter = self.ctx.limiter.clone();
        let dimension = query.group_by.clone();
        let query = query.clone();

        let timeout = self.ctx.per_query_timeout;
        let handle = tokio::spawn(async move {
            let _permit = match limiter {
                Some(limiter) => match limiter.acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(e) => {
                        return Some(Err(Error::Internal(format!(
                            "concurrency limiter closed: {e}"
                        ))))
                    }
                },
                None => None,
            };
            // The timeout starts once the permit is held, so queueing behind
            // the limiter never turns into a timeout.
            tokio::time::timeout(timeout, executor.execute(&query))
                .await
                .ok()
        });

        PendingQuery {
            dimension,
            task: AbortOnDrop(handle),
        }
    }
}
