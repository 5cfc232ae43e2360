//! Execution bridge: runs agent turns on an isolated async runtime.
//!
//! The bridge owns a worker thread driving its own current-thread tokio
//! runtime. Callers hand turns over a channel and wait for the reply, either
//! by blocking ([`ExecutionBridge::run_turn`]) or by awaiting
//! ([`ExecutionBridge::run_turn_async`]). Because the worker's runtime is never
//! the caller's, the blocking path is safe from plain threads and from inside
//! a running tokio runtime alike.
//!
//! ```no_run
//! use std::sync::Arc;
//! use parlor::agent::build_agent;
//! use parlor::bridge::ExecutionBridge;
//! use parlor::config::ChatConfig;
//! use parlor::provider::create_provider;
//! use parlor::runtime::ModelRuntime;
//! use parlor::session::{SessionId, SessionRegistry};
//!
//! # fn main() -> parlor::error::Result<()> {
//! let config = ChatConfig::from_env();
//! let runtime = Arc::new(ModelRuntime::new(create_provider(&config)?));
//! let bridge = ExecutionBridge::new(runtime)?;
//! let agent = Arc::new(build_agent("Assistant", "Be brief.", config.model(), Vec::new())?);
//! let session = SessionRegistry::in_memory().get_or_create(&SessionId::generate())?;
//! let reply = bridge.run_turn(&agent, "Hello!", &session)?;
//! println!("{reply}");
//! # Ok(())
//! # }
//! ```

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::agent::AgentDefinition;
use crate::config::DEFAULT_TURN_TIMEOUT;
use crate::error::{ChatError, Result};
use crate::runtime::{AgentRuntime, RunResult};
use crate::session::SessionHandle;
use crate::util::timeout::with_timeout;

type Job = BoxFuture<'static, ()>;

/// Submits turns to an [`AgentRuntime`] on a dedicated worker thread.
pub struct ExecutionBridge {
    runtime: Arc<dyn AgentRuntime>,
    turn_timeout: Duration,
    jobs: Option<mpsc::UnboundedSender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl ExecutionBridge {
    /// Start the worker thread and its runtime.
    pub fn new(runtime: Arc<dyn AgentRuntime>) -> Result<Self> {
        let scheduler = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let (jobs, rx) = mpsc::unbounded_channel::<Job>();

        let worker = std::thread::Builder::new()
            .name("parlor-bridge".into())
            .spawn(move || {
                debug!("bridge worker started");
                scheduler.block_on(drive(rx));
                debug!("bridge worker stopped");
            })?;

        Ok(Self {
            runtime,
            turn_timeout: DEFAULT_TURN_TIMEOUT,
            jobs: Some(jobs),
            worker: Some(worker),
        })
    }

    /// Bound each turn; an expired turn fails with [`ChatError::Timeout`].
    pub fn with_turn_timeout(mut self, timeout: Duration) -> Self {
        self.turn_timeout = timeout;
        self
    }

    pub fn turn_timeout(&self) -> Duration {
        self.turn_timeout
    }

    /// Run one turn and block the calling thread until it finishes.
    pub fn run_turn(
        &self,
        agent: &Arc<AgentDefinition>,
        prompt: &str,
        session: &Arc<SessionHandle>,
    ) -> Result<String> {
        self.run(agent, prompt, session).map(|r| r.final_output)
    }

    /// Await one turn without blocking the caller's runtime.
    pub async fn run_turn_async(
        &self,
        agent: &Arc<AgentDefinition>,
        prompt: &str,
        session: &Arc<SessionHandle>,
    ) -> Result<String> {
        self.run_async(agent, prompt, session)
            .await
            .map(|r| r.final_output)
    }

    /// Blocking variant returning the full [`RunResult`].
    pub fn run(
        &self,
        agent: &Arc<AgentDefinition>,
        prompt: &str,
        session: &Arc<SessionHandle>,
    ) -> Result<RunResult> {
        let reply = self.submit(agent, prompt, session)?;
        // Not tokio's block_on: parks this thread only, whatever runtime it is in.
        futures::executor::block_on(reply).map_err(|_| ChatError::BridgeClosed)?
    }

    /// Awaitable variant returning the full [`RunResult`].
    pub async fn run_async(
        &self,
        agent: &Arc<AgentDefinition>,
        prompt: &str,
        session: &Arc<SessionHandle>,
    ) -> Result<RunResult> {
        let reply = self.submit(agent, prompt, session)?;
        reply.await.map_err(|_| ChatError::BridgeClosed)?
    }

    fn submit(
        &self,
        agent: &Arc<AgentDefinition>,
        prompt: &str,
        session: &Arc<SessionHandle>,
    ) -> Result<oneshot::Receiver<Result<RunResult>>> {
        let jobs = self.jobs.as_ref().ok_or(ChatError::BridgeClosed)?;
        let (tx, rx) = oneshot::channel();

        let runtime = Arc::clone(&self.runtime);
        let agent = Arc::clone(agent);
        let session = Arc::clone(session);
        let prompt = prompt.to_string();
        let timeout = self.turn_timeout;

        let job: Job = Box::pin(async move {
            let result = AssertUnwindSafe(execute(runtime, agent, prompt, session, timeout))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    let message = panic_message(panic.as_ref());
                    warn!(error = %message, "turn panicked");
                    Err(ChatError::Aborted(message))
                });
            let _ = tx.send(result);
        });
        jobs.send(job).map_err(|_| ChatError::BridgeClosed)?;
        Ok(rx)
    }

    /// Stop accepting turns, finish in-flight ones and join the worker.
    pub fn shutdown(&mut self) {
        self.jobs.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("bridge worker panicked");
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.jobs.as_ref().map_or(true, |jobs| jobs.is_closed())
    }
}

impl Drop for ExecutionBridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for ExecutionBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionBridge")
            .field("turn_timeout", &self.turn_timeout)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Worker loop: spawn each job, reap finished ones, drain on close.
async fn drive(mut rx: mpsc::UnboundedReceiver<Job>) {
    let mut tasks = JoinSet::new();
    loop {
        tokio::select! {
            job = rx.recv() => match job {
                Some(job) => {
                    tasks.spawn(job);
                }
                None => break,
            },
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                if let Err(e) = joined {
                    warn!(error = %e, "bridge task failed");
                }
            }
        }
    }
    while tasks.join_next().await.is_some() {}
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "runtime panicked".to_string()
    }
}

async fn execute(
    runtime: Arc<dyn AgentRuntime>,
    agent: Arc<AgentDefinition>,
    prompt: String,
    session: Arc<SessionHandle>,
    timeout: Duration,
) -> Result<RunResult> {
    let _turn = session.lock_turn().await;
    info!(session = %session.id(), agent = agent.name(), model = agent.model(), "turn started");
    let result = with_timeout(timeout, runtime.run(&agent, &prompt, &session)).await;
    match &result {
        Ok(run) => info!(
            session = %session.id(),
            steps = run.steps.len(),
            output_tokens = run.usage.output_tokens,
            "turn finished"
        ),
        Err(e) => warn!(session = %session.id(), kind = e.kind(), error = %e, "turn failed"),
    }
    result
}
