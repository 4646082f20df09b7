//! Orchestrator
//!
//! Runs one task through the agent pipeline in a single pass:
//!
//! 1. The router classifies the task (coding, verification or execution)
//! 2. Coding: developer writes code, verifier reviews it, executor (if any)
//!    runs it when the review is exactly `APPROVED`
//! 3. Verification: verifier reviews the input directly
//! 4. Execution: executor (if any) runs the input directly
//!
//! Every branch ends in a [`RouteOutcome`]. A failed backend call is never
//! read as a decision or a review; it ends the pass with
//! [`RouteOutcome::BackendFailure`].

use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use sdk::agent::TaskAgent;
use sdk::types::Generation;

/// Review text that approves code. Compared for exact equality.
pub const APPROVAL_TOKEN: &str = "APPROVED";

/// Where a pass currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Routing,
    Coding,
    Verifying,
    Executing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Routing => "Routing",
            Stage::Coding => "Coding",
            Stage::Verifying => "Verifying",
            Stage::Executing => "Executing",
        };
        f.write_str(name)
    }
}

/// Branch picked from the router's decision text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Coding,
    Verification,
    Execution,
}

impl Route {
    /// Case-insensitive substring match, checked in priority order:
    /// coding, then verification, then execution.
    pub fn classify(decision: &str) -> Option<Route> {
        let decision = decision.to_lowercase();

        if decision.contains("coding") {
            Some(Route::Coding)
        } else if decision.contains("verification") {
            Some(Route::Verification)
        } else if decision.contains("execution") {
            Some(Route::Execution)
        } else {
            None
        }
    }
}

/// Terminal result of one orchestration pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RouteOutcome {
    /// Coding branch: `code` approved and handed to the executor, which
    /// answered with `result`
    CodeExecuted { code: String, result: String },

    /// Execution branch: input handed to the executor
    Executed,

    /// Verification branch: input approved
    Approved,

    /// Review was anything other than exactly `APPROVED`
    Rejected { review: String },

    /// Execution was needed but no executor is configured. From the coding
    /// branch this still carries the approved code.
    NoExecutor {
        stage: Stage,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },

    /// Router decision matched no branch
    Unroutable,

    /// An agent's backend call failed at `stage`
    BackendFailure { stage: Stage, message: String },
}

impl RouteOutcome {
    /// True for outcomes where the requested work was carried out
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            RouteOutcome::CodeExecuted { .. } | RouteOutcome::Executed | RouteOutcome::Approved
        )
    }

    /// Developer code the verifier approved, if the pass got that far
    pub fn approved_code(&self) -> Option<&str> {
        match self {
            RouteOutcome::CodeExecuted { code, .. } => Some(code.as_str()),
            RouteOutcome::NoExecutor { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for RouteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteOutcome::CodeExecuted { .. } => write!(f, "Code executed and saved successfully."),
            RouteOutcome::Executed => write!(f, "Code executed successfully."),
            RouteOutcome::Approved => write!(f, "Code verified and approved."),
            RouteOutcome::Rejected { review } => write!(f, "Code rejected: {}", review),
            RouteOutcome::NoExecutor {
                stage: Stage::Executing,
                ..
            } => write!(f, "No executor available for execution."),
            RouteOutcome::NoExecutor { .. } => {
                write!(f, "No executor available to execute the code.")
            }
            RouteOutcome::Unroutable => write!(f, "Unknown task type. Could not route."),
            RouteOutcome::BackendFailure { stage, message } => {
                write!(f, "{} failed: {}", stage, message)
            }
        }
    }
}

/// Owns the pipeline's agents and routes tasks through them
pub struct Orchestrator {
    router: Box<dyn TaskAgent>,
    developer: Box<dyn TaskAgent>,
    verifier: Box<dyn TaskAgent>,
    executor: Option<Box<dyn TaskAgent>>,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("has_executor", &self.executor.is_some())
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    pub fn new(
        router: Box<dyn TaskAgent>,
        developer: Box<dyn TaskAgent>,
        verifier: Box<dyn TaskAgent>,
        executor: Option<Box<dyn TaskAgent>>,
    ) -> Self {
        Self {
            router,
            developer,
            verifier,
            executor,
        }
    }

    pub fn has_executor(&self) -> bool {
        self.executor.is_some()
    }

    /// Route `input` through the pipeline once.
    ///
    /// Calls within the pass are sequential; agent memories keep whatever
    /// the pass recorded.
    pub async fn route_task(&mut self, input: &str) -> RouteOutcome {
        let task_id = Uuid::new_v4();
        info!("Routing task {}", task_id);

        let decision = match self.router.run(input).await {
            Generation::Failed(message) => return failure(task_id, Stage::Routing, message),
            generation => generation.into_text(),
        };
        debug!("Task {} routing decision: {}", task_id, decision);

        let outcome = match Route::classify(&decision) {
            Some(Route::Coding) => self.code_and_review(task_id, input).await,
            Some(Route::Verification) => self.verify(task_id, input).await,
            Some(Route::Execution) => self.execute(task_id, input).await,
            None => {
                warn!("Task {} could not be routed", task_id);
                RouteOutcome::Unroutable
            }
        };

        info!("Task {} finished: {}", task_id, outcome);
        outcome
    }

    async fn code_and_review(&mut self, task_id: Uuid, input: &str) -> RouteOutcome {
        info!("Task {} routed to {}", task_id, self.developer.name());
        let code = match self.developer.run(input).await {
            Generation::Failed(message) => return failure(task_id, Stage::Coding, message),
            generation => generation.into_text(),
        };

        let review = match self.verifier.run(&code).await {
            Generation::Failed(message) => return failure(task_id, Stage::Verifying, message),
            generation => generation.into_text(),
        };

        if review != APPROVAL_TOKEN {
            return RouteOutcome::Rejected { review };
        }

        match self.executor.as_mut() {
            Some(executor) => match executor.run(&code).await {
                Generation::Failed(message) => failure(task_id, Stage::Executing, message),
                generation => RouteOutcome::CodeExecuted {
                    code,
                    result: generation.into_text(),
                },
            },
            None => RouteOutcome::NoExecutor {
                stage: Stage::Coding,
                code: Some(code),
            },
        }
    }

    async fn verify(&mut self, task_id: Uuid, input: &str) -> RouteOutcome {
        info!("Task {} routed to {}", task_id, self.verifier.name());
        match self.verifier.run(input).await {
            Generation::Failed(message) => failure(task_id, Stage::Verifying, message),
            generation if generation.text() == APPROVAL_TOKEN => RouteOutcome::Approved,
            generation => RouteOutcome::Rejected {
                review: generation.into_text(),
            },
        }
    }

    async fn execute(&mut self, task_id: Uuid, input: &str) -> RouteOutcome {
        let Some(executor) = self.executor.as_mut() else {
            return RouteOutcome::NoExecutor {
                stage: Stage::Executing,
                code: None,
            };
        };

        info!("Task {} routed to {}", task_id, executor.name());
        match executor.run(input).await {
            Generation::Failed(message) => failure(task_id, Stage::Executing, message),
            _ => RouteOutcome::Executed,
        }
    }
}

fn failure(task_id: Uuid, stage: Stage, message: String) -> RouteOutcome {
    warn!("Task {} stopped at {}: {}", task_id, stage, message);
    RouteOutcome::BackendFailure { stage, message }
}
