//! Scripted Brain for tests: replays a fixed sequence of turns and records
//! what it was asked.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::brain::{Brain, BrainRequest, BrainTurn};
use crate::error::BrainError;

/// A recorded request: the question and the failure description, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenRequest {
    pub question: String,
    pub failure: Option<String>,
}

/// Replays scripted turns in order; errors once the script runs out.
#[derive(Debug, Default)]
pub struct ScriptedBrain {
    turns: Mutex<VecDeque<BrainTurn>>,
    seen: Mutex<Vec<SeenRequest>>,
}

impl ScriptedBrain {
    pub fn new(turns: impl IntoIterator<Item = BrainTurn>) -> Self {
        Self {
            turns: Mutex::new(turns.into_iter().collect()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// One-off brain that always answers with the same SQL.
    pub fn sql(statement: &str) -> Self {
        Self::new([BrainTurn::Sql(statement.to_string())])
    }

    /// The requests made so far.
    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().expect("seen lock").clone()
    }
}

#[async_trait]
impl Brain for ScriptedBrain {
    async fn reply(&self, request: BrainRequest<'_>) -> Result<BrainTurn, BrainError> {
        self.seen.lock().expect("seen lock").push(SeenRequest {
            question: request.question.to_string(),
            failure: request.failure.map(str::to_string),
        });
        self.turns
            .lock()
            .expect("turns lock")
            .pop_front()
            .ok_or_else(|| BrainError::ProcessingFailed("script exhausted".to_string()))
    }

    fn name(&self) -> &str {
        "ScriptedBrain"
    }
}
