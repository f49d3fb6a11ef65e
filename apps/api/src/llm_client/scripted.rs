//! Test double for `TextGenerator`: replays a fixed queue of replies and
//! records every prompt it was sent. An exhausted queue behaves like an
//! unavailable provider.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm_client::{LlmError, ModelReply, TextGenerator};

pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<ModelReply>>,
    prompts: Mutex<Vec<(Option<String>, String)>>,
    stall_at: Option<usize>,
}

impl ScriptedGenerator {
    fn from_queue(replies: VecDeque<ModelReply>) -> Self {
        Self {
            replies: Mutex::new(replies),
            prompts: Mutex::new(Vec::new()),
            stall_at: None,
        }
    }

    /// The call with this 0-based index never completes.
    pub fn stalling_at(mut self, call: usize) -> Self {
        self.stall_at = Some(call);
        self
    }

    /// Every call fails with a 503.
    pub fn failing() -> Self {
        Self::from_queue(VecDeque::new())
    }

    /// The first call is blocked, later calls fail.
    pub fn blocked() -> Self {
        Self::from_queue(VecDeque::from([ModelReply::Blocked {
            reason: "SAFETY".to_string(),
        }]))
    }

    /// Replies with each text in order, then fails.
    pub fn replying<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_queue(
            texts
                .into_iter()
                .map(|t| ModelReply::Text(t.into()))
                .collect(),
        )
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompt(&self, index: usize) -> String {
        self.prompts.lock().unwrap()[index].1.clone()
    }

    pub fn instruction(&self, index: usize) -> Option<String> {
        self.prompts.lock().unwrap()[index].0.clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        instruction: Option<&str>,
        prompt: &str,
    ) -> Result<ModelReply, LlmError> {
        let call = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push((instruction.map(String::from), prompt.to_string()));
            prompts.len() - 1
        };
        if self.stall_at == Some(call) {
            std::future::pending::<()>().await;
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LlmError::Api {
                status: 503,
                message: "scripted provider unavailable".to_string(),
            })
    }
}
