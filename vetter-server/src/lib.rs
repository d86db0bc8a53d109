pub mod archive;
pub mod config;
pub mod db;
pub mod persistent_store;
pub mod routes;
pub mod state_machine;
pub mod timer;

use std::sync::Arc;

use tokio::sync::mpsc;
use vetter_core::assistant::AssistantApi;

use archive::CandidateDirectory;
use persistent_store::PersistentSessionStore;
use state_machine::event::Event;
use state_machine::interpreter::InterpreterContext;
use timer::AnswerTimers;

pub struct AppState {
    pub store: Arc<PersistentSessionStore>,
    pub directory: Arc<CandidateDirectory>,
    pub assistant: Arc<dyn AssistantApi>,
    pub timers: Arc<AnswerTimers>,
    /// Channel the answer timer delivers expiry events into; drained by the
    /// timer event loop in `main`.
    pub events_tx: mpsc::Sender<Event>,
}

impl AppState {
    pub fn interpreter_context(&self) -> InterpreterContext {
        InterpreterContext {
            assistant: self.assistant.clone(),
            timers: self.timers.clone(),
            directory: self.directory.clone(),
            events_tx: self.events_tx.clone(),
        }
    }
}
