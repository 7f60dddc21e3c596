// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    config::Config,
    exam::{catalog::QuestionSource, registry::SessionRegistry},
    storage::SharedStorage,
};

pub type SharedQuestions = Arc<dyn QuestionSource>;

#[derive(Clone)]
pub struct AppState {
    pub storage: SharedStorage,
    pub config: Config,
    pub questions: SharedQuestions,
    pub sessions: SessionRegistry,
}

impl FromRef<AppState> for SharedStorage {
    fn from_ref(state: &AppState) -> Self {
        state.storage.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for SharedQuestions {
    fn from_ref(state: &AppState) -> Self {
        state.questions.clone()
    }
}

impl FromRef<AppState> for SessionRegistry {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}
