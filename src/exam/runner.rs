// src/exam/runner.rs

//! One task per live session.
//!
//! The task exclusively owns its [`ExamSession`]; HTTP handlers and the
//! countdown talk to it through a channel, so commands are applied one at a
//! time and a timer expiry is just another submission.

use std::time::Duration;

use tokio::{
    sync::{mpsc, oneshot},
    time,
};
use uuid::Uuid;

use crate::{
    exam::{
        answers::Answer,
        error::ExamError,
        session::{ExamSession, SessionContext, SessionPhase, SessionSpec},
    },
    models::session::SessionView,
    storage::SharedStorage,
};

/// A user-driven action on a session.
#[derive(Debug, Clone)]
pub enum SessionAction {
    Snapshot,
    Next,
    Previous,
    GoTo(usize),
    Answer { question_id: String, answer: Answer },
    Submit,
}

enum SessionCommand {
    Apply {
        action: SessionAction,
        reply: oneshot::Sender<Result<SessionView, ExamError>>,
    },
    /// Sent by the countdown when it reaches zero.
    Expire,
    Abandon,
}

/// Cheap, cloneable handle to a running session task.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: Uuid,
    owner: Uuid,
    tx: mpsc::UnboundedSender<SessionCommand>,
}

impl std::fmt::Debug for SessionCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionCommand::Apply { action, .. } => write!(f, "Apply({:?})", action),
            SessionCommand::Expire => f.write_str("Expire"),
            SessionCommand::Abandon => f.write_str("Abandon"),
        }
    }
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner(&self) -> Uuid {
        self.owner
    }

    /// False once the session task has exited.
    pub fn is_alive(&self) -> bool {
        !self.tx.is_closed()
    }

    pub async fn apply(&self, action: SessionAction) -> Result<SessionView, ExamError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::Apply { action, reply })
            .map_err(|_| ExamError::SessionClosed)?;
        rx.await.map_err(|_| ExamError::SessionClosed)?
    }

    pub async fn snapshot(&self) -> Result<SessionView, ExamError> {
        self.apply(SessionAction::Snapshot).await
    }

    pub async fn submit(&self) -> Result<SessionView, ExamError> {
        self.apply(SessionAction::Submit).await
    }

    /// Stops the countdown and ends the task without submitting.
    pub fn abandon(&self) {
        let _ = self.tx.send(SessionCommand::Abandon);
    }
}

/// Creates a session, starts it and spawns its task.
///
/// After submission the task keeps answering snapshots for `retention`, then exits.
pub fn spawn_session(
    spec: SessionSpec,
    context: SessionContext,
    storage: SharedStorage,
    retention: Duration,
) -> Result<SessionHandle, ExamError> {
    let (tx, rx) = mpsc::unbounded_channel();

    // Weak so the session's own timer does not keep the channel open.
    let expiry_tx = tx.downgrade();
    let mut session = ExamSession::new(spec, context, storage, move || {
        if let Some(tx) = expiry_tx.upgrade() {
            let _ = tx.send(SessionCommand::Expire);
        }
    })?;
    session.start()?;

    let handle = SessionHandle {
        id: session.id(),
        owner: session.owner(),
        tx,
    };

    tokio::spawn(run(session, rx, retention));
    Ok(handle)
}

async fn run(
    mut session: ExamSession,
    mut rx: mpsc::UnboundedReceiver<SessionCommand>,
    retention: Duration,
) {
    loop {
        let command = if session.phase() == SessionPhase::Submitted {
            match time::timeout(retention, rx.recv()).await {
                Ok(command) => command,
                Err(_) => {
                    tracing::debug!(session = %session.id(), "Retention elapsed, closing session");
                    break;
                }
            }
        } else {
            rx.recv().await
        };

        let Some(command) = command else {
            break;
        };

        match command {
            SessionCommand::Apply { action, reply } => {
                let result = apply(&mut session, action).await;
                let _ = reply.send(result);
            }
            SessionCommand::Expire => {
                tracing::info!(session = %session.id(), "Time is up, submitting");
                if let Err(e) = session.expire().await {
                    tracing::warn!(session = %session.id(), "Automatic submission failed: {}", e);
                }
            }
            SessionCommand::Abandon => break,
        }
    }

    session.abandon();
}

async fn apply(session: &mut ExamSession, action: SessionAction) -> Result<SessionView, ExamError> {
    match action {
        SessionAction::Snapshot => {}
        SessionAction::Next => {
            session.go_next()?;
        }
        SessionAction::Previous => {
            session.go_previous()?;
        }
        SessionAction::GoTo(index) => {
            session.go_to(index)?;
        }
        SessionAction::Answer {
            question_id,
            answer,
        } => session.record_answer(&question_id, answer)?,
        SessionAction::Submit => {
            session.submit().await?;
        }
    }
    Ok(session.view())
}
