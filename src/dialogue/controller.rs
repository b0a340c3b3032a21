use anyhow::Result;
use std::sync::Arc;
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage, Storage};
use teloxide::types::ChatId;

use crate::database::store::{CommittedEntry, MarkEntry, RecordStore};
use crate::dialogue::state::{DialogueStep, MarksState, Transition};
use crate::utils::feedback::FeedbackType;
use crate::utils::logging::{log_dialogue_transition, log_validation_error};
use crate::utils::markdown::truncate_for_display;

/// Longest slice of a typed field echoed back in the save confirmation.
/// The full value is still stored.
const MAX_ECHOED_FIELD: usize = 64;

/// What the controller wants said back to the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub kind: FeedbackType,
    pub text: String,
    /// Step the conversation is in after this reply.
    pub step: DialogueStep,
}

impl Reply {
    fn prompt(step: DialogueStep) -> Self {
        Self {
            kind: FeedbackType::Prompt,
            text: step.prompt().unwrap_or_default().to_string(),
            step,
        }
    }

    fn saved(entry: &MarkEntry, committed: &CommittedEntry) -> Self {
        let mut text = format!(
            "Marks saved for {}: {} ({}), practical {}, theoretical {}.",
            truncate_for_display(&entry.student_name, MAX_ECHOED_FIELD),
            truncate_for_display(&entry.subject, MAX_ECHOED_FIELD),
            truncate_for_display(&entry.test_type, MAX_ECHOED_FIELD),
            entry.practical_marks,
            entry.theoretical_marks,
        );
        if committed.student_created {
            text.push_str("\nNew student registered.");
        }
        Self {
            kind: FeedbackType::Success,
            text,
            step: DialogueStep::Done,
        }
    }
}

/// Runs one data-entry session per chat. Sessions live in `storage`, keyed
/// by chat id, from `begin` until completion or `cancel`.
pub struct DialogueController<S = InMemStorage<MarksState>> {
    storage: Arc<S>,
    store: RecordStore,
}

impl<S> Clone for DialogueController<S> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            store: self.store.clone(),
        }
    }
}

impl<S> DialogueController<S>
where
    S: Storage<MarksState> + Send + Sync + 'static,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    pub fn new(storage: Arc<S>, store: RecordStore) -> Self {
        Self { storage, store }
    }

    fn dialogue(&self, chat_id: ChatId) -> Dialogue<MarksState, S> {
        Dialogue::new(self.storage.clone(), chat_id)
    }

    /// Current session of `chat_id`, if any.
    pub async fn state(&self, chat_id: ChatId) -> Result<Option<MarksState>> {
        Ok(self.dialogue(chat_id).get().await?)
    }

    /// Starts a fresh session, discarding one already in progress.
    pub async fn begin(&self, chat_id: ChatId) -> Result<Reply> {
        let dialogue = self.dialogue(chat_id);
        let from = dialogue
            .get()
            .await?
            .map_or(DialogueStep::Idle, |state| state.step());

        dialogue.update(MarksState::AwaitingName).await?;
        log_dialogue_transition(chat_id.0, from.as_str(), DialogueStep::AwaitingName.as_str());

        Ok(Reply::prompt(DialogueStep::AwaitingName))
    }

    /// Feeds one message into the chat's session. Returns `None` when the
    /// chat has no session.
    pub async fn handle_text(&self, chat_id: ChatId, text: &str) -> Result<Option<Reply>> {
        let dialogue = self.dialogue(chat_id);
        let Some(state) = dialogue.get().await? else {
            return Ok(None);
        };
        let from = state.step();

        let reply = match state.advance(text) {
            Transition::Next(next) => {
                let step = next.step();
                dialogue.update(next).await?;
                log_dialogue_transition(chat_id.0, from.as_str(), step.as_str());
                Reply::prompt(step)
            }
            Transition::Rejected { reason } => {
                log_validation_error(from.as_str(), &reason, chat_id.0);
                Reply {
                    kind: FeedbackType::Error,
                    text: format!("{}\n{}", reason, from.prompt().unwrap_or_default()),
                    step: from,
                }
            }
            Transition::Complete(entry) => {
                let outcome = self.store.commit_entry(&entry).await;
                // The session ends whether or not the write succeeded.
                dialogue.exit().await?;

                match outcome {
                    Ok(committed) => {
                        log_dialogue_transition(chat_id.0, from.as_str(), DialogueStep::Done.as_str());
                        Reply::saved(&entry, &committed)
                    }
                    Err(e) => {
                        tracing::error!("Failed to save marks for chat {}: {}", chat_id.0, e);
                        log_dialogue_transition(chat_id.0, from.as_str(), DialogueStep::Idle.as_str());
                        Reply {
                            kind: FeedbackType::Error,
                            text: "Could not save the marks, nothing was recorded. Use /add_marks to try again.".to_string(),
                            step: DialogueStep::Idle,
                        }
                    }
                }
            }
        };

        Ok(Some(reply))
    }

    /// Drops the chat's session without writing anything.
    pub async fn cancel(&self, chat_id: ChatId) -> Result<Reply> {
        let dialogue = self.dialogue(chat_id);
        match dialogue.get().await? {
            Some(state) => {
                dialogue.exit().await?;
                log_dialogue_transition(chat_id.0, state.step().as_str(), DialogueStep::Cancelled.as_str());
                Ok(Reply {
                    kind: FeedbackType::Info,
                    text: "Data entry cancelled. Nothing was saved.".to_string(),
                    step: DialogueStep::Cancelled,
                })
            }
            None => Ok(Reply {
                kind: FeedbackType::Info,
                text: "Nothing to cancel. Use /add_marks to start entering marks.".to_string(),
                step: DialogueStep::Idle,
            }),
        }
    }
}
