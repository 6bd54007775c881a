use crate::app::{AppEvent, Command};
use crate::client::ClassifierApi;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Runs `command` on its own task and posts the outcome on `tx`. There is
/// no cancellation; a result arriving after the UI moved on is still
/// delivered and handled by the app.
pub fn dispatch(api: Arc<dyn ClassifierApi>, command: Command, tx: mpsc::Sender<AppEvent>) {
    tokio::spawn(async move {
        if let Some(event) = run_command(api.as_ref(), command).await {
            if tx.send(event).await.is_err() {
                tracing::debug!("UI gone, dropping background result");
            }
        }
    });
}

/// Performs one command against the backend. `Copy` is terminal work and
/// yields no event here.
pub async fn run_command(api: &dyn ClassifierApi, command: Command) -> Option<AppEvent> {
    let event = match command {
        Command::Classify(request) => AppEvent::Classified(api.classify(&request).await),
        Command::Regenerate { email_id, request } => AppEvent::Regenerated {
            email_id,
            outcome: api.classify(&request).await,
        },
        Command::LoadHistory { skip, limit } => {
            let outcome = api.history(skip, limit).await;
            // The total is decoration; a failing count must not hide the page
            let total = match api.history_count().await {
                Ok(total) => Some(total),
                Err(e) => {
                    tracing::warn!("history count unavailable: {:#}", e);
                    None
                }
            };
            AppEvent::HistoryLoaded {
                skip,
                outcome,
                total,
            }
        }
        Command::LoadPrompts(query) => AppEvent::PromptsLoaded(api.list_prompts(&query).await),
        Command::LoadPromptTypes => AppEvent::PromptTypesLoaded(api.prompt_types().await),
        Command::CreatePrompt(prompt) => {
            AppEvent::PromptCreated(api.create_prompt(&prompt).await)
        }
        Command::SavePrompt { id, update } => AppEvent::PromptSaved {
            id,
            outcome: api.update_prompt(id, &update).await,
        },
        Command::DeletePrompt { id } => AppEvent::PromptDeleted {
            id,
            outcome: api.delete_prompt(id).await,
        },
        Command::Copy(_) => return None,
    };
    Some(event)
}
