use crate::clipboard::CopyFeedback;
use crate::config::{Keybindings, matches_key};
use crate::form::{EmailMetadata, EmailSource, FormField, SubmitRequest, UploadForm};
use crate::models::{
    ClassificationResult, HistoryItem, NewPrompt, PROMPT_PRODUCTIVE, PROMPT_UNPRODUCTIVE,
    PromptItem, PromptQuery, PromptTypes, PromptUpdate,
};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::style::Style;
use std::collections::HashSet;
use tui_textarea::{CursorMove, TextArea};

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum Tab {
    #[default]
    Upload,
    Results,
    History,
    Prompts,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Upload, Tab::Results, Tab::History, Tab::Prompts];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Upload => "Upload",
            Tab::Results => "Results",
            Tab::History => "History",
            Tab::Prompts => "Prompts",
        }
    }

    fn index(self) -> usize {
        Tab::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum PromptTab {
    #[default]
    Productive,
    Unproductive,
}

impl PromptTab {
    pub fn category(self) -> &'static str {
        match self {
            PromptTab::Productive => PROMPT_PRODUCTIVE,
            PromptTab::Unproductive => PROMPT_UNPRODUCTIVE,
        }
    }

    fn toggled(self) -> Self {
        match self {
            PromptTab::Productive => PromptTab::Unproductive,
            PromptTab::Unproductive => PromptTab::Productive,
        }
    }
}

/// Network work requested by the UI. Everything except `Copy` runs on a
/// background task.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Classify(SubmitRequest),
    Regenerate { email_id: i64, request: SubmitRequest },
    LoadHistory { skip: u32, limit: u32 },
    LoadPrompts(PromptQuery),
    LoadPromptTypes,
    CreatePrompt(NewPrompt),
    SavePrompt { id: i64, update: PromptUpdate },
    DeletePrompt { id: i64 },
    Copy(String),
}

/// Completion of a background command.
#[derive(Debug)]
pub enum AppEvent {
    Classified(Result<ClassificationResult>),
    Regenerated {
        email_id: i64,
        outcome: Result<ClassificationResult>,
    },
    HistoryLoaded {
        skip: u32,
        outcome: Result<Vec<HistoryItem>>,
        total: Option<u64>,
    },
    PromptsLoaded(Result<Vec<PromptItem>>),
    PromptTypesLoaded(Result<PromptTypes>),
    PromptCreated(Result<PromptItem>),
    PromptSaved {
        id: i64,
        outcome: Result<PromptItem>,
    },
    PromptDeleted {
        id: i64,
        outcome: Result<()>,
    },
}

/// Blocking dialog. While one is open every other key is ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub title: String,
    pub message: String,
    /// Issued when the alert is accepted with Enter.
    pub on_confirm: Option<Command>,
}

impl Alert {
    pub fn error(title: &str, err: &anyhow::Error) -> Self {
        Self {
            title: title.to_string(),
            message: format!("{:#}", err),
            on_confirm: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            title: "Attention".to_string(),
            message: message.into(),
            on_confirm: None,
        }
    }

    pub fn confirm(message: impl Into<String>, command: Command) -> Self {
        Self {
            title: "Confirm".to_string(),
            message: message.into(),
            on_confirm: Some(command),
        }
    }
}

#[derive(Debug, Default)]
pub struct HistoryView {
    pub items: Vec<HistoryItem>,
    pub expanded: HashSet<i64>,
    pub selected: usize,
    pub skip: u32,
    pub total: Option<u64>,
    pub loading: bool,
}

impl HistoryView {
    pub fn toggle(&mut self, id: i64) {
        if !self.expanded.remove(&id) {
            self.expanded.insert(id);
        }
    }

    pub fn is_expanded(&self, id: i64) -> bool {
        self.expanded.contains(&id)
    }

    pub fn toggle_selected(&mut self) {
        if let Some(id) = self.items.get(self.selected).map(|item| item.id) {
            self.toggle(id);
        }
    }
}

pub struct PromptEditor<'a> {
    /// `None` while drafting a new prompt.
    pub id: Option<i64>,
    pub category: String,
    original: String,
    pub textarea: TextArea<'a>,
}

impl<'a> PromptEditor<'a> {
    fn new(prompt: &PromptItem) -> Self {
        Self::with_content(Some(prompt.id), &prompt.category, &prompt.content)
    }

    fn blank(category: &str) -> Self {
        Self::with_content(None, category, "")
    }

    fn with_content(id: Option<i64>, category: &str, content: &str) -> Self {
        // split, not lines: `\r` and a trailing newline must survive a save
        let mut textarea = TextArea::from(content.split('\n'));
        textarea.set_cursor_line_style(Style::default());
        textarea.set_placeholder_text("Prompt content...");
        textarea.move_cursor(CursorMove::Bottom);
        textarea.move_cursor(CursorMove::End);
        Self {
            id,
            category: category.to_string(),
            original: content.to_string(),
            textarea,
        }
    }

    pub fn content(&self) -> String {
        self.textarea.lines().join("\n")
    }

    pub fn is_modified(&self) -> bool {
        self.content() != self.original
    }
}

#[derive(Default)]
pub struct PromptsView<'a> {
    pub items: Vec<PromptItem>,
    pub types: PromptTypes,
    pub tab: PromptTab,
    pub selected: usize,
    pub editing: Option<PromptEditor<'a>>,
    pub loading: bool,
    pub saving: bool,
}

impl<'a> PromptsView<'a> {
    pub fn visible(&self) -> Vec<&PromptItem> {
        self.items
            .iter()
            .filter(|p| p.category == self.tab.category())
            .collect()
    }

    pub fn count_for(&self, tab: PromptTab) -> usize {
        self.items
            .iter()
            .filter(|p| p.category == tab.category())
            .count()
    }

    pub fn selected_prompt(&self) -> Option<&PromptItem> {
        self.visible().get(self.selected).copied()
    }

    /// Only one prompt can be in edit mode; starting another edit replaces
    /// the previous draft.
    pub fn start_edit(&mut self) {
        let editor = self.selected_prompt().map(PromptEditor::new);
        if editor.is_some() {
            self.editing = editor;
        }
    }

    /// Opens an empty draft in the category of the active tab.
    pub fn start_new(&mut self) {
        self.editing = Some(PromptEditor::blank(self.tab.category()));
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    pub fn is_editing(&self, id: i64) -> bool {
        self.editing.as_ref().and_then(|e| e.id) == Some(id)
    }

    pub fn is_drafting(&self) -> bool {
        self.editing.as_ref().is_some_and(|e| e.id.is_none())
    }

    fn clamp_selection(&mut self) {
        let len = self.visible().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }
}

pub struct App<'a> {
    pub tab: Tab,
    pub form: UploadForm<'a>,
    pub result: Option<ClassificationResult>,
    pub results_scroll: u16,
    pub submitting: bool,
    pub regenerating: bool,
    pub history: HistoryView,
    pub prompts: PromptsView<'a>,
    pub alert: Option<Alert>,
    pub copy_feedback: CopyFeedback,
    pub page_size: u32,
    pub should_quit: bool,
}

impl<'a> App<'a> {
    pub fn new(page_size: u32) -> Self {
        Self {
            tab: Tab::Upload,
            form: UploadForm::new(),
            result: None,
            results_scroll: 0,
            submitting: false,
            regenerating: false,
            history: HistoryView::default(),
            prompts: PromptsView::default(),
            alert: None,
            copy_feedback: CopyFeedback::default(),
            page_size: page_size.max(1),
            should_quit: false,
        }
    }

    pub fn is_tab_enabled(&self, tab: Tab) -> bool {
        tab != Tab::Results || self.result.is_some()
    }

    /// Switches views. Entering History or Prompts always reloads them.
    pub fn select_tab(&mut self, tab: Tab) -> Vec<Command> {
        if !self.is_tab_enabled(tab) {
            return Vec::new();
        }
        self.tab = tab;
        match tab {
            Tab::History => self.load_history(0),
            Tab::Prompts => self.load_prompts(),
            Tab::Upload | Tab::Results => Vec::new(),
        }
    }

    fn cycle_tab(&mut self, forward: bool) -> Vec<Command> {
        let len = Tab::ALL.len();
        let mut index = self.tab.index();
        for _ in 0..len {
            index = if forward {
                (index + 1) % len
            } else {
                (index + len - 1) % len
            };
            let candidate = Tab::ALL[index];
            if self.is_tab_enabled(candidate) {
                return self.select_tab(candidate);
            }
        }
        Vec::new()
    }

    /// Validates the form and issues the upload. Ignored while a submit is
    /// already in flight.
    pub fn submit(&mut self) -> Vec<Command> {
        if self.submitting {
            return Vec::new();
        }
        match self.form.build_request() {
            Ok(request) => {
                self.submitting = true;
                vec![Command::Classify(request)]
            }
            Err(e) => {
                self.alert = Some(Alert::warning(e.to_string()));
                Vec::new()
            }
        }
    }

    pub fn regenerate(&mut self) -> Vec<Command> {
        if self.regenerating {
            return Vec::new();
        }
        let Some(result) = &self.result else {
            return Vec::new();
        };
        let email = &result.email;
        let request = SubmitRequest {
            source: EmailSource::Text(email.content.clone()),
            metadata: EmailMetadata::new(
                email.subject.as_deref().unwrap_or_default(),
                email.sender.as_deref().unwrap_or_default(),
                email.recipient.as_deref().unwrap_or_default(),
            ),
        };
        self.regenerating = true;
        vec![Command::Regenerate {
            email_id: email.id,
            request,
        }]
    }

    /// Drops the displayed result and starts over with an empty form.
    pub fn reset(&mut self) {
        self.result = None;
        self.results_scroll = 0;
        self.form.clear();
        self.tab = Tab::Upload;
    }

    pub fn load_history(&mut self, skip: u32) -> Vec<Command> {
        self.history.loading = true;
        vec![Command::LoadHistory {
            skip,
            limit: self.page_size,
        }]
    }

    pub fn load_prompts(&mut self) -> Vec<Command> {
        self.prompts.loading = true;
        let mut commands = vec![Command::LoadPrompts(PromptQuery {
            skip: 0,
            limit: self.page_size,
            prompt_type: None,
            category: None,
        })];
        if self.prompts.types.types.is_empty() {
            commands.push(Command::LoadPromptTypes);
        }
        commands
    }

    pub fn save_prompt(&mut self) -> Vec<Command> {
        if self.prompts.saving {
            return Vec::new();
        }
        let Some(editor) = &self.prompts.editing else {
            return Vec::new();
        };
        match editor.id {
            Some(id) => {
                if !editor.is_modified() {
                    self.prompts.editing = None;
                    return Vec::new();
                }
                self.prompts.saving = true;
                vec![Command::SavePrompt {
                    id,
                    update: PromptUpdate::content(editor.content()),
                }]
            }
            None => {
                let content = editor.content();
                if content.trim().is_empty() {
                    self.alert = Some(Alert::warning("Please enter the prompt content"));
                    return Vec::new();
                }
                let prompt = NewPrompt::classification(&editor.category, content);
                self.prompts.saving = true;
                vec![Command::CreatePrompt(prompt)]
            }
        }
    }

    fn confirm_delete_prompt(&mut self) {
        if let Some(prompt) = self.prompts.selected_prompt() {
            self.alert = Some(Alert::confirm(
                format!(
                    "Delete prompt #{} ({})? Enter to confirm, Esc to keep it.",
                    prompt.id,
                    self.prompts.types.label_for(&prompt.prompt_type)
                ),
                Command::DeletePrompt { id: prompt.id },
            ));
        }
    }

    pub fn copy_response(&self) -> Vec<Command> {
        self.result
            .as_ref()
            .and_then(|r| r.classification.suggested_response.clone())
            .map(|text| vec![Command::Copy(text)])
            .unwrap_or_default()
    }

    pub fn on_copied(&mut self, text: &str, outcome: std::io::Result<()>) {
        match outcome {
            Ok(()) => self.copy_feedback.mark(text),
            Err(e) => {
                tracing::error!("clipboard write failed: {}", e);
                self.alert = Some(Alert::error("Could not copy", &anyhow::Error::new(e)));
            }
        }
    }

    pub fn tick(&mut self) {
        self.copy_feedback.clear_expired();
    }

    /// Applies a finished background command. May ask for follow-up work.
    pub fn handle_event(&mut self, event: AppEvent) -> Vec<Command> {
        match event {
            AppEvent::Classified(outcome) => {
                self.submitting = false;
                match outcome {
                    Ok(result) => {
                        tracing::info!(
                            email_id = result.email.id,
                            category = %result.classification.category,
                            "email classified"
                        );
                        self.result = Some(result);
                        self.results_scroll = 0;
                        self.tab = Tab::Results;
                        self.form.clear();
                    }
                    Err(e) => {
                        tracing::error!("classification failed: {:#}", e);
                        self.alert = Some(Alert::error(
                            "Failed to process the email. Try again.",
                            &e,
                        ));
                    }
                }
            }
            AppEvent::Regenerated { email_id, outcome } => {
                self.regenerating = false;
                match outcome {
                    Ok(fresh) => match &mut self.result {
                        Some(current) if current.email.id == email_id => {
                            current.classification.suggested_response =
                                fresh.classification.suggested_response;
                        }
                        _ => {
                            tracing::debug!(email_id, "dropping reply for a result no longer shown");
                        }
                    },
                    Err(e) => {
                        tracing::error!("regenerating response failed: {:#}", e);
                        self.alert = Some(Alert::error(
                            "Failed to generate a new response. Try again.",
                            &e,
                        ));
                    }
                }
            }
            AppEvent::HistoryLoaded {
                skip,
                outcome,
                total,
            } => {
                self.history.loading = false;
                match outcome {
                    Ok(items) => {
                        self.history.items = items;
                        self.history.skip = skip;
                        self.history.selected = 0;
                        if total.is_some() {
                            self.history.total = total;
                        }
                    }
                    Err(e) => {
                        tracing::error!("loading history failed: {:#}", e);
                        self.alert = Some(Alert::error("Failed to load history", &e));
                    }
                }
            }
            AppEvent::PromptsLoaded(outcome) => {
                self.prompts.loading = false;
                match outcome {
                    Ok(items) => {
                        tracing::debug!(count = items.len(), "prompts loaded");
                        self.prompts.items = items;
                        self.prompts.clamp_selection();
                    }
                    Err(e) => {
                        tracing::error!("loading prompts failed: {:#}", e);
                        self.alert = Some(Alert::error("Failed to load prompts", &e));
                    }
                }
            }
            AppEvent::PromptTypesLoaded(outcome) => match outcome {
                Ok(types) => self.prompts.types = types,
                // Labels fall back to title case; not worth a dialog
                Err(e) => tracing::warn!("loading prompt types failed: {:#}", e),
            },
            AppEvent::PromptCreated(outcome) => {
                self.prompts.saving = false;
                match outcome {
                    Ok(prompt) => {
                        tracing::info!(id = prompt.id, "prompt created");
                        if self.prompts.is_drafting() {
                            self.prompts.editing = None;
                        }
                        return self.load_prompts();
                    }
                    Err(e) => {
                        tracing::error!("creating prompt failed: {:#}", e);
                        self.alert = Some(Alert::error("Failed to create prompt", &e));
                    }
                }
            }
            AppEvent::PromptSaved { id, outcome } => {
                self.prompts.saving = false;
                match outcome {
                    Ok(_) => {
                        tracing::info!(id, "prompt saved");
                        if self.prompts.is_editing(id) {
                            self.prompts.editing = None;
                        }
                        return self.load_prompts();
                    }
                    Err(e) => {
                        tracing::error!(id, "saving prompt failed: {:#}", e);
                        self.alert = Some(Alert::error("Failed to save prompt", &e));
                    }
                }
            }
            AppEvent::PromptDeleted { id, outcome } => match outcome {
                Ok(()) => {
                    tracing::info!(id, "prompt deleted");
                    if self.prompts.is_editing(id) {
                        self.prompts.editing = None;
                    }
                    return self.load_prompts();
                }
                Err(e) => {
                    tracing::error!(id, "deleting prompt failed: {:#}", e);
                    self.alert = Some(Alert::error("Failed to delete prompt", &e));
                }
            },
        }
        Vec::new()
    }

    pub fn handle_paste(&mut self, text: &str) {
        if self.alert.is_some() {
            return;
        }
        match self.tab {
            Tab::Upload => {
                if let Err(e) = self.form.paste(text) {
                    self.alert = Some(Alert::warning(e.to_string()));
                }
            }
            Tab::Prompts => {
                if let Some(editor) = &mut self.prompts.editing {
                    editor.textarea.insert_str(text);
                }
            }
            Tab::Results | Tab::History => {}
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, keys: &Keybindings) -> Vec<Command> {
        if let Some(alert) = &self.alert {
            if matches_key(key, &keys.dismiss) {
                let confirmed = key.code == KeyCode::Enter;
                let command = alert.on_confirm.clone();
                self.alert = None;
                if confirmed {
                    if let Some(command) = command {
                        return vec![command];
                    }
                }
            }
            return Vec::new();
        }

        if matches_key(key, &keys.quit) {
            self.should_quit = true;
            return Vec::new();
        }
        if matches_key(key, &keys.next_tab) {
            return self.cycle_tab(true);
        }
        if matches_key(key, &keys.prev_tab) {
            return self.cycle_tab(false);
        }
        if matches_key(key, &keys.show_upload) {
            return self.select_tab(Tab::Upload);
        }
        if matches_key(key, &keys.show_results) {
            return self.select_tab(Tab::Results);
        }
        if matches_key(key, &keys.show_history) {
            return self.select_tab(Tab::History);
        }
        if matches_key(key, &keys.show_prompts) {
            return self.select_tab(Tab::Prompts);
        }

        match self.tab {
            Tab::Upload => self.handle_upload_key(key, keys),
            Tab::Results => self.handle_results_key(key, keys),
            Tab::History => self.handle_history_key(key, keys),
            Tab::Prompts => self.handle_prompts_key(key, keys),
        }
    }

    fn handle_upload_key(&mut self, key: KeyEvent, keys: &Keybindings) -> Vec<Command> {
        if matches_key(key, &keys.submit) {
            return self.submit();
        }
        if matches_key(key, &keys.toggle_source) {
            self.form.toggle_source();
        } else if matches_key(key, &keys.remove_file) {
            self.form.remove_file();
        } else if matches_key(key, &keys.next_field) {
            self.form.next_field();
        } else if matches_key(key, &keys.prev_field) {
            self.form.prev_field();
        } else if key.code == KeyCode::Enter && self.form.is_editing_path() {
            if let Err(e) = self.form.select_typed_file() {
                self.alert = Some(Alert::warning(e.to_string()));
            }
        } else if key.code == KeyCode::Enter && self.form.focused_field != FormField::Content {
            // Single-line fields: Enter moves on
            self.form.next_field();
        } else {
            self.form.focused_textarea().input(key);
        }
        Vec::new()
    }

    fn handle_results_key(&mut self, key: KeyEvent, keys: &Keybindings) -> Vec<Command> {
        if matches_key(key, &keys.copy_response) {
            return self.copy_response();
        }
        if matches_key(key, &keys.regenerate) {
            return self.regenerate();
        }
        if matches_key(key, &keys.new_classification) {
            self.reset();
        } else if matches_key(key, &keys.move_down) {
            self.results_scroll = self.results_scroll.saturating_add(1);
        } else if matches_key(key, &keys.move_up) {
            self.results_scroll = self.results_scroll.saturating_sub(1);
        }
        Vec::new()
    }

    fn handle_history_key(&mut self, key: KeyEvent, keys: &Keybindings) -> Vec<Command> {
        if self.history.loading {
            return Vec::new();
        }
        if matches_key(key, &keys.refresh) {
            return self.load_history(self.history.skip);
        }
        if matches_key(key, &keys.next_page) {
            // A short page means there is nothing after it
            if self.history.items.len() as u32 >= self.page_size {
                return self.load_history(self.history.skip + self.page_size);
            }
        } else if matches_key(key, &keys.prev_page) {
            if self.history.skip > 0 {
                return self.load_history(self.history.skip.saturating_sub(self.page_size));
            }
        } else if matches_key(key, &keys.toggle_item) {
            self.history.toggle_selected();
        } else if matches_key(key, &keys.move_down) {
            if self.history.selected < self.history.items.len().saturating_sub(1) {
                self.history.selected += 1;
            }
        } else if matches_key(key, &keys.move_up) {
            self.history.selected = self.history.selected.saturating_sub(1);
        }
        Vec::new()
    }

    fn handle_prompts_key(&mut self, key: KeyEvent, keys: &Keybindings) -> Vec<Command> {
        if let Some(editor) = &mut self.prompts.editing {
            if matches_key(key, &keys.save) {
                return self.save_prompt();
            }
            if matches_key(key, &keys.cancel) {
                self.prompts.cancel_edit();
            } else {
                editor.textarea.input(key);
            }
            return Vec::new();
        }

        if matches_key(key, &keys.refresh) {
            return self.load_prompts();
        }
        if matches_key(key, &keys.switch_prompt_tab) {
            self.prompts.tab = self.prompts.tab.toggled();
            self.prompts.selected = 0;
        } else if matches_key(key, &keys.new_prompt) {
            self.prompts.start_new();
        } else if matches_key(key, &keys.edit_prompt) {
            self.prompts.start_edit();
        } else if matches_key(key, &keys.delete_prompt) {
            self.confirm_delete_prompt();
        } else if matches_key(key, &keys.move_down) {
            if self.prompts.selected < self.prompts.visible().len().saturating_sub(1) {
                self.prompts.selected += 1;
            }
        } else if matches_key(key, &keys.move_up) {
            self.prompts.selected = self.prompts.selected.saturating_sub(1);
        }
        Vec::new()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::form::UploadSource;
    use crate::models::{Classification, Email};
    use crossterm::event::KeyModifiers;

    pub(crate) fn sample_result(email_id: i64, response: &str) -> ClassificationResult {
        ClassificationResult {
            email: Email {
                id: email_id,
                subject: Some("Status update".to_string()),
                content: "Where are we on the launch?".to_string(),
                sender: Some("lead@example.com".to_string()),
                recipient: None,
                file_name: None,
                file_type: None,
                is_deleted: false,
                created_at: "2024-06-01T09:00:00".to_string(),
                updated_at: None,
            },
            classification: Classification {
                id: 100 + email_id,
                email_id,
                category: "Produtivo".to_string(),
                subcategory: Some("projects".to_string()),
                confidence_score: 0.82,
                suggested_response: Some(response.to_string()),
                processing_time: Some(0.42),
                is_deleted: false,
                created_at: "2024-06-01T09:00:01".to_string(),
                updated_at: None,
            },
        }
    }

    pub(crate) fn history_item(id: i64) -> HistoryItem {
        HistoryItem {
            id,
            email_id: id,
            classification_id: id,
            action_type: Some("classification".to_string()),
            email_subject: Some(format!("Subject {}", id)),
            email_sender: None,
            email_content: Some("body".to_string()),
            classification_category: Some("Improdutivo".to_string()),
            classification_confidence: Some(0.7),
            classification_suggested_response: Some("Thanks!".to_string()),
            created_at: "2024-06-01T09:00:00".to_string(),
        }
    }

    pub(crate) fn prompt(id: i64, category: &str, content: &str) -> PromptItem {
        PromptItem {
            id,
            prompt_type: "classification".to_string(),
            category: category.to_string(),
            subcategory: None,
            content: content.to_string(),
            description: None,
            version: 1,
            is_active: true,
            created_at: "2024-01-01T00:00:00".to_string(),
            updated_at: None,
        }
    }

    fn press(app: &mut App<'_>, code: KeyCode) -> Vec<Command> {
        app.handle_key(
            KeyEvent::new(code, KeyModifiers::NONE),
            &Keybindings::default(),
        )
    }

    fn ctrl(app: &mut App<'_>, c: char) -> Vec<Command> {
        app.handle_key(
            KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL),
            &Keybindings::default(),
        )
    }

    fn type_text(app: &mut App<'_>, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_empty_submit_alerts_without_command() {
        let mut app = App::new(100);
        let commands = ctrl(&mut app, 's');
        assert!(commands.is_empty());
        assert!(!app.submitting);
        assert_eq!(
            app.alert.as_ref().map(|a| a.message.as_str()),
            Some("Please enter the email content")
        );
    }

    #[test]
    fn test_submit_issues_single_classify_while_pending() {
        let mut app = App::new(100);
        type_text(&mut app, "Can you send the report?");

        let commands = ctrl(&mut app, 's');
        assert!(matches!(
            commands.as_slice(),
            [Command::Classify(SubmitRequest {
                source: EmailSource::Text(text),
                ..
            })] if text == "Can you send the report?"
        ));
        assert!(app.submitting);

        // Second submit while in flight is swallowed
        assert!(ctrl(&mut app, 's').is_empty());
    }

    #[test]
    fn test_successful_submit_clears_form_and_shows_result() {
        let mut app = App::new(100);
        type_text(&mut app, "Can you send the report?");
        app.submit();

        let result = sample_result(1, "Sure, sending it now.");
        app.handle_event(AppEvent::Classified(Ok(result.clone())));

        assert!(!app.submitting);
        assert_eq!(app.tab, Tab::Results);
        assert_eq!(app.result.as_ref(), Some(&result));
        assert!(app.form.get_content().is_empty());
        assert!(app.alert.is_none());
    }

    #[test]
    fn test_failed_submit_keeps_form_and_alerts() {
        let mut app = App::new(100);
        type_text(&mut app, "Can you send the report?");
        app.submit();

        app.handle_event(AppEvent::Classified(Err(anyhow::anyhow!("connection refused"))));

        assert!(!app.submitting);
        assert_eq!(app.tab, Tab::Upload);
        assert_eq!(app.form.get_content(), "Can you send the report?");
        let alert = app.alert.as_ref().unwrap();
        assert!(alert.message.contains("connection refused"));
    }

    #[test]
    fn test_alert_blocks_other_keys_until_dismissed() {
        let mut app = App::new(100);
        ctrl(&mut app, 's');
        assert!(app.alert.is_some());

        type_text(&mut app, "abc");
        assert!(app.form.get_content().is_empty());

        press(&mut app, KeyCode::Esc);
        assert!(app.alert.is_none());
    }

    #[test]
    fn test_results_tab_disabled_without_result() {
        let mut app = App::new(100);
        assert!(app.select_tab(Tab::Results).is_empty());
        assert_eq!(app.tab, Tab::Upload);

        // Cycling skips the disabled tab
        let commands = ctrl(&mut app, 'l');
        assert_eq!(app.tab, Tab::History);
        assert_eq!(commands, vec![Command::LoadHistory { skip: 0, limit: 100 }]);
    }

    #[test]
    fn test_regenerate_replaces_only_suggested_response() {
        let mut app = App::new(100);
        app.handle_event(AppEvent::Classified(Ok(sample_result(1, "First reply"))));

        let commands = press(&mut app, KeyCode::Char('r'));
        let [Command::Regenerate { email_id, request }] = commands.as_slice() else {
            panic!("expected a regenerate command, got {:?}", commands);
        };
        assert_eq!(*email_id, 1);
        assert_eq!(
            request.source,
            EmailSource::Text("Where are we on the launch?".to_string())
        );
        assert_eq!(request.metadata.subject.as_deref(), Some("Status update"));
        assert!(app.regenerating);
        assert!(press(&mut app, KeyCode::Char('r')).is_empty());

        let mut fresh = sample_result(1, "Second reply");
        fresh.classification.category = "Improdutivo".to_string();
        fresh.classification.confidence_score = 0.1;
        app.handle_event(AppEvent::Regenerated {
            email_id: 1,
            outcome: Ok(fresh),
        });

        let shown = &app.result.as_ref().unwrap().classification;
        assert!(!app.regenerating);
        assert_eq!(shown.suggested_response.as_deref(), Some("Second reply"));
        assert_eq!(shown.category, "Produtivo");
        assert_eq!(shown.confidence_score, 0.82);
    }

    #[test]
    fn test_regenerated_reply_for_replaced_result_is_dropped() {
        let mut app = App::new(100);
        app.handle_event(AppEvent::Classified(Ok(sample_result(1, "First"))));
        app.regenerate();
        app.handle_event(AppEvent::Classified(Ok(sample_result(2, "Other email"))));

        app.handle_event(AppEvent::Regenerated {
            email_id: 1,
            outcome: Ok(sample_result(1, "Late reply")),
        });
        let shown = app.result.as_ref().unwrap();
        assert_eq!(shown.email.id, 2);
        assert_eq!(
            shown.classification.suggested_response.as_deref(),
            Some("Other email")
        );
    }

    #[test]
    fn test_new_classification_resets_to_upload() {
        let mut app = App::new(100);
        app.handle_event(AppEvent::Classified(Ok(sample_result(1, "Reply"))));
        app.form.toggle_source();

        press(&mut app, KeyCode::Char('n'));
        assert!(app.result.is_none());
        assert_eq!(app.tab, Tab::Upload);
        assert_eq!(app.form.source, UploadSource::File);
    }

    #[test]
    fn test_copy_response_requests_clipboard_write() {
        let mut app = App::new(100);
        app.handle_event(AppEvent::Classified(Ok(sample_result(1, "Copy me"))));
        let commands = press(&mut app, KeyCode::Char('c'));
        assert_eq!(commands, vec![Command::Copy("Copy me".to_string())]);

        app.on_copied("Copy me", Ok(()));
        assert!(app.copy_feedback.is_copied("Copy me"));
    }

    #[test]
    fn test_history_toggle_twice_collapses() {
        let mut app = App::new(100);
        app.select_tab(Tab::History);
        app.handle_event(AppEvent::HistoryLoaded {
            skip: 0,
            outcome: Ok(vec![history_item(10), history_item(11)]),
            total: Some(2),
        });

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        assert!(app.history.is_expanded(11));
        assert!(!app.history.is_expanded(10));

        press(&mut app, KeyCode::Enter);
        assert!(!app.history.is_expanded(11));
    }

    #[test]
    fn test_history_paging() {
        let mut app = App::new(2);
        app.select_tab(Tab::History);
        app.handle_event(AppEvent::HistoryLoaded {
            skip: 0,
            outcome: Ok(vec![history_item(1), history_item(2)]),
            total: Some(3),
        });

        let commands = press(&mut app, KeyCode::PageDown);
        assert_eq!(commands, vec![Command::LoadHistory { skip: 2, limit: 2 }]);

        app.handle_event(AppEvent::HistoryLoaded {
            skip: 2,
            outcome: Ok(vec![history_item(3)]),
            total: None,
        });
        assert_eq!(app.history.total, Some(3));
        assert!(press(&mut app, KeyCode::PageDown).is_empty());
        assert_eq!(
            press(&mut app, KeyCode::PageUp),
            vec![Command::LoadHistory { skip: 0, limit: 2 }]
        );
    }

    #[test]
    fn test_history_failure_alerts() {
        let mut app = App::new(100);
        app.select_tab(Tab::History);
        app.handle_event(AppEvent::HistoryLoaded {
            skip: 0,
            outcome: Err(anyhow::anyhow!("timeout")),
            total: None,
        });
        assert!(!app.history.loading);
        assert!(app.alert.is_some());
    }

    fn app_with_prompts() -> App<'static> {
        let mut app = App::new(100);
        let commands = app.select_tab(Tab::Prompts);
        assert_eq!(commands.len(), 2);
        app.handle_event(AppEvent::PromptsLoaded(Ok(vec![
            prompt(1, "produtivo", "Classify work email."),
            prompt(2, "improdutivo", "Classify spam."),
            prompt(3, "produtivo", "Reply to meetings."),
        ])));
        app
    }

    #[test]
    fn test_prompts_split_by_category() {
        let mut app = app_with_prompts();
        assert_eq!(app.prompts.count_for(PromptTab::Productive), 2);
        assert_eq!(app.prompts.count_for(PromptTab::Unproductive), 1);

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.prompts.tab, PromptTab::Unproductive);
        assert_eq!(app.prompts.selected_prompt().map(|p| p.id), Some(2));
    }

    #[test]
    fn test_edit_then_cancel_restores_content() {
        let mut app = app_with_prompts();
        press(&mut app, KeyCode::Char('e'));
        assert!(app.prompts.is_editing(1));

        type_text(&mut app, " Extra words");
        assert_eq!(
            app.prompts.editing.as_ref().unwrap().content(),
            "Classify work email. Extra words"
        );

        press(&mut app, KeyCode::Esc);
        assert!(app.prompts.editing.is_none());
        assert_eq!(
            app.prompts.selected_prompt().unwrap().content,
            "Classify work email."
        );
    }

    #[test]
    fn test_only_one_prompt_in_edit_mode() {
        let mut app = app_with_prompts();
        app.prompts.start_edit();
        app.prompts.selected = 1;
        app.prompts.start_edit();
        assert!(app.prompts.is_editing(3));
        assert!(!app.prompts.is_editing(1));
    }

    #[test]
    fn test_save_prompt_then_full_reload() {
        let mut app = app_with_prompts();
        app.prompts.types.types.push(crate::models::LabeledValue {
            value: "classification".to_string(),
            label: "Classification".to_string(),
        });
        press(&mut app, KeyCode::Char('e'));
        type_text(&mut app, "!");

        let commands = ctrl(&mut app, 's');
        assert_eq!(
            commands,
            vec![Command::SavePrompt {
                id: 1,
                update: PromptUpdate::content("Classify work email.!"),
            }]
        );
        assert!(ctrl(&mut app, 's').is_empty());

        let follow_up = app.handle_event(AppEvent::PromptSaved {
            id: 1,
            outcome: Ok(prompt(1, "produtivo", "Classify work email.!")),
        });
        assert!(app.prompts.editing.is_none());
        assert!(matches!(follow_up.as_slice(), [Command::LoadPrompts(_)]));
    }

    #[test]
    fn test_failed_save_keeps_editor() {
        let mut app = app_with_prompts();
        press(&mut app, KeyCode::Char('e'));
        type_text(&mut app, " Now.");
        ctrl(&mut app, 's');
        let follow_up = app.handle_event(AppEvent::PromptSaved {
            id: 1,
            outcome: Err(anyhow::anyhow!("500")),
        });
        assert!(follow_up.is_empty());
        assert!(app.prompts.is_editing(1));
        assert!(app.alert.is_some());
    }

    #[test]
    fn test_unchanged_prompt_is_not_rewritten() {
        let mut app = App::new(100);
        app.select_tab(Tab::Prompts);
        app.handle_event(AppEvent::PromptsLoaded(Ok(vec![prompt(
            7,
            "produtivo",
            "Line one\r\nLine two\n",
        )])));

        press(&mut app, KeyCode::Char('e'));
        let editor = app.prompts.editing.as_ref().unwrap();
        assert_eq!(editor.content(), "Line one\r\nLine two\n");
        assert!(!editor.is_modified());

        assert!(ctrl(&mut app, 's').is_empty());
        assert!(app.prompts.editing.is_none());
        assert!(!app.prompts.saving);
    }

    #[test]
    fn test_edited_prompt_keeps_line_endings() {
        let mut app = App::new(100);
        app.select_tab(Tab::Prompts);
        app.handle_event(AppEvent::PromptsLoaded(Ok(vec![prompt(
            7,
            "produtivo",
            "Line one\r\nLine two\n",
        )])));

        press(&mut app, KeyCode::Char('e'));
        type_text(&mut app, "Line three");
        assert_eq!(
            ctrl(&mut app, 's'),
            vec![Command::SavePrompt {
                id: 7,
                update: PromptUpdate::content("Line one\r\nLine two\nLine three"),
            }]
        );
    }

    #[test]
    fn test_new_prompt_uses_active_category() {
        let mut app = app_with_prompts();
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('n'));
        assert!(app.prompts.is_drafting());

        type_text(&mut app, "Skip promotions.");
        let commands = ctrl(&mut app, 's');
        assert_eq!(
            commands,
            vec![Command::CreatePrompt(NewPrompt::classification(
                PROMPT_UNPRODUCTIVE,
                "Skip promotions."
            ))]
        );
        assert!(app.prompts.saving);

        let follow_up = app.handle_event(AppEvent::PromptCreated(Ok(prompt(
            9,
            "improdutivo",
            "Skip promotions.",
        ))));
        assert!(app.prompts.editing.is_none());
        assert!(!app.prompts.saving);
        assert!(matches!(follow_up.first(), Some(Command::LoadPrompts(_))));
    }

    #[test]
    fn test_blank_new_prompt_alerts() {
        let mut app = app_with_prompts();
        press(&mut app, KeyCode::Char('n'));
        assert!(ctrl(&mut app, 's').is_empty());
        assert_eq!(
            app.alert.as_ref().map(|a| a.message.as_str()),
            Some("Please enter the prompt content")
        );
        assert!(app.prompts.is_drafting());
    }

    #[test]
    fn test_failed_create_keeps_draft() {
        let mut app = app_with_prompts();
        press(&mut app, KeyCode::Char('n'));
        type_text(&mut app, "Draft");
        ctrl(&mut app, 's');
        let follow_up =
            app.handle_event(AppEvent::PromptCreated(Err(anyhow::anyhow!("422"))));
        assert!(follow_up.is_empty());
        assert!(app.prompts.is_drafting());
        assert!(app.alert.is_some());
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let mut app = app_with_prompts();
        assert!(press(&mut app, KeyCode::Char('d')).is_empty());
        assert!(app.alert.is_some());

        // Esc keeps the prompt
        assert!(press(&mut app, KeyCode::Esc).is_empty());

        press(&mut app, KeyCode::Char('d'));
        let commands = press(&mut app, KeyCode::Enter);
        assert_eq!(commands, vec![Command::DeletePrompt { id: 1 }]);
    }

    #[test]
    fn test_paste_path_in_file_mode() {
        let file = tempfile::Builder::new().suffix(".exe").tempfile().unwrap();
        let mut app = App::new(100);
        ctrl(&mut app, 't');
        app.handle_paste(&file.path().display().to_string());
        assert_eq!(
            app.alert.as_ref().map(|a| a.message.as_str()),
            Some("Please select a .txt or .pdf file")
        );
    }
}
