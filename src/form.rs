use ratatui::style::Style;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tui_textarea::TextArea;

/// Backend rejects anything above this.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
pub const ALLOWED_EXTENSIONS: &[&str] = &["txt", "pdf"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("Please enter the email content")]
    EmptyContent,
    #[error("Please select a file")]
    NoFileSelected,
    #[error("Please select a .txt or .pdf file")]
    UnsupportedFileType,
    #[error("File not found: {0}")]
    FileNotFound(String),
    #[error("File is too large (max 10MB)")]
    FileTooLarge,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum UploadSource {
    #[default]
    Text,
    File,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum FormField {
    Subject,
    Sender,
    Recipient,
    #[default]
    Content,
}

impl FormField {
    fn next(self) -> Self {
        match self {
            FormField::Subject => FormField::Sender,
            FormField::Sender => FormField::Recipient,
            FormField::Recipient => FormField::Content,
            FormField::Content => FormField::Subject,
        }
    }

    fn prev(self) -> Self {
        match self {
            FormField::Subject => FormField::Content,
            FormField::Sender => FormField::Subject,
            FormField::Recipient => FormField::Sender,
            FormField::Content => FormField::Recipient,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
}

impl SelectedFile {
    pub fn mime_type(&self) -> &'static str {
        mime_for(&self.path)
    }

    pub fn size_label(&self) -> String {
        format!("{:.1} KB", self.size as f64 / 1024.0)
    }
}

pub fn mime_for(path: &Path) -> &'static str {
    match extension_of(path).as_deref() {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Checks type, existence and size. Type is checked first so a bad
/// extension is reported even for paths that do not exist.
pub fn validate_file(path: &Path) -> Result<SelectedFile, FormError> {
    match extension_of(path) {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => {}
        _ => return Err(FormError::UnsupportedFileType),
    }

    let metadata = std::fs::metadata(path)
        .map_err(|_| FormError::FileNotFound(path.display().to_string()))?;
    if !metadata.is_file() {
        return Err(FormError::FileNotFound(path.display().to_string()));
    }
    if metadata.len() > MAX_FILE_SIZE {
        return Err(FormError::FileTooLarge);
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(SelectedFile {
        path: path.to_path_buf(),
        name,
        size: metadata.len(),
    })
}

/// Optional fields sent along with the email. Blank inputs become `None`
/// and are left out of the multipart body; anything else is sent as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailMetadata {
    pub subject: Option<String>,
    pub sender: Option<String>,
    pub recipient: Option<String>,
}

impl EmailMetadata {
    pub fn new(subject: &str, sender: &str, recipient: &str) -> Self {
        Self {
            subject: non_blank(subject),
            sender: non_blank(sender),
            recipient: non_blank(recipient),
        }
    }
}

fn non_blank(s: &str) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailSource {
    Text(String),
    File(SelectedFile),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    pub source: EmailSource,
    pub metadata: EmailMetadata,
}

pub struct UploadForm<'a> {
    pub source: UploadSource,
    pub subject: TextArea<'a>,
    pub sender: TextArea<'a>,
    pub recipient: TextArea<'a>,
    pub content: TextArea<'a>,
    /// Path being typed while in file mode.
    pub file_path: TextArea<'a>,
    pub selected_file: Option<SelectedFile>,
    pub focused_field: FormField,
}

impl<'a> Default for UploadForm<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> UploadForm<'a> {
    pub fn new() -> Self {
        Self {
            source: UploadSource::Text,
            subject: new_field("Email subject"),
            sender: new_field("sender@example.com"),
            recipient: new_field("recipient@example.com"),
            content: new_field("Paste the email you want to classify..."),
            file_path: new_field("Path to a .txt or .pdf file, then Enter (or drop it here)"),
            selected_file: None,
            focused_field: FormField::Content,
        }
    }

    pub fn get_subject(&self) -> String {
        self.subject.lines().join("\n")
    }

    pub fn get_sender(&self) -> String {
        self.sender.lines().join("\n")
    }

    pub fn get_recipient(&self) -> String {
        self.recipient.lines().join("\n")
    }

    pub fn get_content(&self) -> String {
        self.content.lines().join("\n")
    }

    pub fn get_file_path(&self) -> String {
        self.file_path.lines().join("\n")
    }

    pub fn toggle_source(&mut self) {
        self.source = match self.source {
            UploadSource::Text => UploadSource::File,
            UploadSource::File => UploadSource::Text,
        };
    }

    pub fn next_field(&mut self) {
        self.focused_field = self.focused_field.next();
    }

    pub fn prev_field(&mut self) {
        self.focused_field = self.focused_field.prev();
    }

    /// Textarea behind the focused field. In file mode the content slot
    /// holds the path input.
    pub fn focused_textarea(&mut self) -> &mut TextArea<'a> {
        match self.focused_field {
            FormField::Subject => &mut self.subject,
            FormField::Sender => &mut self.sender,
            FormField::Recipient => &mut self.recipient,
            FormField::Content => match self.source {
                UploadSource::Text => &mut self.content,
                UploadSource::File => &mut self.file_path,
            },
        }
    }

    pub fn is_editing_path(&self) -> bool {
        self.source == UploadSource::File && self.focused_field == FormField::Content
    }

    pub fn select_file(&mut self, path: &Path) -> Result<(), FormError> {
        let file = validate_file(path)?;
        self.selected_file = Some(file);
        self.file_path = new_field("Path to a .txt or .pdf file, then Enter (or drop it here)");
        Ok(())
    }

    /// Selects whatever path is in the path input.
    pub fn select_typed_file(&mut self) -> Result<(), FormError> {
        let typed = self.get_file_path();
        let path = clean_pasted_path(&typed);
        if path.is_empty() {
            return Err(FormError::NoFileSelected);
        }
        self.select_file(Path::new(&path))
    }

    pub fn remove_file(&mut self) {
        self.selected_file = None;
    }

    /// Pasted text goes to the content box in text mode; in file mode it is
    /// taken as a dropped file path.
    pub fn paste(&mut self, text: &str) -> Result<(), FormError> {
        match self.source {
            UploadSource::Text => {
                self.focused_field = FormField::Content;
                self.content.insert_str(text);
                Ok(())
            }
            UploadSource::File => {
                let path = clean_pasted_path(text);
                self.select_file(Path::new(&path))
            }
        }
    }

    pub fn build_request(&self) -> Result<SubmitRequest, FormError> {
        let metadata = EmailMetadata::new(
            &self.get_subject(),
            &self.get_sender(),
            &self.get_recipient(),
        );
        let source = match self.source {
            UploadSource::Text => {
                let content = self.get_content();
                if content.trim().is_empty() {
                    return Err(FormError::EmptyContent);
                }
                EmailSource::Text(content)
            }
            UploadSource::File => match &self.selected_file {
                Some(file) => EmailSource::File(file.clone()),
                None => return Err(FormError::NoFileSelected),
            },
        };
        Ok(SubmitRequest { source, metadata })
    }

    /// Empties every field; the chosen source mode is kept.
    pub fn clear(&mut self) {
        let source = self.source;
        *self = Self::new();
        self.source = source;
    }
}

fn new_field<'a>(placeholder: &str) -> TextArea<'a> {
    let mut textarea = TextArea::default();
    textarea.set_cursor_line_style(Style::default());
    textarea.set_placeholder_text(placeholder.to_string());
    textarea
}

/// Terminals quote dropped paths in different ways.
fn clean_pasted_path(raw: &str) -> String {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| trimmed.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
        .unwrap_or(trimmed);
    let unprefixed = unquoted.strip_prefix("file://").unwrap_or(unquoted);
    unprefixed.replace("\\ ", " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn text_form(content: &str) -> UploadForm<'static> {
        let mut form = UploadForm::new();
        form.content.insert_str(content);
        form
    }

    #[test]
    fn test_blank_content_is_rejected() {
        let form = text_form("   \n  ");
        assert_eq!(form.build_request(), Err(FormError::EmptyContent));
    }

    #[test]
    fn test_text_request_carries_metadata() {
        let mut form = text_form("Can we move the meeting?");
        form.subject.insert_str("Meeting");
        form.sender.insert_str("  bob@example.com ");
        form.recipient.insert_str("   ");

        let request = form.build_request().unwrap();
        assert_eq!(
            request.source,
            EmailSource::Text("Can we move the meeting?".to_string())
        );
        assert_eq!(request.metadata.subject.as_deref(), Some("Meeting"));
        assert_eq!(
            request.metadata.sender.as_deref(),
            Some("  bob@example.com ")
        );
        assert_eq!(request.metadata.recipient, None);
    }

    #[test]
    fn test_file_mode_requires_a_file() {
        let mut form = text_form("ignored in file mode");
        form.toggle_source();
        assert_eq!(form.build_request(), Err(FormError::NoFileSelected));
    }

    #[test]
    fn test_disallowed_file_type_is_rejected() {
        let file = tempfile::Builder::new().suffix(".docx").tempfile().unwrap();
        let mut form = UploadForm::new();
        form.toggle_source();
        assert_eq!(
            form.select_file(file.path()),
            Err(FormError::UnsupportedFileType)
        );
        assert!(form.selected_file.is_none());
    }

    #[test]
    fn test_missing_file_is_rejected() {
        let mut form = UploadForm::new();
        let result = form.select_file(Path::new("/definitely/not/here.txt"));
        assert!(matches!(result, Err(FormError::FileNotFound(_))));
    }

    #[test]
    fn test_oversized_file_is_rejected() {
        let file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        file.as_file().set_len(MAX_FILE_SIZE + 1).unwrap();

        let mut form = UploadForm::new();
        form.toggle_source();
        assert_eq!(form.select_file(file.path()), Err(FormError::FileTooLarge));
        assert!(form.selected_file.is_none());
    }

    #[test]
    fn test_file_at_size_limit_is_accepted() {
        let file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.as_file().set_len(MAX_FILE_SIZE).unwrap();
        assert_eq!(validate_file(file.path()).unwrap().size, MAX_FILE_SIZE);
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("notes.txt");
        std::fs::create_dir(&folder).unwrap();
        assert!(matches!(
            validate_file(&folder),
            Err(FormError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_selected_file_builds_file_request() {
        let mut file = tempfile::Builder::new().suffix(".TXT").tempfile().unwrap();
        write!(file, "Hello team").unwrap();

        let mut form = UploadForm::new();
        form.toggle_source();
        form.select_file(file.path()).unwrap();

        let request = form.build_request().unwrap();
        match request.source {
            EmailSource::File(selected) => {
                assert_eq!(selected.size, 10);
                assert_eq!(selected.mime_type(), "text/plain");
            }
            other => panic!("unexpected source {:?}", other),
        }
    }

    #[test]
    fn test_paste_in_file_mode_selects_dropped_path() {
        let file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        let mut form = UploadForm::new();
        form.toggle_source();

        let dropped = format!("'{}'\n", file.path().display());
        form.paste(&dropped).unwrap();
        assert_eq!(
            form.selected_file.as_ref().map(|f| f.path.as_path()),
            Some(file.path())
        );
    }

    #[test]
    fn test_paste_in_text_mode_fills_content() {
        let mut form = UploadForm::new();
        form.focused_field = FormField::Subject;
        form.paste("Line one\nLine two").unwrap();
        assert_eq!(form.get_content(), "Line one\nLine two");
        assert_eq!(form.focused_field, FormField::Content);
    }

    #[test]
    fn test_clear_keeps_source_mode() {
        let mut form = text_form("something");
        form.subject.insert_str("subject");
        form.toggle_source();
        form.clear();

        assert_eq!(form.source, UploadSource::File);
        assert!(form.get_content().is_empty());
        assert!(form.get_subject().is_empty());
        assert!(form.selected_file.is_none());
    }

    #[test]
    fn test_field_focus_cycles() {
        let mut form = UploadForm::new();
        form.next_field();
        assert_eq!(form.focused_field, FormField::Subject);
        form.prev_field();
        assert_eq!(form.focused_field, FormField::Content);
    }

    #[test]
    fn test_clean_pasted_path() {
        assert_eq!(clean_pasted_path("'/tmp/a b.txt'"), "/tmp/a b.txt");
        assert_eq!(clean_pasted_path("file:///tmp/x.pdf"), "/tmp/x.pdf");
        assert_eq!(clean_pasted_path("/tmp/a\\ b.txt "), "/tmp/a b.txt");
    }
}
