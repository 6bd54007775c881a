use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const SETTINGS_FILE: &str = "settings.toml";
pub const API_URL_ENV: &str = "MAILSORT_API_URL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub keybindings: Keybindings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    /// `limit` sent with history and prompt listings.
    pub page_size: u32,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            timeout_secs: 60,
            page_size: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Keybindings {
    pub quit: Vec<String>,
    pub next_tab: Vec<String>,
    pub prev_tab: Vec<String>,
    pub show_upload: Vec<String>,
    pub show_results: Vec<String>,
    pub show_history: Vec<String>,
    pub show_prompts: Vec<String>,
    pub next_field: Vec<String>,
    pub prev_field: Vec<String>,
    pub toggle_source: Vec<String>,
    pub remove_file: Vec<String>,
    pub submit: Vec<String>,
    pub move_up: Vec<String>,
    pub move_down: Vec<String>,
    pub next_page: Vec<String>,
    pub prev_page: Vec<String>,
    pub toggle_item: Vec<String>,
    pub copy_response: Vec<String>,
    pub regenerate: Vec<String>,
    pub new_classification: Vec<String>,
    pub new_prompt: Vec<String>,
    pub edit_prompt: Vec<String>,
    pub delete_prompt: Vec<String>,
    pub switch_prompt_tab: Vec<String>,
    pub save: Vec<String>,
    pub cancel: Vec<String>,
    pub refresh: Vec<String>,
    pub dismiss: Vec<String>,
}

impl Default for Keybindings {
    fn default() -> Self {
        Self {
            quit: vec!["ctrl-q".to_string(), "ctrl-c".to_string()],
            next_tab: vec!["ctrl-Right".to_string(), "ctrl-l".to_string()],
            prev_tab: vec!["ctrl-Left".to_string(), "ctrl-h".to_string()],
            show_upload: vec!["F1".to_string()],
            show_results: vec!["F2".to_string()],
            show_history: vec!["F3".to_string()],
            show_prompts: vec!["F4".to_string()],
            next_field: vec!["Tab".to_string()],
            prev_field: vec!["BackTab".to_string()],
            toggle_source: vec!["ctrl-t".to_string()],
            remove_file: vec!["ctrl-x".to_string()],
            submit: vec!["ctrl-s".to_string()],
            move_up: vec!["k".to_string(), "Up".to_string()],
            move_down: vec!["j".to_string(), "Down".to_string()],
            next_page: vec!["PageDown".to_string()],
            prev_page: vec!["PageUp".to_string()],
            toggle_item: vec!["Enter".to_string(), " ".to_string()],
            copy_response: vec!["c".to_string()],
            regenerate: vec!["r".to_string()],
            new_classification: vec!["n".to_string()],
            new_prompt: vec!["n".to_string()],
            edit_prompt: vec!["e".to_string()],
            delete_prompt: vec!["d".to_string()],
            switch_prompt_tab: vec!["Tab".to_string()],
            save: vec!["ctrl-s".to_string()],
            cancel: vec!["Esc".to_string()],
            refresh: vec!["ctrl-r".to_string()],
            dismiss: vec!["Enter".to_string(), "Esc".to_string()],
        }
    }
}

pub fn parse_key_string(key_str: &str) -> (KeyCode, KeyModifiers) {
    let mut parts: Vec<&str> = key_str.split('-').collect();
    let mut modifiers = KeyModifiers::empty();

    // The last segment is the key itself, everything before it a modifier
    let base_key_str = parts.pop().unwrap_or("");

    for part in parts {
        match part.to_lowercase().as_str() {
            "ctrl" => modifiers.insert(KeyModifiers::CONTROL),
            "alt" => modifiers.insert(KeyModifiers::ALT),
            "shift" => modifiers.insert(KeyModifiers::SHIFT),
            "cmd" | "command" | "super" => modifiers.insert(KeyModifiers::SUPER),
            "meta" => modifiers.insert(KeyModifiers::META),
            _ => {}
        }
    }

    let code = match base_key_str {
        "Backspace" => KeyCode::Backspace,
        "Enter" => KeyCode::Enter,
        "Left" => KeyCode::Left,
        "Right" => KeyCode::Right,
        "Up" => KeyCode::Up,
        "Down" => KeyCode::Down,
        "Tab" => KeyCode::Tab,
        "BackTab" => KeyCode::BackTab,
        "Esc" => KeyCode::Esc,
        "PageUp" => KeyCode::PageUp,
        "PageDown" => KeyCode::PageDown,
        "Home" => KeyCode::Home,
        "End" => KeyCode::End,
        "Delete" => KeyCode::Delete,
        " " => KeyCode::Char(' '),
        s if s.len() > 1 && s.starts_with('F') => match s[1..].parse::<u8>() {
            Ok(n) => KeyCode::F(n),
            Err(_) => KeyCode::Null,
        },
        s => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyCode::Char(c),
                _ => KeyCode::Null,
            }
        }
    };

    (code, modifiers)
}

pub fn matches_key(event: KeyEvent, bindings: &[String]) -> bool {
    bindings.iter().any(|b| {
        let (code, modifiers) = parse_key_string(b);
        event.code == code && event.modifiers.contains(modifiers)
    })
}

impl Config {
    /// Reads `settings.toml` from the working directory, falling back to
    /// defaults when it is missing or malformed.
    pub fn load() -> Self {
        let path = Path::new(SETTINGS_FILE);
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("ignoring {}: {:#}", SETTINGS_FILE, e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Env var first, then an explicit `--api-url` value on top.
    pub fn apply_overrides(&mut self, env_url: Option<String>, cli_url: Option<String>) {
        if let Some(url) = env_url.filter(|u| !u.trim().is_empty()) {
            self.api.base_url = url;
        }
        if let Some(url) = cli_url {
            self.api.base_url = url;
        }
    }
}
