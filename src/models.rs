use chrono::{DateTime, Local, NaiveDateTime};
use inflections::case::to_title_case;
use serde::{Deserialize, Serialize};

pub const PRODUCTIVE: &str = "Produtivo";
pub const UNPRODUCTIVE: &str = "Improdutivo";

/// Prompt categories use the lowercase spelling.
pub const PROMPT_PRODUCTIVE: &str = "produtivo";
pub const PROMPT_UNPRODUCTIVE: &str = "improdutivo";

pub const PROMPT_TYPE_CLASSIFICATION: &str = "classification";
pub const SUBCATEGORY_GENERAL: &str = "general";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Email {
    pub id: i64,
    pub subject: Option<String>,
    pub content: String,
    pub sender: Option<String>,
    pub recipient: Option<String>,
    pub file_name: Option<String>,
    pub file_type: Option<String>,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub id: i64,
    pub email_id: i64,
    pub category: String,
    pub subcategory: Option<String>,
    #[serde(default)]
    pub confidence_score: f64,
    pub suggested_response: Option<String>,
    pub processing_time: Option<f64>,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl Classification {
    pub fn is_productive(&self) -> bool {
        is_productive(&self.category)
    }

    pub fn confidence_percent(&self) -> u8 {
        confidence_percent(self.confidence_score)
    }

    pub fn processing_time_label(&self) -> String {
        match self.processing_time {
            Some(secs) => format!("{:.2}s", secs),
            None => "N/A".to_string(),
        }
    }
}

/// Body returned by both upload endpoints and by `GET /emails/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub email: Email,
    pub classification: Classification,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: i64,
    pub email_id: i64,
    pub classification_id: i64,
    pub action_type: Option<String>,
    pub email_subject: Option<String>,
    pub email_sender: Option<String>,
    pub email_content: Option<String>,
    pub classification_category: Option<String>,
    pub classification_confidence: Option<f64>,
    pub classification_suggested_response: Option<String>,
    pub created_at: String,
}

impl HistoryItem {
    pub fn is_productive(&self) -> bool {
        self.classification_category
            .as_deref()
            .map(is_productive)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptItem {
    pub id: i64,
    #[serde(rename = "type")]
    pub prompt_type: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub content: String,
    pub description: Option<String>,
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: Option<String>,
}

/// Partial update; unset fields are left out of the request body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptUpdate {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub prompt_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl PromptUpdate {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPrompt {
    #[serde(rename = "type")]
    pub prompt_type: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

impl NewPrompt {
    /// Active classification prompt in the `general` subcategory. The
    /// listing only returns active prompts, so an inactive one would vanish
    /// after the reload.
    pub fn classification(category: &str, content: impl Into<String>) -> Self {
        Self {
            prompt_type: PROMPT_TYPE_CLASSIFICATION.to_string(),
            category: category.to_string(),
            subcategory: Some(SUBCATEGORY_GENERAL.to_string()),
            content: content.into(),
            description: None,
            is_active: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PromptQuery {
    pub skip: u32,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledValue {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptTypes {
    #[serde(default)]
    pub types: Vec<LabeledValue>,
    #[serde(default)]
    pub categories: Vec<LabeledValue>,
    #[serde(default)]
    pub subcategories: Vec<LabeledValue>,
}

impl PromptTypes {
    /// Backend label for `value`, or a title-cased rendering of it.
    pub fn label_for(&self, value: &str) -> String {
        self.types
            .iter()
            .chain(&self.categories)
            .chain(&self.subcategories)
            .find(|v| v.value == value)
            .map(|v| v.label.clone())
            .unwrap_or_else(|| humanize(value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Count {
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn from_percent(percent: u8) -> Self {
        if percent >= 80 {
            ConfidenceLevel::High
        } else if percent >= 60 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

pub fn is_productive(category: &str) -> bool {
    category.trim().eq_ignore_ascii_case(PRODUCTIVE)
}

pub fn confidence_percent(score: f64) -> u8 {
    (score.clamp(0.0, 1.0) * 100.0).round() as u8
}

/// `sales_business` -> `Sales Business`
pub fn humanize(value: &str) -> String {
    to_title_case(&value.replace('_', " "))
}

pub fn subcategory_label(subcategory: &str) -> String {
    let known = match subcategory {
        "meetings" => "Meetings",
        "projects" => "Projects",
        "sales_business" => "Sales & Business",
        "customer_service" => "Customer Service",
        "financial" => "Financial",
        "hr_recruitment" => "HR & Recruitment",
        "technology" => "Technology",
        "strategy_planning" => "Strategy & Planning",
        "urgent_important" => "Urgent & Important",
        "spam_promotions" => "Spam & Promotions",
        "personal_greetings" => "Personal Greetings",
        "scams_fraud" => "Scams & Fraud",
        "adult_content" => "Adult Content",
        "social_media" => "Social Media",
        _ => return humanize(subcategory),
    };
    known.to_string()
}

/// Formats a backend timestamp for display. The backend emits naive
/// ISO-8601 values; RFC 3339 is accepted too. Unknown formats pass through.
pub fn format_timestamp(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string();
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive.format("%Y-%m-%d %H:%M").to_string();
    }
    raw.to_string()
}
