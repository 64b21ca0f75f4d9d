use chrono::{DateTime, Utc};
use serde::{de::IgnoredAny, Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionType {
    #[serde(rename = "text", alias = "short-text")]
    ShortText,
    #[serde(rename = "textarea", alias = "long-text")]
    LongText,
    #[serde(rename = "multiple-choice", alias = "single-choice")]
    SingleChoice,
    #[serde(rename = "checkbox", alias = "multi-choice")]
    MultiChoice,
    #[serde(rename = "dropdown")]
    Dropdown,
    #[serde(rename = "file", alias = "file-upload")]
    FileUpload,
}

impl QuestionType {
    /// Types whose `options` list is shown to the respondent.
    pub fn is_choice(self) -> bool {
        matches!(
            self,
            QuestionType::SingleChoice | QuestionType::MultiChoice | QuestionType::Dropdown
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub title: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_video: Option<String>,
    #[serde(default)]
    pub questions: Vec<Question>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields a caller may set on a form. The server-owned `id`, `createdAt` and
/// `updatedAt` are accepted so a fetched form can be sent back as-is, but their
/// values are ignored. Anything else in the body is rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FormPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub theme: Option<String>,
    pub header_image: Option<String>,
    pub header_video: Option<String>,
    pub questions: Option<Vec<Question>>,
    #[serde(default, rename = "id")]
    pub ignored_id: Option<IgnoredAny>,
    #[serde(default, rename = "createdAt")]
    pub ignored_created_at: Option<IgnoredAny>,
    #[serde(default, rename = "updatedAt")]
    pub ignored_updated_at: Option<IgnoredAny>,
}

/// A submitted answer: one value, or every option ticked on a checkbox question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Many(Vec<String>),
    Single(String),
}

impl Answer {
    pub fn values(&self) -> &[String] {
        match self {
            Answer::Many(values) => values,
            Answer::Single(value) => std::slice::from_ref(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub id: String,
    pub form_id: String,
    #[serde(default)]
    pub answers: BTreeMap<String, Answer>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResponsePayload {
    pub form_id: String,
    #[serde(default)]
    pub answers: BTreeMap<String, Answer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub date: String,
    pub count: u64,
}

/// Answer value -> number of times it was given, per question id.
pub type QuestionTallies = BTreeMap<String, BTreeMap<String, u64>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormStats {
    pub total_responses: usize,
    pub submission_timeline: Vec<TimelineEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_stats: Option<QuestionTallies>,
}

#[derive(Debug, Deserialize)]
pub struct Base64Upload {
    pub file: Option<String>,
    pub filename: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
    pub filename: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
