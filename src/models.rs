use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub text: String,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_after_link: Option<String>,
}

impl Task {
    pub fn create(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.to_string(),
            completed: false,
            description: None,
            link_text: None,
            link_url: None,
            text_after_link: None,
        })
    }
}

// Identity is the id; text edits never change it.
impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Task {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Active,
    Completed,
    Archived,
    Deleted,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Active,
        Collection::Completed,
        Collection::Archived,
        Collection::Deleted,
    ];

    pub fn storage_key(self) -> &'static str {
        match self {
            Collection::Active => "tasks",
            Collection::Completed => "completedTasks",
            Collection::Archived => "archivedTasks",
            Collection::Deleted => "deletedTasks",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Collection::Active => "Tasks",
            Collection::Completed => "Completed",
            Collection::Archived => "Archived",
            Collection::Deleted => "Deleted",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OpenSection {
    Completed,
    Archived,
    Deleted,
}

impl OpenSection {
    pub fn collection(self) -> Collection {
        match self {
            OpenSection::Completed => Collection::Completed,
            OpenSection::Archived => Collection::Archived,
            OpenSection::Deleted => Collection::Deleted,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Settings {
    #[serde(default)]
    pub location: Option<Coordinates>,
    #[serde(default)]
    pub locality_language: Option<String>,
    #[serde(default = "default_show_clock")]
    pub show_clock: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            location: None,
            locality_language: None,
            show_clock: default_show_clock(),
        }
    }
}

fn default_show_clock() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SettingsFile {
    pub schema_version: u32,
    pub settings: Settings,
}
