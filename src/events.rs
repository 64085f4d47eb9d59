use crate::models::{OpenSection, Task};

pub const EVENT_STATE_UPDATED: &str = "state_updated";

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatePayload {
    pub tasks: Vec<Task>,
    pub completed_tasks: Vec<Task>,
    pub archived_tasks: Vec<Task>,
    pub deleted_tasks: Vec<Task>,
    pub open_section: Option<OpenSection>,
}
