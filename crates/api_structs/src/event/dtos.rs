use planner_domain::{CalendarEvent, ID};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEventDTO {
    pub id: ID,
    pub user_id: ID,
    pub title: String,
    pub description: String,
    pub start_ts: i64,
    pub reminder: bool,
    pub reminder_sent_at: Option<i64>,
    pub created: i64,
    pub updated: i64,
}

impl CalendarEventDTO {
    pub fn new(event: CalendarEvent) -> Self {
        Self {
            id: event.id,
            user_id: event.user_id,
            title: event.title,
            description: event.description,
            start_ts: event.start_ts,
            reminder: event.reminder_enabled,
            reminder_sent_at: event.reminder_sent_at,
            created: event.created,
            updated: event.updated,
        }
    }
}
