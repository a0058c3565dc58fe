use crate::{APIResponse, BaseClient, ID};
use planner_api_structs::*;
use reqwest::StatusCode;
use std::sync::Arc;

#[derive(Clone)]
pub struct CalendarEventClient {
    base: Arc<BaseClient>,
}

pub type CreateEventInput = create_event::RequestBody;

pub struct GetEventInput {
    pub event_id: ID,
}

pub struct DeleteEventInput {
    pub event_id: ID,
}

#[derive(Default)]
pub struct UpdateEventInput {
    pub event_id: ID,
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_ts: Option<i64>,
    pub reminder: Option<bool>,
}

impl CalendarEventClient {
    pub(crate) fn new(base: Arc<BaseClient>) -> Self {
        Self { base }
    }

    pub async fn create(&self, input: CreateEventInput) -> APIResponse<create_event::APIResponse> {
        self.base
            .post(input, "events".into(), StatusCode::CREATED)
            .await
    }

    pub async fn get(&self, input: GetEventInput) -> APIResponse<get_event::APIResponse> {
        self.base
            .get(format!("events/{}", input.event_id), StatusCode::OK)
            .await
    }

    /// All events of the signed in `User`, ordered by when they start
    pub async fn list(&self) -> APIResponse<get_events::APIResponse> {
        self.base.get("events".into(), StatusCode::OK).await
    }

    pub async fn update(&self, input: UpdateEventInput) -> APIResponse<update_event::APIResponse> {
        let body = update_event::RequestBody {
            title: input.title,
            description: input.description,
            start_ts: input.start_ts,
            reminder: input.reminder,
        };
        self.base
            .put(body, format!("events/{}", input.event_id), StatusCode::OK)
            .await
    }

    pub async fn delete(&self, input: DeleteEventInput) -> APIResponse<delete_event::APIResponse> {
        self.base
            .delete(format!("events/{}", input.event_id), StatusCode::OK)
            .await
    }
}
