use crate::{
    error::PlannerError,
    shared::{
        auth::protect_route,
        guard::Guard,
        usecase::{execute, UseCase},
    },
};
use actix_web::{web, HttpRequest, HttpResponse};
use planner_api_structs::update_event::*;
use planner_domain::{CalendarEvent, ID};
use planner_infra::PlannerContext;

pub async fn update_event_controller(
    http_req: HttpRequest,
    body: web::Json<RequestBody>,
    path_params: web::Path<PathParams>,
    ctx: web::Data<PlannerContext>,
) -> Result<HttpResponse, PlannerError> {
    let user = protect_route(&http_req, &ctx).await?;
    let event_id = Guard::against_malformed_id(&path_params.event_id)?;

    let body = body.0;
    let usecase = UpdateEventUseCase {
        user_id: user.id,
        event_id,
        title: body.title,
        description: body.description,
        start_ts: body.start_ts,
        reminder_enabled: body.reminder,
    };

    execute(usecase, &ctx)
        .await
        .map(|event| HttpResponse::Ok().json(APIResponse::new(event)))
        .map_err(PlannerError::from)
}

/// Partial update of an event, fields left as `None` are kept
#[derive(Debug, Default)]
pub struct UpdateEventUseCase {
    pub user_id: ID,
    pub event_id: ID,
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_ts: Option<i64>,
    pub reminder_enabled: Option<bool>,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    NotFound(ID),
    InvalidTitle,
    StorageError,
}

impl From<UseCaseError> for PlannerError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::NotFound(event_id) => Self::NotFound(format!(
                "The calendar event with id: {}, was not found.",
                event_id
            )),
            UseCaseError::InvalidTitle => {
                Self::BadClientData("The title of the event must not be empty".into())
            }
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for UpdateEventUseCase {
    type Response = CalendarEvent;

    type Error = UseCaseError;

    const NAME: &'static str = "UpdateEvent";

    async fn execute(&mut self, ctx: &PlannerContext) -> Result<Self::Response, Self::Error> {
        let mut e = match ctx.repos.events.find(&self.event_id).await {
            Some(event) if event.user_id == self.user_id => event,
            _ => return Err(UseCaseError::NotFound(self.event_id.clone())),
        };

        if let Some(title) = &self.title {
            if !CalendarEvent::is_valid_title(title) {
                return Err(UseCaseError::InvalidTitle);
            }
            e.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            e.description = description.clone();
        }
        if let Some(start_ts) = self.start_ts {
            e.set_start_ts(start_ts);
        }
        if let Some(enabled) = self.reminder_enabled {
            e.set_reminder_enabled(enabled);
        }
        e.updated = ctx.sys.get_timestamp_millis();

        ctx.repos
            .events
            .save(&e)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        Ok(e)
    }
}
