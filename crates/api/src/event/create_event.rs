use crate::error::PlannerError;
use crate::shared::{
    auth::protect_route,
    usecase::{execute, UseCase},
};
use actix_web::{web, HttpRequest, HttpResponse};
use planner_api_structs::create_event::*;
use planner_domain::{CalendarEvent, User};
use planner_infra::PlannerContext;

pub async fn create_event_controller(
    http_req: HttpRequest,
    body: web::Json<RequestBody>,
    ctx: web::Data<PlannerContext>,
) -> Result<HttpResponse, PlannerError> {
    let user = protect_route(&http_req, &ctx).await?;

    let body = body.0;
    let usecase = CreateEventUseCase {
        user,
        title: body.title,
        description: body.description.unwrap_or_default(),
        start_ts: body.start_ts,
        reminder_enabled: body.reminder.unwrap_or(false),
    };

    execute(usecase, &ctx)
        .await
        .map(|event| HttpResponse::Created().json(APIResponse::new(event)))
        .map_err(PlannerError::from)
}

#[derive(Debug)]
pub struct CreateEventUseCase {
    pub user: User,
    pub title: String,
    pub description: String,
    pub start_ts: i64,
    pub reminder_enabled: bool,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    InvalidTitle,
    StorageError,
}

impl From<UseCaseError> for PlannerError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::InvalidTitle => {
                Self::BadClientData("The title of the event must not be empty".into())
            }
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for CreateEventUseCase {
    type Response = CalendarEvent;

    type Error = UseCaseError;

    const NAME: &'static str = "CreateEvent";

    async fn execute(&mut self, ctx: &PlannerContext) -> Result<Self::Response, Self::Error> {
        if !CalendarEvent::is_valid_title(&self.title) {
            return Err(UseCaseError::InvalidTitle);
        }

        let e = CalendarEvent::new(
            self.user.id.clone(),
            self.title.trim().to_string(),
            self.description.clone(),
            self.start_ts,
            self.reminder_enabled,
            ctx.sys.get_timestamp_millis(),
        );

        ctx.repos
            .events
            .insert(&e)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        Ok(e)
    }
}
