use crate::{
    error::PlannerError,
    shared::{
        auth::protect_route,
        guard::Guard,
        usecase::{execute, UseCase},
    },
};
use actix_web::{web, HttpRequest, HttpResponse};
use planner_api_structs::delete_event::*;
use planner_domain::{CalendarEvent, ID};
use planner_infra::PlannerContext;

pub async fn delete_event_controller(
    http_req: HttpRequest,
    path_params: web::Path<PathParams>,
    ctx: web::Data<PlannerContext>,
) -> Result<HttpResponse, PlannerError> {
    let user = protect_route(&http_req, &ctx).await?;
    let event_id = Guard::against_malformed_id(&path_params.event_id)?;

    let usecase = DeleteEventUseCase {
        user_id: user.id,
        event_id,
    };

    execute(usecase, &ctx)
        .await
        .map(|event| HttpResponse::Ok().json(APIResponse::new(event)))
        .map_err(PlannerError::from)
}

#[derive(Debug)]
pub struct DeleteEventUseCase {
    pub user_id: ID,
    pub event_id: ID,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    NotFound(ID),
}

impl From<UseCaseError> for PlannerError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::NotFound(event_id) => Self::NotFound(format!(
                "The calendar event with id: {}, was not found.",
                event_id
            )),
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for DeleteEventUseCase {
    type Response = CalendarEvent;

    type Error = UseCaseError;

    const NAME: &'static str = "DeleteEvent";

    async fn execute(&mut self, ctx: &PlannerContext) -> Result<Self::Response, Self::Error> {
        match ctx.repos.events.find(&self.event_id).await {
            Some(event) if event.user_id == self.user_id => ctx
                .repos
                .events
                .delete(&event.id)
                .await
                .ok_or_else(|| UseCaseError::NotFound(self.event_id.clone())),
            _ => Err(UseCaseError::NotFound(self.event_id.clone())),
        }
    }
}
