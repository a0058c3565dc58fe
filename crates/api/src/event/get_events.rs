use crate::{
    error::PlannerError,
    shared::{
        auth::protect_route,
        usecase::{execute, UseCase},
    },
};
use actix_web::{web, HttpRequest, HttpResponse};
use planner_api_structs::get_events::*;
use planner_domain::{CalendarEvent, ID};
use planner_infra::PlannerContext;

pub async fn get_events_controller(
    http_req: HttpRequest,
    ctx: web::Data<PlannerContext>,
) -> Result<HttpResponse, PlannerError> {
    let user = protect_route(&http_req, &ctx).await?;

    let usecase = GetEventsUseCase { user_id: user.id };

    execute(usecase, &ctx)
        .await
        .map(|events| HttpResponse::Ok().json(APIResponse::new(events)))
        .map_err(PlannerError::from)
}

/// All the events of a user, ordered by when they start
#[derive(Debug)]
pub struct GetEventsUseCase {
    pub user_id: ID,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    StorageError,
}

impl From<UseCaseError> for PlannerError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for GetEventsUseCase {
    type Response = Vec<CalendarEvent>;

    type Error = UseCaseError;

    const NAME: &'static str = "GetEvents";

    async fn execute(&mut self, ctx: &PlannerContext) -> Result<Self::Response, Self::Error> {
        ctx.repos
            .events
            .find_by_user(&self.user_id)
            .await
            .map_err(|_| UseCaseError::StorageError)
    }
}
