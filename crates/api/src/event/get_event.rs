use crate::{
    error::PlannerError,
    shared::{
        auth::protect_route,
        guard::Guard,
        usecase::{execute, UseCase},
    },
};
use actix_web::{web, HttpRequest, HttpResponse};
use planner_api_structs::get_event::*;
use planner_domain::{CalendarEvent, ID};
use planner_infra::PlannerContext;

pub async fn get_event_controller(
    http_req: HttpRequest,
    path_params: web::Path<PathParams>,
    ctx: web::Data<PlannerContext>,
) -> Result<HttpResponse, PlannerError> {
    let user = protect_route(&http_req, &ctx).await?;
    let event_id = Guard::against_malformed_id(&path_params.event_id)?;

    let usecase = GetEventUseCase {
        event_id,
        user_id: user.id,
    };

    execute(usecase, &ctx)
        .await
        .map(|calendar_event| HttpResponse::Ok().json(APIResponse::new(calendar_event)))
        .map_err(PlannerError::from)
}

#[derive(Debug)]
pub struct GetEventUseCase {
    pub event_id: ID,
    pub user_id: ID,
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
impl UseCase for GetEventUseCase {
    type Response = CalendarEvent;

    type Error = UseCaseError;

    const NAME: &'static str = "GetEvent";

    async fn execute(&mut self, ctx: &PlannerContext) -> Result<Self::Response, Self::Error> {
        match ctx.repos.events.find(&self.event_id).await {
            Some(event) if event.user_id == self.user_id => Ok(event),
            _ => Err(UseCaseError::NotFound(self.event_id.clone())),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[actix_web::test]
    async fn only_owner_can_get_event() {
        let ctx = PlannerContext::create_inmemory();
        let owner = ID::default();
        let event = CalendarEvent::new(owner.clone(), "Gym".into(), "".into(), 0, false, 0);
        ctx.repos.events.insert(&event).await.unwrap();

        let mut usecase = GetEventUseCase {
            event_id: event.id.clone(),
            user_id: owner,
        };
        assert_eq!(usecase.execute(&ctx).await, Ok(event.clone()));

        let mut usecase = GetEventUseCase {
            event_id: event.id.clone(),
            user_id: ID::default(),
        };
        assert_eq!(
            usecase.execute(&ctx).await,
            Err(UseCaseError::NotFound(event.id))
        );
    }
}
