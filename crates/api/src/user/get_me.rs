use crate::{error::PlannerError, shared::auth::protect_route};
use actix_web::{web, HttpRequest, HttpResponse};
use planner_api_structs::get_me::*;
use planner_infra::PlannerContext;

pub async fn get_me_controller(
    http_req: HttpRequest,
    ctx: web::Data<PlannerContext>,
) -> Result<HttpResponse, PlannerError> {
    let user = protect_route(&http_req, &ctx).await?;

    Ok(HttpResponse::Ok().json(APIResponse::new(user)))
}
