use crate::{error::PlannerError, shared::usecase::execute, user::SyncUserUseCase};
use actix_web::HttpRequest;
use planner_domain::{decode_session_token, User};
use planner_infra::PlannerContext;
use tracing::warn;

fn parse_authtoken_header(token_header_value: &str) -> Option<&str> {
    let mut parts = token_header_value.splitn(2, ' ');
    match (parts.next(), parts.next()) {
        (Some(scheme), Some(token)) if scheme.eq_ignore_ascii_case("bearer") => {
            let token = token.trim();
            if token.is_empty() {
                None
            } else {
                Some(token)
            }
        }
        _ => None,
    }
}

/// Resolves the `User` behind the session token of the request.
///
/// The `User` is created the first time a valid session is seen, and its
/// contact details follow the claims of later sessions.
pub async fn protect_route(req: &HttpRequest, ctx: &PlannerContext) -> Result<User, PlannerError> {
    let token = req
        .headers()
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(parse_authtoken_header)
        .ok_or_else(|| {
            PlannerError::Unauthorized(
                "Expected an `authorization` header with a bearer session token".into(),
            )
        })?;

    let claims = decode_session_token(token, &ctx.config.session_secret).map_err(|e| {
        warn!("Rejected session token: {:?}", e);
        PlannerError::Unauthorized("Invalid or expired session token".into())
    })?;

    execute(SyncUserUseCase { claims }, ctx)
        .await
        .map_err(PlannerError::from)
}
