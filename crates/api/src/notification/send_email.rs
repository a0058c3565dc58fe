use crate::{
    error::PlannerError,
    shared::{
        auth::protect_route,
        usecase::{execute, UseCase},
    },
};
use actix_web::{web, HttpRequest, HttpResponse};
use planner_api_structs::send_email::*;
use planner_infra::PlannerContext;
use std::time::Duration;
use tokio::time::timeout;

pub async fn send_email_controller(
    http_req: HttpRequest,
    body: web::Json<RequestBody>,
    ctx: web::Data<PlannerContext>,
) -> Result<HttpResponse, PlannerError> {
    protect_route(&http_req, &ctx).await?;

    let body = body.0;
    let usecase = SendEmailUseCase {
        recipient: body.email,
        subject: body.subject,
        text: body.text,
    };

    execute(usecase, &ctx)
        .await
        .map(|_| {
            HttpResponse::Ok().json(APIResponse {
                message: "Email sent successfully".into(),
            })
        })
        .map_err(PlannerError::from)
}

/// Sends an ad-hoc email through the configured notifier
#[derive(Debug)]
pub struct SendEmailUseCase {
    pub recipient: String,
    pub subject: String,
    pub text: String,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    NoRecipient,
    DeliveryFailed,
}

impl From<UseCaseError> for PlannerError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::NoRecipient => Self::BadClientData("No recipients defined".into()),
            UseCaseError::DeliveryFailed => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for SendEmailUseCase {
    type Response = ();

    type Error = UseCaseError;

    const NAME: &'static str = "SendEmail";

    async fn execute(&mut self, ctx: &PlannerContext) -> Result<Self::Response, Self::Error> {
        let recipient = self.recipient.trim();
        if recipient.is_empty() {
            return Err(UseCaseError::NoRecipient);
        }

        let dispatch_timeout = Duration::from_secs(ctx.config.reminders.dispatch_timeout_secs);
        let delivery = ctx
            .notifier
            .send_notification(recipient, &self.subject, &self.text);
        match timeout(dispatch_timeout, delivery).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) | Err(_) => Err(UseCaseError::DeliveryFailed),
        }
    }
}
