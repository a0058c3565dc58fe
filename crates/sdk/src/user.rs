use crate::{APIResponse, BaseClient};
use planner_api_structs::*;
use reqwest::StatusCode;
use std::sync::Arc;

#[derive(Clone)]
pub struct UserClient {
    base: Arc<BaseClient>,
}

pub type SendEmailInput = send_email::RequestBody;

impl UserClient {
    pub(crate) fn new(base: Arc<BaseClient>) -> Self {
        Self { base }
    }

    /// The `User` behind the session token, created on first use
    pub async fn me(&self) -> APIResponse<get_me::APIResponse> {
        self.base.get("me".into(), StatusCode::OK).await
    }

    pub async fn send_email(&self, input: SendEmailInput) -> APIResponse<send_email::APIResponse> {
        self.base
            .post(input, "notifications/email".into(), StatusCode::OK)
            .await
    }
}
