mod base;
mod event;
mod status;
mod user;

use event::CalendarEventClient;
use status::StatusClient;
use std::sync::Arc;
use user::UserClient;

pub(crate) use base::{APIResponse, BaseClient};

pub use base::APIError;
pub use event::{CreateEventInput, DeleteEventInput, GetEventInput, UpdateEventInput};
pub use planner_api_structs::dtos::*;
pub use planner_domain::ID;
pub use user::SendEmailInput;

/// Planner Server SDK
///
/// The SDK contains methods for interacting with the Planner server
/// API on behalf of the user owning the session token.
#[derive(Clone)]
pub struct PlannerSDK {
    pub event: CalendarEventClient,
    pub status: StatusClient,
    pub user: UserClient,
}

impl PlannerSDK {
    pub fn new<T: Into<String>>(address: String, session_token: T) -> Self {
        let mut base = BaseClient::new(address);
        let session_token = session_token.into();
        if !session_token.is_empty() {
            base.set_session_token(session_token);
        }
        let base = Arc::new(base);
        let event = CalendarEventClient::new(base.clone());
        let status = StatusClient::new(base.clone());
        let user = UserClient::new(base);

        Self {
            event,
            status,
            user,
        }
    }
}
