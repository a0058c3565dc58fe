use crate::{error::PlannerError, shared::usecase::UseCase};
use planner_domain::{SessionClaims, User};
use planner_infra::PlannerContext;

/// Makes sure the `User` of a session exists and carries the contact details
/// of the latest session
#[derive(Debug)]
pub struct SyncUserUseCase {
    pub claims: SessionClaims,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    MissingEmail,
    StorageError,
}

impl From<UseCaseError> for PlannerError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::MissingEmail => {
                Self::Unauthorized("The session does not carry an email address".into())
            }
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for SyncUserUseCase {
    type Response = User;

    type Error = UseCaseError;

    const NAME: &'static str = "SyncUser";

    async fn execute(&mut self, ctx: &PlannerContext) -> Result<Self::Response, Self::Error> {
        let email = self.claims.email.trim();
        if email.is_empty() {
            return Err(UseCaseError::MissingEmail);
        }

        let user_id = User::create_id(&self.claims.sub);
        match ctx.repos.users.find(&user_id).await {
            Some(mut user) => {
                if user.email != email || user.name != self.claims.name {
                    user.email = email.to_string();
                    user.name = self.claims.name.clone();
                    ctx.repos
                        .users
                        .save(&user)
                        .await
                        .map_err(|_| UseCaseError::StorageError)?;
                }
                Ok(user)
            }
            None => {
                let user = User::new(
                    &self.claims.sub,
                    email.to_string(),
                    self.claims.name.clone(),
                    ctx.sys.get_timestamp_millis(),
                );
                ctx.repos
                    .users
                    .insert(&user)
                    .await
                    .map_err(|_| UseCaseError::StorageError)?;
                Ok(user)
            }
        }
    }
}
