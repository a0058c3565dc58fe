use crate::shared::entity::{Entity, ID};
use uuid::Uuid;

// Namespace for deriving `User` ids from identity provider subjects
const USER_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a4e_9b0d_4c7e_8f35_d2a1_7c4b_90e6);

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: ID,
    /// Subject the identity provider issued the session for
    pub subject: String,
    /// Contact address receiving event reminders
    pub email: String,
    pub name: Option<String>,
    pub created: i64,
}

impl User {
    pub fn new(subject: &str, email: String, name: Option<String>, created: i64) -> Self {
        Self {
            id: Self::create_id(subject),
            subject: subject.to_string(),
            email,
            name,
            created,
        }
    }

    pub fn create_id(subject: &str) -> ID {
        ID::derived(&USER_ID_NAMESPACE, subject)
    }
}

impl Entity for User {
    fn id(&self) -> &ID {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_is_derived_from_subject() {
        let user = User::new("github|42", "jane@example.com".into(), None, 0);
        assert_eq!(user.id, User::create_id("github|42"));
        assert_ne!(user.id, User::create_id("github|43"));
    }
}
