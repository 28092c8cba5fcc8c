use serde::{Deserialize, Serialize};

super::entity_id!(
    /// Type-safe identifier for Users.
    UserId,
    "user"
);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub name: String,
    pub email: String,
}
