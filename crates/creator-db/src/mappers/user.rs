//! User entity <-> model mapper

use creator_core::entities::User;
use creator_core::value_objects::Snowflake;

use crate::models::UserModel;

/// Convert UserModel to User entity
impl From<UserModel> for User {
    fn from(model: UserModel) -> Self {
        User {
            id: Snowflake::new(model.id),
            username: model.username,
            display_name: model.display_name,
            avatar: model.avatar,
            is_online: model.is_online,
            last_seen: model.last_seen,
            created_at: model.created_at,
        }
    }
}

/// Convert User entity reference to values for database insertion
pub struct UserInsert<'a> {
    pub id: i64,
    pub username: &'a str,
    pub display_name: Option<&'a str>,
    pub avatar: Option<&'a str>,
}

impl<'a> UserInsert<'a> {
    pub fn new(user: &'a User) -> Self {
        Self {
            id: user.id.into_inner(),
            username: &user.username,
            display_name: user.display_name.as_deref(),
            avatar: user.avatar.as_deref(),
        }
    }
}
