use diesel::prelude::*;
use jiff_diesel::DateTime;
use uuid::Uuid;

/// User model for reading from database
/// Derives Queryable for SELECT operations and Selectable for type-safe column selection
#[derive(Debug, Queryable, Selectable, Clone)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// argon2 PHC string
    pub password: String,
    /// Stored filename under the users upload folder, empty when unset
    pub avatar: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl User {
    pub fn has_avatar(&self) -> bool {
        !self.avatar.is_empty()
    }
}

/// NewUser model for inserting new records
#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Partial update; `None` fields are left untouched
#[derive(Debug, AsChangeset, Clone, Default)]
#[diesel(table_name = crate::schema::users)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub password: Option<String>,
    pub avatar: Option<String>,
}
