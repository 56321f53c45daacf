use diesel::prelude::*;
use jiff_diesel::DateTime;
use uuid::Uuid;

#[derive(Debug, Queryable, Selectable, Identifiable, Clone)]
#[diesel(table_name = crate::schema::products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Stored filename under the products upload folder, empty when unset
    pub banner: String,
    pub category_id: Uuid,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Product {
    pub fn has_banner(&self) -> bool {
        !self.banner.is_empty()
    }
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::products)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub category_id: Uuid,
}

/// Partial update; `None` fields are left untouched
#[derive(Debug, AsChangeset, Clone, Default)]
#[diesel(table_name = crate::schema::products)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub banner: Option<String>,
}
