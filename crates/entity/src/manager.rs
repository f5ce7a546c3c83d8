use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A property manager listing parcels for retrofit consideration.
///
/// The `unsubscribe_token` is the sole credential for the unauthenticated
/// preferences surface. It is generated once at creation and never rotated.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "managers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub name: String,

    #[sea_orm(unique)]
    pub email: String,

    pub phone: String,

    pub prefer_email: bool,
    pub prefer_phone: bool,

    /// Opaque hex bearer token, equality-compare only.
    #[sea_orm(unique)]
    pub unsubscribe_token: String,

    /// Unix timestamp (seconds).
    pub created_at: i64,

    /// Unix timestamp (seconds).
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
