//! Photostate entity, one row per cached photo or thumbnail

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "photostate")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub file_name: String,
    pub mime: String,
    pub payload: Vec<u8>,
    pub is_on_s3: bool,
    pub sync_operation: String, // "insert", "delete" or "stay"
    pub is_stored_by_user: bool,
    pub expiration_date: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
