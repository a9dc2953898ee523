use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Database-backed channel template definition; `config_json` holds the same
/// payload shape as the file-based templates.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales_channel_templates")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub channel_name: String,
    pub template_type: String,
    pub config_json: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
