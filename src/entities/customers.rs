use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(
    rs_type = "String",
    db_type = "Enum",
    enum_name = "customer_segment"
)]
#[serde(rename_all = "snake_case")]
pub enum CustomerSegment {
    #[sea_orm(string_value = "vip")]
    Vip,
    #[sea_orm(string_value = "frequent")]
    Frequent,
    #[sea_orm(string_value = "occasional")]
    Occasional,
    #[sea_orm(string_value = "inactive")]
    Inactive,
    #[sea_orm(string_value = "new")]
    New,
}

impl std::fmt::Display for CustomerSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CustomerSegment::Vip => write!(f, "vip"),
            CustomerSegment::Frequent => write!(f, "frequent"),
            CustomerSegment::Occasional => write!(f, "occasional"),
            CustomerSegment::Inactive => write!(f, "inactive"),
            CustomerSegment::New => write!(f, "new"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub store_id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub total_orders: i32,
    pub total_spent_cents: i64,
    pub last_purchase_at: Option<DateTime<Utc>>,
    pub score: i32,
    pub segment: CustomerSegment,
    pub visit_frequency_days: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
