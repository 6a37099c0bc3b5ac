use crate::entities::{CustomerSegment, customer_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerResponse {
    pub id: i64,
    pub store_id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub total_orders: i32,
    /// 累计消费（货币单位）
    pub total_spent: f64,
    pub last_purchase_at: Option<DateTime<Utc>>,
    pub score: i32,
    pub segment: CustomerSegment,
    pub visit_frequency_days: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<customer_entity::Model> for CustomerResponse {
    fn from(m: customer_entity::Model) -> Self {
        Self {
            id: m.id,
            store_id: m.store_id,
            name: m.name,
            phone: m.phone,
            total_orders: m.total_orders,
            total_spent: m.total_spent_cents as f64 / 100.0,
            last_purchase_at: m.last_purchase_at,
            score: m.score,
            segment: m.segment,
            visit_frequency_days: m.visit_frequency_days,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateCustomerRequest {
    #[schema(example = 1)]
    pub store_id: i64,
    #[schema(example = "Maria Silva")]
    pub name: String,
    #[schema(example = "+5511999999999")]
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecordPurchaseRequest {
    /// 消费金额（货币单位）
    #[schema(example = 42.5)]
    pub amount: f64,
    /// 购买时间，缺省为当前时间
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CustomerQuery {
    pub store_id: i64,
    pub segment: Option<CustomerSegment>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

/// 评分预览请求：数值字段接受数字、数字字符串或 null
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ScorePreviewRequest {
    #[serde(default)]
    #[schema(value_type = Option<f64>, example = 3)]
    pub total_orders: serde_json::Value,
    #[serde(default)]
    #[schema(value_type = Option<f64>, example = "150.00")]
    pub total_spent: serde_json::Value,
    #[schema(example = "2024-03-10T12:00:00Z")]
    pub last_purchase_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScoreResult {
    pub score: i32,
    pub segment: CustomerSegment,
    pub visit_frequency_days: Option<f64>,
}
