use crate::entities::{ChecklistStatus, checklist_entity, deadline_setting_entity};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 清单类型；除内置的开店/闭店/额外清单外允许自定义
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChecklistType {
    Abertura,
    Fechamento,
    Bonus,
    Custom(String),
}

impl ChecklistType {
    pub fn as_str(&self) -> &str {
        match self {
            ChecklistType::Abertura => "abertura",
            ChecklistType::Fechamento => "fechamento",
            ChecklistType::Bonus => "bonus",
            ChecklistType::Custom(s) => s,
        }
    }

    /// 首尾空白不参与匹配
    pub fn from_str_lossy(s: &str) -> Self {
        match s.trim() {
            "abertura" => ChecklistType::Abertura,
            "fechamento" => ChecklistType::Fechamento,
            "bonus" => ChecklistType::Bonus,
            other => ChecklistType::Custom(other.to_string()),
        }
    }
}

impl From<String> for ChecklistType {
    fn from(s: String) -> Self {
        Self::from_str_lossy(&s)
    }
}

impl From<ChecklistType> for String {
    fn from(t: ChecklistType) -> Self {
        t.as_str().to_string()
    }
}

impl std::fmt::Display for ChecklistType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 截止时间配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DeadlineSetting {
    #[schema(value_type = String, example = "abertura")]
    pub checklist_type: ChecklistType,
    pub deadline_hour: u32,
    pub deadline_minute: u32,
    pub is_next_day: bool,
    /// None 视为启用
    pub is_active: Option<bool>,
}

impl DeadlineSetting {
    pub fn is_enabled(&self) -> bool {
        self.is_active != Some(false)
    }
}

impl From<deadline_setting_entity::Model> for DeadlineSetting {
    fn from(m: deadline_setting_entity::Model) -> Self {
        Self {
            checklist_type: ChecklistType::from_str_lossy(&m.checklist_type),
            // 负数会被映射为越界值，在计算截止时间时自然无效
            deadline_hour: u32::try_from(m.deadline_hour).unwrap_or(u32::MAX),
            deadline_minute: u32::try_from(m.deadline_minute).unwrap_or(u32::MAX),
            is_next_day: m.is_next_day,
            is_active: m.is_active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DeadlineInfo {
    #[schema(value_type = String, example = "2024-03-10T19:30:00-03:00")]
    pub deadline: DateTime<FixedOffset>,
    pub passed: bool,
    pub remaining_ms: i64,
    #[schema(example = "1h 5min")]
    pub label: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpsertDeadlineSettingRequest {
    #[schema(example = 1)]
    pub store_id: i64,
    #[schema(example = "fechamento")]
    pub checklist_type: String,
    #[schema(example = 2)]
    pub deadline_hour: i16,
    #[schema(example = 0)]
    pub deadline_minute: i16,
    pub is_next_day: bool,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StoreQuery {
    pub store_id: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeadlineQuery {
    pub store_id: i64,
    #[schema(example = "2024-03-10")]
    pub date: String,
    #[schema(example = "abertura")]
    pub checklist_type: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChecklistListQuery {
    pub store_id: i64,
    #[schema(example = "2024-03-10")]
    pub date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OpenChecklistRequest {
    #[schema(example = 1)]
    pub store_id: i64,
    #[schema(example = "2024-03-10")]
    pub date: String,
    #[schema(example = "abertura")]
    pub checklist_type: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CurrentChecklistResponse {
    #[schema(value_type = String, example = "abertura")]
    pub checklist_type: ChecklistType,
    pub date: NaiveDate,
    pub deadline: Option<DeadlineInfo>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AutoCloseResponse {
    pub should_auto_close: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChecklistResponse {
    pub id: i64,
    pub store_id: i64,
    #[schema(value_type = String, example = "abertura")]
    pub checklist_type: ChecklistType,
    pub reference_date: NaiveDate,
    pub status: ChecklistStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl From<checklist_entity::Model> for ChecklistResponse {
    fn from(m: checklist_entity::Model) -> Self {
        Self {
            id: m.id,
            store_id: m.store_id,
            checklist_type: ChecklistType::from_str_lossy(&m.checklist_type),
            reference_date: m.reference_date,
            status: m.status,
            completed_at: m.completed_at,
            closed_at: m.closed_at,
        }
    }
}
