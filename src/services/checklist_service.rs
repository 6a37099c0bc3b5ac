use crate::entities::{ChecklistStatus, checklist_entity as checklists, deadline_setting_entity as ds};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::{
    business_today, get_current_checklist_type, get_deadline_info, should_auto_close,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveEnum, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::collections::HashMap;
use std::sync::Arc;

const MAX_TYPE_LEN: usize = 32;

#[derive(Clone)]
pub struct ChecklistService {
    pool: Arc<DatabaseConnection>,
}

impl ChecklistService {
    pub fn new(pool: Arc<DatabaseConnection>) -> Self {
        Self { pool }
    }

    /// 门店的截止时间配置（含停用项）
    pub async fn list_settings(&self, store_id: i64) -> AppResult<Vec<DeadlineSetting>> {
        let models = ds::Entity::find()
            .filter(ds::Column::StoreId.eq(store_id))
            .order_by_asc(ds::Column::ChecklistType)
            .all(self.pool.as_ref())
            .await?;
        Ok(models.into_iter().map(DeadlineSetting::from).collect())
    }

    pub async fn upsert_setting(
        &self,
        request: UpsertDeadlineSettingRequest,
    ) -> AppResult<DeadlineSetting> {
        let checklist_type = request.checklist_type.trim();
        if checklist_type.is_empty() || checklist_type.len() > MAX_TYPE_LEN {
            return Err(AppError::ValidationError(format!(
                "Checklist type must be between 1 and {MAX_TYPE_LEN} characters"
            )));
        }
        if !(0..=23).contains(&request.deadline_hour) {
            return Err(AppError::ValidationError(
                "deadline_hour must be between 0 and 23".to_string(),
            ));
        }
        if !(0..=59).contains(&request.deadline_minute) {
            return Err(AppError::ValidationError(
                "deadline_minute must be between 0 and 59".to_string(),
            ));
        }

        let am = ds::ActiveModel {
            store_id: Set(request.store_id),
            checklist_type: Set(checklist_type.to_string()),
            deadline_hour: Set(request.deadline_hour),
            deadline_minute: Set(request.deadline_minute),
            is_next_day: Set(request.is_next_day),
            is_active: Set(request.is_active),
            updated_at: Set(Some(Utc::now())),
            ..Default::default()
        };
        ds::Entity::insert(am)
            .on_conflict(
                OnConflict::columns([ds::Column::StoreId, ds::Column::ChecklistType])
                    .update_columns([
                        ds::Column::DeadlineHour,
                        ds::Column::DeadlineMinute,
                        ds::Column::IsNextDay,
                        ds::Column::IsActive,
                        ds::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(self.pool.as_ref())
            .await?;

        log::info!(
            "Deadline for '{}' at store {} set to {:02}:{:02} (next day: {})",
            checklist_type,
            request.store_id,
            request.deadline_hour,
            request.deadline_minute,
            request.is_next_day
        );

        Ok(DeadlineSetting {
            checklist_type: ChecklistType::from_str_lossy(checklist_type),
            deadline_hour: request.deadline_hour as u32,
            deadline_minute: request.deadline_minute as u32,
            is_next_day: request.is_next_day,
            is_active: request.is_active,
        })
    }

    pub async fn deadline_info(
        &self,
        store_id: i64,
        date: NaiveDate,
        checklist_type: &ChecklistType,
        now: DateTime<Utc>,
    ) -> AppResult<Option<DeadlineInfo>> {
        let settings = self.list_settings(store_id).await?;
        Ok(get_deadline_info(date, checklist_type, &settings, now))
    }

    pub async fn current_checklist(
        &self,
        store_id: i64,
        now: DateTime<Utc>,
    ) -> AppResult<CurrentChecklistResponse> {
        let settings = self.list_settings(store_id).await?;
        let today = business_today(now);
        let checklist_type = get_current_checklist_type(&settings, now);
        let deadline = get_deadline_info(today, &checklist_type, &settings, now);
        Ok(CurrentChecklistResponse {
            checklist_type,
            date: today,
            deadline,
        })
    }

    pub async fn should_auto_close(
        &self,
        store_id: i64,
        date: NaiveDate,
        checklist_type: &ChecklistType,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let settings = self.list_settings(store_id).await?;
        Ok(should_auto_close(date, checklist_type, &settings, now))
    }

    /// 开启某日的清单；同一门店/类型/日期重复调用返回已有记录
    pub async fn open_checklist(
        &self,
        store_id: i64,
        date: NaiveDate,
        checklist_type: &ChecklistType,
    ) -> AppResult<ChecklistResponse> {
        let type_str = checklist_type.as_str();
        if type_str.is_empty() || type_str.len() > MAX_TYPE_LEN {
            return Err(AppError::ValidationError(format!(
                "Checklist type must be between 1 and {MAX_TYPE_LEN} characters"
            )));
        }

        let am = checklists::ActiveModel {
            store_id: Set(store_id),
            checklist_type: Set(type_str.to_string()),
            reference_date: Set(date),
            status: Set(ChecklistStatus::Open),
            ..Default::default()
        };
        checklists::Entity::insert(am)
            .on_conflict(
                OnConflict::columns([
                    checklists::Column::StoreId,
                    checklists::Column::ChecklistType,
                    checklists::Column::ReferenceDate,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(self.pool.as_ref())
            .await?;

        let model = checklists::Entity::find()
            .filter(checklists::Column::StoreId.eq(store_id))
            .filter(checklists::Column::ChecklistType.eq(type_str))
            .filter(checklists::Column::ReferenceDate.eq(date))
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::InternalError("Checklist missing after insert".into()))?;
        Ok(model.into())
    }

    pub async fn complete_checklist(
        &self,
        checklist_id: i64,
        now: DateTime<Utc>,
    ) -> AppResult<ChecklistResponse> {
        let model = self.find_checklist(checklist_id).await?;
        if model.status == ChecklistStatus::Open {
            // 只更新仍为 open 的行
            let res = checklists::Entity::update_many()
                .col_expr(
                    checklists::Column::Status,
                    Expr::val(ChecklistStatus::Completed).as_enum(ChecklistStatus::name()),
                )
                .col_expr(checklists::Column::CompletedAt, Expr::value(now))
                .col_expr(checklists::Column::UpdatedAt, Expr::value(now))
                .filter(checklists::Column::Id.eq(checklist_id))
                .filter(checklists::Column::Status.eq(ChecklistStatus::Open))
                .exec(self.pool.as_ref())
                .await?;
            if res.rows_affected == 0 {
                log::warn!("Checklist {checklist_id} changed status before completion");
            }
        }

        // 重新读取，以数据库中的最终状态为准
        let model = self.find_checklist(checklist_id).await?;
        match model.status {
            ChecklistStatus::AutoClosed => Err(AppError::ValidationError(
                "Checklist was closed after its deadline".to_string(),
            )),
            _ => Ok(model.into()),
        }
    }

    async fn find_checklist(&self, checklist_id: i64) -> AppResult<checklists::Model> {
        checklists::Entity::find_by_id(checklist_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Checklist not found".to_string()))
    }

    pub async fn list_checklists(
        &self,
        store_id: i64,
        date: Option<NaiveDate>,
    ) -> AppResult<Vec<ChecklistResponse>> {
        let mut select = checklists::Entity::find().filter(checklists::Column::StoreId.eq(store_id));
        if let Some(d) = date {
            select = select.filter(checklists::Column::ReferenceDate.eq(d));
        }
        let models = select
            .order_by_desc(checklists::Column::ReferenceDate)
            .order_by_asc(checklists::Column::ChecklistType)
            .all(self.pool.as_ref())
            .await?;
        Ok(models.into_iter().map(ChecklistResponse::from).collect())
    }

    /// 自动关闭已过截止时间且仍在关闭窗口内的清单；返回关闭数量
    pub async fn auto_close_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        // 关闭窗口最多覆盖到昨天
        let earliest = business_today(now) - Duration::days(1);
        let open = checklists::Entity::find()
            .filter(checklists::Column::Status.eq(ChecklistStatus::Open))
            .filter(checklists::Column::ReferenceDate.gte(earliest))
            .all(self.pool.as_ref())
            .await?;

        let mut settings_by_store: HashMap<i64, Vec<DeadlineSetting>> = HashMap::new();
        let mut closed = 0u64;
        for model in open {
            if !settings_by_store.contains_key(&model.store_id) {
                let settings = self.list_settings(model.store_id).await?;
                settings_by_store.insert(model.store_id, settings);
            }
            let settings = settings_by_store
                .get(&model.store_id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let checklist_type = ChecklistType::from_str_lossy(&model.checklist_type);
            if !is_due_for_auto_close(model.reference_date, &checklist_type, settings, now) {
                continue;
            }

            // 期间已被人工完成的清单不会被覆盖
            let res = checklists::Entity::update_many()
                .col_expr(
                    checklists::Column::Status,
                    Expr::val(ChecklistStatus::AutoClosed).as_enum(ChecklistStatus::name()),
                )
                .col_expr(checklists::Column::ClosedAt, Expr::value(now))
                .col_expr(checklists::Column::UpdatedAt, Expr::value(now))
                .filter(checklists::Column::Id.eq(model.id))
                .filter(checklists::Column::Status.eq(ChecklistStatus::Open))
                .exec(self.pool.as_ref())
                .await?;
            if res.rows_affected == 1 {
                log::info!("Checklist {} ({checklist_type}) auto-closed", model.id);
                closed += 1;
            }
        }
        Ok(closed)
    }
}

fn is_due_for_auto_close(
    date: NaiveDate,
    checklist_type: &ChecklistType,
    settings: &[DeadlineSetting],
    now: DateTime<Utc>,
) -> bool {
    should_auto_close(date, checklist_type, settings, now)
        && get_deadline_info(date, checklist_type, settings, now).is_some_and(|info| info.passed)
}
