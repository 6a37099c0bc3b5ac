use crate::entities::{CustomerSegment, customer_entity as customers};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::{ScoreInput, compute_score};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;

const SCORE_REFRESH_BATCH: u64 = 500;
const MAX_NAME_LEN: usize = 120;
/// 单笔消费上限（货币单位），保证换算成分后累加不会溢出 bigint
const MAX_PURCHASE_AMOUNT: f64 = 1_000_000_000.0;

#[derive(Clone)]
pub struct CustomerService {
    pool: Arc<DatabaseConnection>,
}

impl CustomerService {
    pub fn new(pool: Arc<DatabaseConnection>) -> Self {
        Self { pool }
    }

    pub async fn create_customer(&self, request: CreateCustomerRequest) -> AppResult<CustomerResponse> {
        let name = request.name.trim();
        if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
            return Err(AppError::ValidationError(format!(
                "Customer name must be between 1 and {MAX_NAME_LEN} characters"
            )));
        }

        let model = customers::ActiveModel {
            store_id: Set(request.store_id),
            name: Set(name.to_string()),
            phone: Set(request.phone.filter(|p| !p.trim().is_empty())),
            total_orders: Set(0),
            total_spent_cents: Set(0),
            last_purchase_at: Set(None),
            score: Set(0),
            segment: Set(CustomerSegment::New),
            visit_frequency_days: Set(None),
            ..Default::default()
        }
        .insert(self.pool.as_ref())
        .await?;

        log::info!("Customer {} created for store {}", model.id, model.store_id);
        Ok(model.into())
    }

    pub async fn get_customer(&self, customer_id: i64) -> AppResult<CustomerResponse> {
        self.find_model(customer_id).await.map(CustomerResponse::from)
    }

    async fn find_model(&self, customer_id: i64) -> AppResult<customers::Model> {
        customers::Entity::find_by_id(customer_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))
    }

    /// 门店客户列表，按评分从高到低
    pub async fn list_customers(
        &self,
        query: CustomerQuery,
    ) -> AppResult<PaginatedResponse<CustomerResponse>> {
        let params = PaginationParams::new(query.page, query.page_size);

        let mut select =
            customers::Entity::find().filter(customers::Column::StoreId.eq(query.store_id));
        if let Some(segment) = query.segment {
            select = select.filter(customers::Column::Segment.eq(segment));
        }

        let total = select.clone().count(self.pool.as_ref()).await?;
        let models = select
            .order_by_desc(customers::Column::Score)
            .order_by_asc(customers::Column::Id)
            .limit(params.page_size())
            .offset(params.offset())
            .all(self.pool.as_ref())
            .await?;
        let items = models.into_iter().map(CustomerResponse::from).collect();

        Ok(PaginatedResponse::new(items, &params, total))
    }

    /// 记录一次消费。
    ///
    /// 累加在数据库端以单条 UPDATE 完成，同一客户的并发消费不会互相覆盖。
    /// 评分不在这里重算，由 `recalculate_score` / 定时任务负责。
    pub async fn record_purchase(
        &self,
        customer_id: i64,
        amount: f64,
        date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> AppResult<CustomerResponse> {
        if !amount.is_finite() || !(0.0..=MAX_PURCHASE_AMOUNT).contains(&amount) {
            return Err(AppError::ValidationError(format!(
                "Purchase amount must be between 0 and {MAX_PURCHASE_AMOUNT}"
            )));
        }
        let amount_cents = (amount * 100.0).round() as i64;
        let purchased_at = date.unwrap_or(now);

        let res = customers::Entity::update_many()
            .col_expr(
                customers::Column::TotalSpentCents,
                Expr::col(customers::Column::TotalSpentCents).add(amount_cents),
            )
            .col_expr(
                customers::Column::TotalOrders,
                Expr::col(customers::Column::TotalOrders).add(1),
            )
            .col_expr(customers::Column::LastPurchaseAt, Expr::value(purchased_at))
            .col_expr(customers::Column::UpdatedAt, Expr::value(now))
            .filter(customers::Column::Id.eq(customer_id))
            .exec(self.pool.as_ref())
            .await?;

        if res.rows_affected == 0 {
            return Err(AppError::NotFound("Customer not found".to_string()));
        }
        log::info!("Purchase of {amount_cents} cents recorded for customer {customer_id}");

        self.get_customer(customer_id).await
    }

    /// 重新计算单个客户的评分、分层与到店间隔
    pub async fn recalculate_score(
        &self,
        customer_id: i64,
        now: DateTime<Utc>,
    ) -> AppResult<CustomerResponse> {
        let model = self.find_model(customer_id).await?;
        match Self::rescored(&model, now) {
            Some(am) => Ok(am.update(self.pool.as_ref()).await?.into()),
            None => Ok(model.into()),
        }
    }

    /// 全量刷新评分（最近消费分量随时间衰减）；返回实际更新的客户数
    pub async fn refresh_all_scores(&self, now: DateTime<Utc>) -> AppResult<u64> {
        self.refresh_scores_in_batches(now, SCORE_REFRESH_BATCH).await
    }

    async fn refresh_scores_in_batches(
        &self,
        now: DateTime<Utc>,
        batch_size: u64,
    ) -> AppResult<u64> {
        let mut pages = customers::Entity::find()
            .order_by_asc(customers::Column::Id)
            .paginate(self.pool.as_ref(), batch_size);

        let mut updated = 0u64;
        while let Some(batch) = pages.fetch_and_next().await? {
            for model in batch {
                if let Some(am) = Self::rescored(&model, now) {
                    am.update(self.pool.as_ref()).await?;
                    updated += 1;
                }
            }
        }
        Ok(updated)
    }

    /// 评分预览，不读写数据库
    pub fn preview_score(request: &ScorePreviewRequest, now: DateTime<Utc>) -> ScoreResult {
        let input = ScoreInput::lenient(
            &request.total_orders,
            &request.total_spent,
            request.last_purchase_at.as_deref(),
        );
        compute_score(&input, now)
    }

    // 评分结果无变化时返回 None
    fn rescored(model: &customers::Model, now: DateTime<Utc>) -> Option<customers::ActiveModel> {
        let input = ScoreInput::from_stored(
            model.total_orders,
            model.total_spent_cents,
            model.last_purchase_at,
        );
        let result = compute_score(&input, now);
        if result.score == model.score
            && result.segment == model.segment
            && result.visit_frequency_days == model.visit_frequency_days
        {
            return None;
        }

        let mut am = model.clone().into_active_model();
        am.score = Set(result.score);
        am.segment = Set(result.segment);
        am.visit_frequency_days = Set(result.visit_frequency_days);
        am.updated_at = Set(Some(now));
        Some(am)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 15, 0, 0).unwrap()
    }

    fn customer(id: i64, orders: i32, cents: i64, last: Option<DateTime<Utc>>) -> customers::Model {
        customers::Model {
            id,
            store_id: 1,
            name: "Maria".to_string(),
            phone: None,
            total_orders: orders,
            total_spent_cents: cents,
            last_purchase_at: last,
            score: 0,
            segment: CustomerSegment::New,
            visit_frequency_days: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_record_purchase_missing_customer() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let service = CustomerService::new(Arc::new(db));

        let err = service
            .record_purchase(42, 10.0, None, now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_record_purchase_returns_updated_customer() {
        let updated = customer(7, 3, 4_550, Some(now()));
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([vec![updated]])
            .into_connection();
        let service = CustomerService::new(Arc::new(db));

        let resp = service.record_purchase(7, 15.5, None, now()).await.unwrap();
        assert_eq!(resp.total_orders, 3);
        assert_eq!(resp.total_spent, 45.5);
        assert_eq!(resp.last_purchase_at, Some(now()));
    }

    #[tokio::test]
    async fn test_record_purchase_rejects_negative_amount() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = CustomerService::new(Arc::new(db));

        let err = service
            .record_purchase(7, -1.0, None, now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        let err = service
            .record_purchase(7, f64::NAN, None, now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_record_purchase_rejects_amount_beyond_limit() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = CustomerService::new(Arc::new(db));

        for amount in [MAX_PURCHASE_AMOUNT + 1.0, 1e300, f64::INFINITY] {
            let err = service
                .record_purchase(7, amount, None, now())
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::ValidationError(_)), "amount {amount}");
        }
    }

    #[tokio::test]
    async fn test_refresh_updates_only_changed_rows_across_batches() {
        let unchanged = customer(1, 0, 0, None);
        let stale_vip = customer(2, 12, 150_000, Some(now()));
        let lapsed = customer(3, 2, 5_000, Some(now() - Duration::days(61)));

        let mut vip = stale_vip.clone();
        vip.score = 100;
        vip.segment = CustomerSegment::Vip;
        vip.visit_frequency_days = Some(0.0);
        let mut inactive = lapsed.clone();
        inactive.score = 8;
        inactive.segment = CustomerSegment::Inactive;
        inactive.visit_frequency_days = Some(61.0);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                // 第一批
                vec![unchanged, stale_vip],
                vec![vip],
                // 第二批
                vec![lapsed],
                vec![inactive],
                // 空批次结束
                vec![],
            ])
            .into_connection();
        let service = CustomerService::new(Arc::new(db));

        assert_eq!(service.refresh_scores_in_batches(now(), 2).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_list_customers_filters_by_segment() {
        let mut vip = customer(4, 12, 150_000, Some(now()));
        vip.score = 100;
        vip.segment = CustomerSegment::Vip;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![BTreeMap::from([(
                    "num_items",
                    Into::<Value>::into(1i64),
                )])]])
                .append_query_results([vec![vip]])
                .into_connection(),
        );
        let service = CustomerService::new(db.clone());

        let resp = service
            .list_customers(CustomerQuery {
                store_id: 1,
                segment: Some(CustomerSegment::Vip),
                page: None,
                page_size: None,
            })
            .await
            .unwrap();
        assert_eq!(resp.total, 1);
        assert_eq!(resp.data.len(), 1);
        assert!(resp.data.iter().all(|c| c.segment == CustomerSegment::Vip));

        drop(service);
        let db = Arc::try_unwrap(db).ok().expect("connection still shared");
        let log = format!("{:?}", db.into_transaction_log()).replace('\\', "");
        assert!(log.contains(r#""customers"."segment" = "#), "{log}");
        assert!(log.contains(r#"ORDER BY "customers"."score" DESC"#), "{log}");
    }

    #[tokio::test]
    async fn test_get_customer_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<customers::Model>::new()])
            .into_connection();
        let service = CustomerService::new(Arc::new(db));

        let err = service.get_customer(1).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_recalculate_score_writes_new_segment() {
        let stored = customer(3, 12, 150_000, Some(now()));
        let mut rescored = stored.clone();
        rescored.score = 100;
        rescored.segment = CustomerSegment::Vip;
        rescored.visit_frequency_days = Some(0.0);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![stored], vec![rescored]])
            .into_connection();
        let service = CustomerService::new(Arc::new(db));

        let resp = service.recalculate_score(3, now()).await.unwrap();
        assert_eq!(resp.score, 100);
        assert_eq!(resp.segment, CustomerSegment::Vip);
    }

    #[test]
    fn test_rescored_skips_unchanged_rows() {
        let fresh = customer(1, 0, 0, None);
        assert!(CustomerService::rescored(&fresh, now()).is_none());

        let lapsed = customer(2, 2, 5_000, Some(now() - Duration::days(61)));
        let am = CustomerService::rescored(&lapsed, now()).unwrap();
        assert_eq!(am.score, Set(8));
        assert_eq!(am.segment, Set(CustomerSegment::Inactive));
    }

    #[test]
    fn test_preview_score_is_lenient() {
        let req = ScorePreviewRequest {
            total_orders: json!("12"),
            total_spent: json!(1500),
            last_purchase_at: Some("2024-03-10T15:00:00Z".to_string()),
        };
        let r = CustomerService::preview_score(&req, now());
        assert_eq!(r.score, 100);
        assert_eq!(r.segment, CustomerSegment::Vip);

        let r = CustomerService::preview_score(&ScorePreviewRequest::default(), now());
        assert_eq!(r.score, 0);
        assert_eq!(r.segment, CustomerSegment::New);
    }
}
