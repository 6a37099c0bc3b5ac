use actix_web::{HttpResponse, ResponseError, Result, web};
use chrono::Utc;
use serde_json::json;

use crate::models::*;
use crate::services::ChecklistService;
use crate::utils::parse_date;

#[utoipa::path(
    get,
    path = "/checklists/settings",
    tag = "checklist",
    params(("store_id" = i64, Query, description = "门店 ID")),
    responses(
        (status = 200, description = "获取截止时间配置成功", body = [DeadlineSetting])
    )
)]
pub async fn list_settings(
    checklist_service: web::Data<ChecklistService>,
    query: web::Query<StoreQuery>,
) -> Result<HttpResponse> {
    match checklist_service.list_settings(query.store_id).await {
        Ok(settings) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": settings
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/checklists/settings",
    tag = "checklist",
    request_body = UpsertDeadlineSettingRequest,
    responses(
        (status = 200, description = "保存截止时间配置成功", body = DeadlineSetting),
        (status = 400, description = "请求参数错误")
    )
)]
pub async fn upsert_setting(
    checklist_service: web::Data<ChecklistService>,
    request: web::Json<UpsertDeadlineSettingRequest>,
) -> Result<HttpResponse> {
    match checklist_service.upsert_setting(request.into_inner()).await {
        Ok(setting) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": setting
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/checklists/deadline",
    tag = "checklist",
    params(
        ("store_id" = i64, Query, description = "门店 ID"),
        ("date" = String, Query, description = "参考日期 YYYY-MM-DD"),
        ("checklist_type" = String, Query, description = "清单类型")
    ),
    responses(
        (status = 200, description = "截止时间信息，无截止时间时 data 为 null", body = DeadlineInfo),
        (status = 400, description = "日期格式错误")
    )
)]
pub async fn get_deadline(
    checklist_service: web::Data<ChecklistService>,
    query: web::Query<DeadlineQuery>,
) -> Result<HttpResponse> {
    let date = match parse_date(&query.date) {
        Ok(d) => d,
        Err(e) => return Ok(e.error_response()),
    };
    let checklist_type = ChecklistType::from_str_lossy(&query.checklist_type);

    match checklist_service
        .deadline_info(query.store_id, date, &checklist_type, Utc::now())
        .await
    {
        Ok(info) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": info
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/checklists/current",
    tag = "checklist",
    params(("store_id" = i64, Query, description = "门店 ID")),
    responses(
        (status = 200, description = "当前应执行的清单", body = CurrentChecklistResponse)
    )
)]
pub async fn get_current(
    checklist_service: web::Data<ChecklistService>,
    query: web::Query<StoreQuery>,
) -> Result<HttpResponse> {
    match checklist_service
        .current_checklist(query.store_id, Utc::now())
        .await
    {
        Ok(current) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": current
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/checklists/auto-close",
    tag = "checklist",
    params(
        ("store_id" = i64, Query, description = "门店 ID"),
        ("date" = String, Query, description = "参考日期 YYYY-MM-DD"),
        ("checklist_type" = String, Query, description = "清单类型")
    ),
    responses(
        (status = 200, description = "是否处于自动关闭窗口", body = AutoCloseResponse),
        (status = 400, description = "日期格式错误")
    )
)]
pub async fn get_auto_close(
    checklist_service: web::Data<ChecklistService>,
    query: web::Query<DeadlineQuery>,
) -> Result<HttpResponse> {
    let date = match parse_date(&query.date) {
        Ok(d) => d,
        Err(e) => return Ok(e.error_response()),
    };
    let checklist_type = ChecklistType::from_str_lossy(&query.checklist_type);

    match checklist_service
        .should_auto_close(query.store_id, date, &checklist_type, Utc::now())
        .await
    {
        Ok(should_auto_close) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": AutoCloseResponse { should_auto_close }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/checklists",
    tag = "checklist",
    params(
        ("store_id" = i64, Query, description = "门店 ID"),
        ("date" = Option<String>, Query, description = "参考日期 YYYY-MM-DD")
    ),
    responses(
        (status = 200, description = "清单列表", body = [ChecklistResponse]),
        (status = 400, description = "日期格式错误")
    )
)]
pub async fn list_checklists(
    checklist_service: web::Data<ChecklistService>,
    query: web::Query<ChecklistListQuery>,
) -> Result<HttpResponse> {
    let date = match query.date.as_deref().map(parse_date).transpose() {
        Ok(d) => d,
        Err(e) => return Ok(e.error_response()),
    };

    match checklist_service.list_checklists(query.store_id, date).await {
        Ok(items) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": items
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/checklists",
    tag = "checklist",
    request_body = OpenChecklistRequest,
    responses(
        (status = 200, description = "开启清单成功", body = ChecklistResponse),
        (status = 400, description = "请求参数错误")
    )
)]
pub async fn open_checklist(
    checklist_service: web::Data<ChecklistService>,
    request: web::Json<OpenChecklistRequest>,
) -> Result<HttpResponse> {
    let date = match parse_date(&request.date) {
        Ok(d) => d,
        Err(e) => return Ok(e.error_response()),
    };
    let checklist_type = ChecklistType::from_str_lossy(&request.checklist_type);

    match checklist_service
        .open_checklist(request.store_id, date, &checklist_type)
        .await
    {
        Ok(checklist) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": checklist
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/checklists/{id}/complete",
    tag = "checklist",
    params(("id" = i64, Path, description = "清单 ID")),
    responses(
        (status = 200, description = "完成清单成功", body = ChecklistResponse),
        (status = 400, description = "清单已被自动关闭"),
        (status = 404, description = "清单不存在")
    )
)]
pub async fn complete_checklist(
    checklist_service: web::Data<ChecklistService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match checklist_service
        .complete_checklist(path.into_inner(), Utc::now())
        .await
    {
        Ok(checklist) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": checklist
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn checklist_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/checklists")
            .route("", web::get().to(list_checklists))
            .route("", web::post().to(open_checklist))
            .route("/settings", web::get().to(list_settings))
            .route("/settings", web::put().to(upsert_setting))
            .route("/deadline", web::get().to(get_deadline))
            .route("/current", web::get().to(get_current))
            .route("/auto-close", web::get().to(get_auto_close))
            .route("/{id}/complete", web::post().to(complete_checklist)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode, test};
    use crate::entities::deadline_setting_entity;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    #[actix_web::test]
    async fn test_malformed_date_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(ChecklistService::new(Arc::new(db))))
                .configure(checklist_config),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/checklists/deadline?store_id=1&date=2024-13-45&checklist_type=abertura")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_deadline_accepts_padded_checklist_type() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<deadline_setting_entity::Model>::new()])
            .into_connection();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(ChecklistService::new(Arc::new(db))))
                .configure(checklist_config),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/checklists/deadline?store_id=1&date=2024-03-10&checklist_type=%20abertura%20")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["deadline"], "2024-03-10T19:30:00-03:00");
    }
}
