use actix_web::{HttpResponse, ResponseError, Result, web};
use chrono::Utc;
use serde_json::json;

use crate::models::*;
use crate::services::CustomerService;

#[utoipa::path(
    get,
    path = "/customers",
    tag = "customer",
    params(
        ("store_id" = i64, Query, description = "门店 ID"),
        ("segment" = Option<String>, Query, description = "客户分层过滤"),
        ("page" = Option<u64>, Query, description = "页码"),
        ("page_size" = Option<u64>, Query, description = "每页数量")
    ),
    responses(
        (status = 200, description = "获取客户列表成功"),
        (status = 400, description = "请求参数错误")
    )
)]
pub async fn list_customers(
    customer_service: web::Data<CustomerService>,
    query: web::Query<CustomerQuery>,
) -> Result<HttpResponse> {
    match customer_service.list_customers(query.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/customers",
    tag = "customer",
    request_body = CreateCustomerRequest,
    responses(
        (status = 200, description = "创建客户成功", body = CustomerResponse),
        (status = 400, description = "请求参数错误")
    )
)]
pub async fn create_customer(
    customer_service: web::Data<CustomerService>,
    request: web::Json<CreateCustomerRequest>,
) -> Result<HttpResponse> {
    match customer_service.create_customer(request.into_inner()).await {
        Ok(customer) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": customer
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/customers/{id}",
    tag = "customer",
    params(("id" = i64, Path, description = "客户 ID")),
    responses(
        (status = 200, description = "获取客户成功", body = CustomerResponse),
        (status = 404, description = "客户不存在")
    )
)]
pub async fn get_customer(
    customer_service: web::Data<CustomerService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match customer_service.get_customer(path.into_inner()).await {
        Ok(customer) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": customer
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/customers/{id}/purchases",
    tag = "customer",
    params(("id" = i64, Path, description = "客户 ID")),
    request_body = RecordPurchaseRequest,
    responses(
        (status = 200, description = "记录消费成功", body = CustomerResponse),
        (status = 400, description = "金额无效"),
        (status = 404, description = "客户不存在")
    )
)]
pub async fn record_purchase(
    customer_service: web::Data<CustomerService>,
    path: web::Path<i64>,
    request: web::Json<RecordPurchaseRequest>,
) -> Result<HttpResponse> {
    let request = request.into_inner();
    match customer_service
        .record_purchase(path.into_inner(), request.amount, request.date, Utc::now())
        .await
    {
        Ok(customer) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": customer
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/customers/{id}/recalculate",
    tag = "customer",
    params(("id" = i64, Path, description = "客户 ID")),
    responses(
        (status = 200, description = "重新计算评分成功", body = CustomerResponse),
        (status = 404, description = "客户不存在")
    )
)]
pub async fn recalculate_score(
    customer_service: web::Data<CustomerService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match customer_service
        .recalculate_score(path.into_inner(), Utc::now())
        .await
    {
        Ok(customer) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": customer
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/customers/score-preview",
    tag = "customer",
    request_body = ScorePreviewRequest,
    responses(
        (status = 200, description = "评分预览", body = ScoreResult)
    )
)]
pub async fn score_preview(request: web::Json<ScorePreviewRequest>) -> Result<HttpResponse> {
    let result = CustomerService::preview_score(&request, Utc::now());
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": result
    })))
}

pub fn customer_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/customers")
            .route("", web::get().to(list_customers))
            .route("", web::post().to(create_customer))
            .route("/score-preview", web::post().to(score_preview))
            .route("/{id}", web::get().to(get_customer))
            .route("/{id}/purchases", web::post().to(record_purchase))
            .route("/{id}/recalculate", web::post().to(recalculate_score)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, test};

    #[actix_web::test]
    async fn test_score_preview_endpoint() {
        let app = test::init_service(App::new().configure(customer_config)).await;
        let req = test::TestRequest::post()
            .uri("/customers/score-preview")
            .set_json(json!({ "total_orders": null, "total_spent": "0" }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["score"], 0);
        assert_eq!(body["data"]["segment"], "new");
    }
}
