use actix_web::web;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{ChecklistStatus, CustomerSegment};
use crate::handlers;
use crate::models::*;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::customer::list_customers,
        handlers::customer::create_customer,
        handlers::customer::get_customer,
        handlers::customer::record_purchase,
        handlers::customer::recalculate_score,
        handlers::customer::score_preview,
        handlers::checklist::list_settings,
        handlers::checklist::upsert_setting,
        handlers::checklist::get_deadline,
        handlers::checklist::get_current,
        handlers::checklist::get_auto_close,
        handlers::checklist::list_checklists,
        handlers::checklist::open_checklist,
        handlers::checklist::complete_checklist,
    ),
    components(
        schemas(
            CustomerSegment,
            CustomerResponse,
            CreateCustomerRequest,
            RecordPurchaseRequest,
            ScorePreviewRequest,
            ScoreResult,
            ChecklistStatus,
            DeadlineSetting,
            DeadlineInfo,
            UpsertDeadlineSettingRequest,
            OpenChecklistRequest,
            CurrentChecklistResponse,
            AutoCloseResponse,
            ChecklistResponse,
        )
    ),
    tags(
        (name = "customer", description = "Customer scoring API"),
        (name = "checklist", description = "Checklist deadline API"),
    ),
    info(
        title = "Bistro Backend API",
        version = "1.0.0",
        description = "Store management REST API documentation"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_core_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/customers/{id}/purchases"));
        assert!(doc.paths.paths.contains_key("/checklists/deadline"));
    }
}
