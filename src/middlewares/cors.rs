use actix_cors::Cors;

pub fn create_cors() -> Cors {
    // 管理后台与菜单页部署在不同域名下，放开来源限制
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST", "PUT", "OPTIONS"])
        .allow_any_header()
        .max_age(3600)
}
