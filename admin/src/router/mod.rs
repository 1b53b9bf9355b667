use axum::Router;

mod admin;

pub fn routers() -> Router {
    Router::new().nest("/api/admin", admin::admin())
}
