use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use axum::Extension;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tracing::{error, info};

use common::Application;
use ghn::GhnClient;

mod controller;
mod middleware;
mod models;
mod router;

pub struct AppState {
    http: reqwest::Client,
    config: watch::Receiver<Arc<Application>>,
}

impl AppState {
    /// 按最新配置创建 GHN 客户端, token 轮换后立即生效
    pub fn ghn(&self) -> GhnClient {
        let cfg = self.config.borrow().ghn.clone();
        GhnClient::new(self.http.clone(), cfg.base_url, cfg.token, cfg.shop_id)
    }
}

#[tokio::main]
async fn main() {
    let cfg = common::application_config().await;

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::from_str(&cfg.log_level).unwrap_or(tracing::Level::INFO))
        .init();

    common::spawn_config_refresh();

    let addr = match format!("{}:{}", cfg.host, cfg.port).parse::<SocketAddr>() {
        Ok(addr) => addr,
        Err(e) => {
            error!("invalid listen address {}:{}: {}", cfg.host, cfg.port, e);
            std::process::exit(-1);
        }
    };

    let app_state = Arc::new(AppState {
        http: reqwest::Client::new(),
        config: common::subscribe().await,
    });

    let router = router::routers().layer(ServiceBuilder::new().layer(Extension(app_state)));

    info!("admin-srv run at: {}", addr);
    if let Err(e) = axum::Server::bind(&addr)
        .serve(router.into_make_service())
        .await
    {
        error!("admin-srv stopped: {}", e);
    }
}
