use std::sync::Arc;

use async_once::AsyncOnce;
use lazy_static::lazy_static;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_yaml::value::Value;
use tokio::sync::watch;
use tokio::time::Duration;
use tracing::{error, info, warn};

use crate::error::{ApiError, ApiResult};

const CONFIG_FILE: &str = "application.yaml";

const EXAMPLE_CONFIG_FILE: &str = ".example.yaml";

lazy_static! {
    static ref APP_CONFIG: AsyncOnce<watch::Sender<Arc<Application>>> = AsyncOnce::new(async {
        match Application::init().await {
            Ok(application) => watch::channel(Arc::new(application)).0,
            Err(e) => {
                error!("application load err: {}", e);
                std::process::exit(-1);
            }
        }
    });
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Application {
    // 服务域名
    pub host: String,
    // 服务端口
    pub port: u16,
    // 日志级别
    pub log_level: String,
    // 配置文件更新频率(秒)
    pub update_frequency: u16,
    pub postgres: PostgresConfig,
    pub jwt: JwtConfig,
    pub ghn: GhnConfig,
}

/// 获取系统配置
pub async fn application_config() -> Arc<Application> {
    APP_CONFIG.get().await.borrow().clone()
}

/// 订阅配置变更, 配置文件变化后接收方会被唤醒
pub async fn subscribe() -> watch::Receiver<Arc<Application>> {
    APP_CONFIG.get().await.subscribe()
}

/// 重新读取配置文件, 内容有变化时通知所有订阅者
pub async fn reload_config() -> ApiResult<bool> {
    let application = Application::init().await?;
    let changed = APP_CONFIG.get().await.send_if_modified(|current| {
        if **current == application {
            return false;
        }
        *current = Arc::new(application);
        true
    });

    if changed {
        info!("{} reloaded", CONFIG_FILE);
    }

    Ok(changed)
}

/// 按配置的频率定时重新加载
pub fn spawn_config_refresh() {
    tokio::spawn(async {
        let frequency = application_config().await.update_frequency.max(1);
        let mut interval = tokio::time::interval(Duration::from_secs(frequency as u64));
        interval.tick().await;

        loop {
            interval.tick().await;
            if let Err(e) = reload_config().await {
                warn!("interval.tick err: {}", e);
            }
        }
    });
}

impl Application {
    pub async fn init() -> ApiResult<Self> {
        Self::from_value(&Application::file_get_content().await?)
    }

    pub fn from_value(cfg: &Value) -> ApiResult<Self> {
        Ok(Application {
            host: Self::analysis::<String>("host", cfg)?,
            port: Self::analysis::<u16>("port", cfg)?,
            log_level: Self::analysis::<String>("log_level", cfg).unwrap_or("info".to_string()),
            update_frequency: Self::analysis::<u16>("profile_refresh_rate", cfg)?,
            postgres: Self::analysis::<PostgresConfig>("postgres", cfg)?,
            jwt: Self::analysis::<JwtConfig>("jwt", cfg)?,
            ghn: Self::analysis::<GhnConfig>("ghn", cfg)?,
        })
    }

    fn analysis<T: DeserializeOwned>(key: &str, value: &Value) -> ApiResult<T> {
        let val = match value.get(key) {
            Some(value) => value,
            None => return Err(ApiError::Error(format!("config key {} is missing", key))),
        };
        Ok(serde_yaml::from_value::<T>(val.clone())?)
    }

    /// 读取文件内容, 文件不存在时从示例文件创建
    async fn file_get_content() -> ApiResult<Value> {
        match tokio::fs::read(CONFIG_FILE).await {
            Ok(file_content) => serde_yaml::from_slice::<Value>(file_content.as_slice()).map_err(|e| {
                error!("please check ./{}: {}", CONFIG_FILE, e);
                ApiError::from(e)
            }),
            Err(_e) => {
                warn!("./{} not found, creating it from {}", CONFIG_FILE, EXAMPLE_CONFIG_FILE);
                match tokio::fs::copy(EXAMPLE_CONFIG_FILE, CONFIG_FILE).await {
                    Ok(_) => {
                        info!("./{} created, please fill in the configuration", CONFIG_FILE);
                        Err(ApiError::Error("configuration must be filled in".to_string()))
                    }
                    Err(_e) => {
                        error!("no example configuration found: {}", _e);
                        Err(ApiError::from(_e))
                    }
                }
            }
        }
    }
}

/// postgres 数据库配置参数
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PostgresConfig {
    pub host: String,
    pub username: String,
    pub password: String,
    pub port: u16,
    pub db_name: String,
    pub pool_size: u32,
}

impl PostgresConfig {
    pub fn dsn(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.db_name
        )
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct JwtConfig {
    pub secret: String,
    pub iss: String,
    // access_token 有效期(秒)
    pub exp: i64,
}

/// GHN 开放平台参数
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GhnConfig {
    pub base_url: String,
    pub token: String,
    pub shop_id: i64,
}
