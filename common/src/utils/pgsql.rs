use async_once::AsyncOnce;
use lazy_static::lazy_static;
use sqlx::postgres::PgPoolOptions;
use tracing::error;

pub type ConnPool = sqlx::PgPool;

lazy_static! {
    static ref PG_SQL: AsyncOnce<ConnPool> = AsyncOnce::new(async {
        let cfg = crate::application_config().await;
        match PgPoolOptions::new()
            .max_connections(cfg.postgres.pool_size)
            .connect_lazy(&cfg.postgres.dsn())
        {
            Ok(pool) => pool,
            Err(e) => {
                error!("postgres pool err: {}", e);
                std::process::exit(-1);
            }
        }
    });
}

pub async fn db<'left_time>() -> &'left_time ConnPool {
    PG_SQL.get().await
}
