use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    auth::JwtKeys,
    config::ServiceConfig,
    db,
    products::repo::{MemoryProductStore, PgProductStore, ProductStore},
    storage::{ImageStore, LocalImageStore},
    users::repo::{MemoryUserStore, PgUserStore, UserStore},
};

#[derive(Clone)]
pub struct UserServiceState {
    pub users: Arc<dyn UserStore>,
    pub jwt: JwtKeys,
}

impl UserServiceState {
    pub async fn init(config: &ServiceConfig) -> anyhow::Result<Self> {
        let users: Arc<dyn UserStore> = match &config.database_url {
            Some(url) => {
                let pool = db::connect(url).await?;
                db::migrate(&pool).await;
                Arc::new(PgUserStore::new(pool))
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using the in-memory user store");
                Arc::new(MemoryUserStore::new())
            }
        };
        Ok(Self::from_parts(users, JwtKeys::from_config(&config.jwt)))
    }

    pub fn from_parts(users: Arc<dyn UserStore>, jwt: JwtKeys) -> Self {
        Self { users, jwt }
    }
}

impl FromRef<UserServiceState> for JwtKeys {
    fn from_ref(state: &UserServiceState) -> Self {
        state.jwt.clone()
    }
}

impl FromRef<UserServiceState> for Arc<dyn UserStore> {
    fn from_ref(state: &UserServiceState) -> Self {
        state.users.clone()
    }
}

#[derive(Clone)]
pub struct ProductServiceState {
    pub products: Arc<dyn ProductStore>,
    pub images: Arc<dyn ImageStore>,
    pub jwt: JwtKeys,
}

impl ProductServiceState {
    pub async fn init(config: &ServiceConfig) -> anyhow::Result<Self> {
        let products: Arc<dyn ProductStore> = match &config.database_url {
            Some(url) => {
                let pool = db::connect(url).await?;
                db::migrate(&pool).await;
                Arc::new(PgProductStore::new(pool))
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using the in-memory product store");
                Arc::new(MemoryProductStore::new())
            }
        };
        let images = Arc::new(LocalImageStore::new(&config.upload_dir)) as Arc<dyn ImageStore>;

        Ok(Self::from_parts(
            products,
            images,
            JwtKeys::from_config(&config.jwt),
        ))
    }

    pub fn from_parts(
        products: Arc<dyn ProductStore>,
        images: Arc<dyn ImageStore>,
        jwt: JwtKeys,
    ) -> Self {
        Self {
            products,
            images,
            jwt,
        }
    }
}

impl FromRef<ProductServiceState> for JwtKeys {
    fn from_ref(state: &ProductServiceState) -> Self {
        state.jwt.clone()
    }
}
