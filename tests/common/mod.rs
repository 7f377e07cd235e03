#![allow(dead_code)]

use std::{path::Path, sync::Arc};

use axum::Router;
use bazaar::{
    auth::JwtKeys,
    config::JwtConfig,
    products::{self, repo::MemoryProductStore},
    state::{ProductServiceState, UserServiceState},
    storage::LocalImageStore,
    users::{self, repo::MemoryUserStore},
};

pub const SECRET: &str = "integration-test-secret";

pub struct TestServer {
    pub base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Serves `app` on an ephemeral local port until dropped.
    pub async fn spawn(app: Router) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn jwt_keys() -> JwtKeys {
    JwtKeys::from_config(&JwtConfig {
        secret: SECRET.into(),
        issuer: "bazaar".into(),
        audience: "bazaar-clients".into(),
        ttl_minutes: 60 * 24,
    })
}

pub async fn user_service() -> (TestServer, Arc<MemoryUserStore>) {
    let store = Arc::new(MemoryUserStore::new());
    let state = UserServiceState::from_parts(store.clone(), jwt_keys());
    (TestServer::spawn(users::router(state)).await, store)
}

pub async fn product_service(upload_dir: &Path) -> (TestServer, Arc<MemoryProductStore>) {
    let store = Arc::new(MemoryProductStore::new());
    let images = Arc::new(LocalImageStore::new(upload_dir));
    let state = ProductServiceState::from_parts(store.clone(), images, jwt_keys());
    (
        TestServer::spawn(products::router(state, upload_dir)).await,
        store,
    )
}

pub fn token_for(user_id: i64, username: &str) -> String {
    jwt_keys().issue(user_id, username).unwrap()
}
