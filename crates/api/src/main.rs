use std::sync::Arc;

use modulith_catalog::ManifestCatalog;

#[tokio::main]
async fn main() {
    modulith_observability::init();

    let catalog = match std::env::var("MODULE_MANIFEST_DIR") {
        Ok(dir) => ManifestCatalog::load_from_dir(&dir)
            .unwrap_or_else(|e| panic!("failed to load manifests from {dir}: {e}")),
        Err(_) => {
            tracing::info!("MODULE_MANIFEST_DIR not set; using built-in catalog");
            ManifestCatalog::builtin()
        }
    };

    let app = modulith_api::app::build_app(Arc::new(catalog)).await;

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080")
        .await
        .expect("failed to bind 0.0.0.0:8080");

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
