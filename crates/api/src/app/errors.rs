//! Consistent JSON error responses.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use modulith_lifecycle::LifecycleError;

/// Map a lifecycle failure to its HTTP shape.
///
/// Dependency errors additionally carry the missing dependency keys so
/// dashboards can render them.
pub fn lifecycle_error_to_response(err: LifecycleError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        LifecycleError::UnknownModule(_) => {
            json_error(StatusCode::NOT_FOUND, "unknown_module", message)
        }
        LifecycleError::NotInstallable(_) => {
            json_error(StatusCode::BAD_REQUEST, "not_installable", message)
        }
        LifecycleError::DependencyNotInstalled { missing, .. } => json_error_with_missing(
            StatusCode::CONFLICT,
            "dependency_not_installed",
            message,
            &missing,
        ),
        LifecycleError::DependencyNotEnabled { missing, .. } => json_error_with_missing(
            StatusCode::CONFLICT,
            "dependency_not_enabled",
            message,
            &missing,
        ),
        LifecycleError::NotInstalled(_) => {
            json_error(StatusCode::CONFLICT, "not_installed", message)
        }
        LifecycleError::NotEnabled(_) => json_error(StatusCode::CONFLICT, "not_enabled", message),
        LifecycleError::UnknownSeeder { .. } => {
            json_error(StatusCode::BAD_REQUEST, "unknown_seeder", message)
        }
        LifecycleError::MigrationFailed { .. } => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "migration_failed", message)
        }
        LifecycleError::SeedFailed { .. } => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "seed_failed", message)
        }
        LifecycleError::Store(_) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", message)
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

fn json_error_with_missing(
    status: StatusCode,
    code: &'static str,
    message: String,
    missing: &[modulith_core::ModuleKey],
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message,
            "missing": missing.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
        })),
    )
        .into_response()
}
