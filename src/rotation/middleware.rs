//! Axum middleware that drives signing key rotation from request traffic.

use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};

use super::controller::KeyRotationController;

pub type RotationState = Arc<KeyRotationController>;

/// Run a rotation check before handing the request on.
///
/// Checks are cheap until the interval elapses, and failures are absorbed by
/// the controller, so the request always proceeds.
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/", get(handler))
///     .layer(middleware::from_fn_with_state(controller, rotate_signing_key));
/// ```
pub async fn rotate_signing_key(
    State(controller): State<RotationState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    controller.check_and_rotate().await;
    next.run(request).await
}
