pub mod results;
pub mod sessions;
pub mod votes;

use crate::state::SharedState;
use axum::{routing::get, Router};

async fn health() -> &'static str {
    "OK"
}

pub fn routes(state: SharedState) -> Router {
    let voting = sessions::router(state.clone())
        .merge(votes::router(state.clone()))
        .merge(results::router(state));

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1/voting", voting)
}
