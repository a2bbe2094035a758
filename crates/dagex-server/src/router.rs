use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::chain;
use crate::handler;
use crate::state::AppState;
use crate::view;

/// Build the axum router with all explorer endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .route("/", get(chain::index_handler))
        // GET routes also answer HEAD.
        .route("/view/:provider/:piece/:cid", get(view::view_handler))
        .route("/view/:provider/:piece/:cid/*path", get(view::view_handler))
        .route("/car/:provider/:piece/:cid", get(view::car_handler))
        .route("/car/:provider/:piece/:cid/*path", get(view::car_handler))
        .route("/deal/:id", get(chain::deal_handler))
        .route("/minersectors/:provider", get(chain::sectors_handler))
        .route("/miners", get(chain::miners_handler))
        .route("/deals", get(chain::deals_handler))
        .route("/ping/miner/:id", get(chain::ping_handler))
        .route("/provider/:provider", get(chain::provider_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
