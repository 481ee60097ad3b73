use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::SharedState;

/// Build the Axum router with all routes and middleware.
pub fn create_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check (outside /api prefix)
        .route("/health", get(handlers::health))
        // Game CRUD
        .route(
            "/api/games",
            post(handlers::create_game).get(handlers::list_games),
        )
        .route("/api/games/restore", post(handlers::restore_game))
        .route(
            "/api/games/{id}",
            get(handlers::get_game).delete(handlers::delete_game),
        )
        // Playing
        .route("/api/games/{id}/moves", post(handlers::make_move))
        .route("/api/games/{id}/promotion", post(handlers::complete_promotion))
        .route("/api/games/{id}/undo", post(handlers::undo_move))
        .route("/api/games/{id}/reset", post(handlers::reset_game))
        .route("/api/games/{id}/legal-moves", get(handlers::legal_moves))
        // Computer
        .route("/api/games/{id}/ai-move", post(handlers::ai_move))
        .route("/api/games/{id}/ai-hint", post(handlers::ai_hint))
        // Export
        .route("/api/games/{id}/fen", get(handlers::export_fen))
        .route("/api/games/{id}/pgn", get(handlers::export_pgn))
        .route("/api/games/{id}/snapshot", get(handlers::snapshot))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
