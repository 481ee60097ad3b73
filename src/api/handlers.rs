use std::time::Instant;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::{info, warn};

use crate::engine::game::{Game, GameSnapshot, MoveApplied};
use crate::engine::san;
use crate::engine::types::{Color, Difficulty, PieceType, Pos};

use super::errors::ApiError;
use super::models::*;
use super::state::SharedState;

// =========================================================================
// Health
// =========================================================================

/// GET /health
pub async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let oracle = state
        .oracle
        .lock()
        .await
        .as_ref()
        .map(|oracle| oracle.name().to_string());
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        oracle,
        games: state.games.read().await.len(),
        uptime: state.start_time.elapsed().as_secs(),
    })
}

// =========================================================================
// Create / list / get / delete
// =========================================================================

/// POST /api/games
pub async fn create_game(
    State(state): State<SharedState>,
    Json(input): Json<CreateGameRequest>,
) -> Result<(StatusCode, Json<GameResponse>), ApiError> {
    let game = match input.fen.as_deref() {
        Some(fen) => Game::from_fen(fen)?,
        None => Game::new(),
    };

    let mut game = game
        .with_players(
            input.white_player.unwrap_or_else(|| "White".into()),
            input.black_player.unwrap_or_else(|| "Black".into()),
        )
        .with_clock(input.clock_seconds.unwrap_or(state.config.clock_seconds))
        .with_max_hints(state.config.max_hints);

    if let Some(color) = input.computer_color.as_deref() {
        let color = parse_color(color)?;
        let difficulty = resolve_difficulty(&state, input.difficulty.as_deref(), None)?;
        game = game.with_computer(color, difficulty);

        if let Some(oracle) = state.oracle.lock().await.as_mut()
            && let Err(err) = oracle.new_game().await
        {
            warn!(%err, "oracle did not accept a new game");
        }
    }

    let response = game_to_response(&game);
    info!(game = %game.id, "game created");
    state.games.write().await.insert(game.id.clone(), game);

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/games
pub async fn list_games(
    State(state): State<SharedState>,
    Query(query): Query<ListGamesQuery>,
) -> Json<ListGamesResponse> {
    let games = state.games.read().await;

    let limit = query.limit.unwrap_or(10).min(100);
    let offset = query.offset.unwrap_or(0);

    let mut filtered: Vec<&Game> = games.values().collect();
    if let Some(status) = query.status.as_deref() {
        let wanted = status.to_lowercase();
        filtered.retain(|g| g.status().as_str() == wanted);
    }
    let total = filtered.len();

    filtered.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let page = filtered
        .into_iter()
        .skip(offset)
        .take(limit)
        .map(game_to_response)
        .collect();

    Json(ListGamesResponse {
        games: page,
        total,
        limit,
        offset,
    })
}

/// GET /api/games/{id}
pub async fn get_game(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<GameResponse>, ApiError> {
    let games = state.games.read().await;
    let game = games.get(&id).ok_or_else(|| ApiError::GameNotFound(id.clone()))?;
    Ok(Json(game_to_response(game)))
}

/// DELETE /api/games/{id}
pub async fn delete_game(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    state
        .games
        .write()
        .await
        .remove(&id)
        .ok_or_else(|| ApiError::GameNotFound(id.clone()))?;
    Ok(Json(DeleteResponse {
        success: true,
        message: "Game deleted".to_string(),
    }))
}

// =========================================================================
// Moves
// =========================================================================

/// POST /api/games/{id}/moves
///
/// Takes either `from`/`to` (plus optional `promotion`) or a `san` string.
/// A pawn move to the last rank without `promotion` leaves the game
/// awaiting `/promotion`.
pub async fn make_move(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(input): Json<MoveRequest>,
) -> Result<Json<GameResponse>, ApiError> {
    let input = match input.san {
        Some(text) => MoveInput::San(text),
        None => {
            let (Some(from), Some(to)) = (input.from.as_deref(), input.to.as_deref()) else {
                return Err(ApiError::InvalidRequest(
                    "either san or both from and to are required".into(),
                ));
            };
            let promotion = input
                .promotion
                .as_deref()
                .map(parse_promotion)
                .transpose()?;
            MoveInput::Squares(parse_square(from)?, parse_square(to)?, promotion)
        }
    };

    let mut games = state.games.write().await;
    let game = games.get_mut(&id).ok_or_else(|| ApiError::GameNotFound(id.clone()))?;
    let (from, to, promotion) = match input {
        MoveInput::Squares(from, to, promotion) => (from, to, promotion),
        MoveInput::San(text) => {
            ensure_playable(game)?;
            let mv = san::parse_san(game.position(), &text)?;
            (mv.from, mv.to, mv.promotion)
        }
    };
    game.try_move(from, to, promotion)?;
    Ok(Json(game_to_response(game)))
}

/// POST /api/games/{id}/promotion
pub async fn complete_promotion(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(input): Json<PromotionRequest>,
) -> Result<Json<GameResponse>, ApiError> {
    let kind = parse_promotion(&input.piece)?;
    let mut games = state.games.write().await;
    let game = games.get_mut(&id).ok_or_else(|| ApiError::GameNotFound(id.clone()))?;
    game.complete_promotion(kind)?;
    Ok(Json(game_to_response(game)))
}

/// POST /api/games/{id}/undo?plies=N
///
/// Without `plies`, a game against the computer takes back the computer's
/// reply together with the player's move.
pub async fn undo_move(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Query(query): Query<UndoQuery>,
) -> Result<Json<GameResponse>, ApiError> {
    let mut games = state.games.write().await;
    let game = games.get_mut(&id).ok_or_else(|| ApiError::GameNotFound(id.clone()))?;

    let plies = query.plies.unwrap_or_else(|| match game.computer {
        Some(side) if side.color != game.side_to_move() && game.history().len() >= 2 => 2,
        _ => 1,
    });
    game.undo_plies(plies)?;
    Ok(Json(game_to_response(game)))
}

/// POST /api/games/{id}/reset
pub async fn reset_game(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<GameResponse>, ApiError> {
    let response = {
        let mut games = state.games.write().await;
        let game = games.get_mut(&id).ok_or_else(|| ApiError::GameNotFound(id.clone()))?;
        game.reset();
        game_to_response(game)
    };

    if response.computer.is_some()
        && let Some(oracle) = state.oracle.lock().await.as_mut()
        && let Err(err) = oracle.new_game().await
    {
        warn!(%err, "oracle did not accept a new game");
    }
    Ok(Json(response))
}

/// GET /api/games/{id}/legal-moves?from=e2
pub async fn legal_moves(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Query(query): Query<LegalMovesQuery>,
) -> Result<Json<LegalMovesResponse>, ApiError> {
    let from = query.from.as_deref().map(parse_square).transpose()?;

    let games = state.games.read().await;
    let game = games.get(&id).ok_or_else(|| ApiError::GameNotFound(id.clone()))?;

    let all_legal = game.legal_moves();
    let moves = all_legal
        .iter()
        .filter(|mv| from.is_none_or(|sq| mv.from == sq))
        .map(|mv| legal_move_entry(game, *mv, &all_legal))
        .collect();

    let mut destinations: Vec<String> = match from {
        Some(sq) => game.legal_destinations(sq),
        None => all_legal.iter().map(|mv| mv.to).collect(),
    }
    .into_iter()
    .map(|sq| sq.to_algebraic())
    .collect();
    destinations.sort();
    destinations.dedup();

    Ok(Json(LegalMovesResponse {
        moves,
        destinations,
    }))
}

// =========================================================================
// Computer moves and hints
// =========================================================================

/// POST /api/games/{id}/ai-move
pub async fn ai_move(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(input): Json<AiMoveRequest>,
) -> Result<Json<AiMoveResponse>, ApiError> {
    let (position, fen, plies, difficulty) = {
        let games = state.games.read().await;
        let game = games.get(&id).ok_or_else(|| ApiError::GameNotFound(id.clone()))?;
        ensure_playable(game)?;
        let difficulty = resolve_difficulty(
            &state,
            input.difficulty.as_deref(),
            game.computer.map(|side| side.difficulty),
        )?;
        (*game.position(), game.to_fen(), game.history().len(), difficulty)
    };

    let start = Instant::now();
    let chosen = {
        let mut oracle = state.oracle.lock().await;
        state
            .player
            .choose(&position, &fen, difficulty, oracle.as_deref_mut())
            .await?
    };
    let thinking_time = start.elapsed().as_millis() as u64;

    let mut games = state.games.write().await;
    let game = games.get_mut(&id).ok_or_else(|| ApiError::GameNotFound(id.clone()))?;
    if game.history().len() != plies || *game.position() != position {
        return Err(ApiError::Conflict(
            "game changed while the computer was thinking".into(),
        ));
    }

    let mv = chosen.mv;
    let record = match game.try_move(mv.from, mv.to, mv.promotion)? {
        MoveApplied::Played(record) => record,
        MoveApplied::AwaitingPromotion => {
            return Err(ApiError::InternalError(format!(
                "computer move {mv} left a promotion pending"
            )));
        }
    };

    Ok(Json(AiMoveResponse {
        ai_move: LastMove {
            from: record.from.to_algebraic(),
            to: record.to.to_algebraic(),
            san: record.notation,
        },
        source: chosen.source,
        game: game_to_response(game),
        thinking_time,
    }))
}

/// POST /api/games/{id}/ai-hint
///
/// Suggests a move for the side to move without playing it. Each game has a
/// limited number of hints.
pub async fn ai_hint(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(input): Json<AiMoveRequest>,
) -> Result<Json<HintResponse>, ApiError> {
    let (position, fen, difficulty) = {
        let games = state.games.read().await;
        let game = games.get(&id).ok_or_else(|| ApiError::GameNotFound(id.clone()))?;
        ensure_playable(game)?;
        if game.hints_remaining() == 0 {
            return Err(ApiError::HintsExhausted);
        }
        let difficulty = resolve_difficulty(&state, input.difficulty.as_deref(), None)?;
        (*game.position(), game.to_fen(), difficulty)
    };

    let start = Instant::now();
    let chosen = {
        let mut oracle = state.oracle.lock().await;
        state
            .player
            .hint(&position, &fen, difficulty, oracle.as_deref_mut())
            .await?
    };
    let thinking_time = start.elapsed().as_millis() as u64;

    let mut games = state.games.write().await;
    let game = games.get_mut(&id).ok_or_else(|| ApiError::GameNotFound(id.clone()))?;
    if *game.position() != position {
        return Err(ApiError::Conflict(
            "game changed while the hint was computed".into(),
        ));
    }
    let hints_remaining = game.register_hint()?;

    Ok(Json(HintResponse {
        hint: move_summary(game, chosen.mv),
        source: chosen.source,
        hints_remaining,
        thinking_time,
    }))
}

// =========================================================================
// Export / snapshot
// =========================================================================

/// GET /api/games/{id}/fen
pub async fn export_fen(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<FenResponse>, ApiError> {
    let games = state.games.read().await;
    let game = games.get(&id).ok_or_else(|| ApiError::GameNotFound(id.clone()))?;
    Ok(Json(FenResponse { fen: game.to_fen() }))
}

/// GET /api/games/{id}/pgn
pub async fn export_pgn(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let games = state.games.read().await;
    let game = games.get(&id).ok_or_else(|| ApiError::GameNotFound(id.clone()))?;

    let pgn = crate::engine::pgn::to_pgn(game);

    Ok((
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        pgn,
    ))
}

/// GET /api/games/{id}/snapshot
pub async fn snapshot(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<GameSnapshot>, ApiError> {
    let games = state.games.read().await;
    let game = games.get(&id).ok_or_else(|| ApiError::GameNotFound(id.clone()))?;
    Ok(Json(game.snapshot()))
}

/// POST /api/games/restore
///
/// Replaces any live game with the same id.
pub async fn restore_game(
    State(state): State<SharedState>,
    Json(snapshot): Json<GameSnapshot>,
) -> Result<(StatusCode, Json<GameResponse>), ApiError> {
    let game = Game::restore(snapshot)?;
    let response = game_to_response(&game);
    info!(game = %game.id, plies = game.history().len(), "game restored");
    state.games.write().await.insert(game.id.clone(), game);
    Ok((StatusCode::CREATED, Json(response)))
}

// =========================================================================
// Helpers
// =========================================================================

/// A move as the client sent it.
enum MoveInput {
    Squares(Pos, Pos, Option<PieceType>),
    San(String),
}

fn parse_square(s: &str) -> Result<Pos, ApiError> {
    Pos::from_algebraic(s).ok_or_else(|| ApiError::InvalidRequest(format!("invalid square: {s}")))
}

fn parse_promotion(s: &str) -> Result<PieceType, ApiError> {
    PieceType::from_promotion_str(s)
        .ok_or_else(|| ApiError::InvalidRequest(format!("invalid promotion piece: {s}")))
}

fn parse_color(s: &str) -> Result<Color, ApiError> {
    match s.to_lowercase().as_str() {
        "white" | "w" => Ok(Color::White),
        "black" | "b" => Ok(Color::Black),
        _ => Err(ApiError::InvalidRequest(format!("invalid color: {s}"))),
    }
}

/// Requested difficulty, else the game's, else the server default.
fn resolve_difficulty(
    state: &SharedState,
    requested: Option<&str>,
    game_default: Option<Difficulty>,
) -> Result<Difficulty, ApiError> {
    match requested {
        Some(s) => Difficulty::from_str_loose(s)
            .ok_or_else(|| ApiError::InvalidRequest(format!("invalid difficulty: {s}"))),
        None => Ok(game_default.unwrap_or(state.config.default_difficulty)),
    }
}

fn ensure_playable(game: &Game) -> Result<(), ApiError> {
    if let Some(over) = game.game_over() {
        return Err(ApiError::GameOver(format!(
            "game is already over: {:?}",
            over.reason
        )));
    }
    if game.pending_promotion().is_some() {
        return Err(ApiError::InvalidRequest(
            "a promotion choice is pending".into(),
        ));
    }
    Ok(())
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::router::create_router;
    use crate::api::state::AppState;
    use crate::config::AppConfig;
    use axum::body::Body;
    use axum::http::{Request, Response, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    fn test_state() -> SharedState {
        AppState::new(AppConfig {
            think_delay_ms: 0,
            ..AppConfig::default()
        })
    }

    async fn body_json(response: Response<Body>) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn body_string(response: Response<Body>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn send(state: &SharedState, request: Request<Body>) -> Response<Body> {
        create_router(state.clone()).oneshot(request).await.unwrap()
    }

    async fn post_json(state: &SharedState, uri: &str, body: &str) -> Response<Body> {
        send(
            state,
            Request::post(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn get(state: &SharedState, uri: &str) -> Response<Body> {
        send(state, Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn create(state: &SharedState, body: &str) -> String {
        let resp = post_json(state, "/api/games", body).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        body_json(resp).await["id"].as_str().unwrap().to_string()
    }

    async fn play(state: &SharedState, id: &str, from: &str, to: &str) -> Response<Body> {
        post_json(
            state,
            &format!("/api/games/{id}/moves"),
            &format!(r#"{{"from":"{from}","to":"{to}"}}"#),
        )
        .await
    }

    // --- Health ---

    #[tokio::test]
    async fn health_returns_200() {
        let resp = get(&test_state(), "/health").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "ok");
        assert!(json["oracle"].is_null());
    }

    #[tokio::test]
    async fn not_found_returns_404() {
        let resp = get(&test_state(), "/nonexistent").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn cors_preflight() {
        let resp = send(
            &test_state(),
            Request::builder()
                .method("OPTIONS")
                .uri("/health")
                .header("Origin", "http://localhost:3001")
                .header("Access-Control-Request-Method", "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().get("access-control-allow-origin").is_some());
    }

    // --- Create / get / list / delete ---

    #[tokio::test]
    async fn create_game_default() {
        let resp = post_json(&test_state(), "/api/games", "{}").await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let json = body_json(resp).await;
        assert!(json["id"].is_string());
        assert_eq!(json["status"], "active");
        assert_eq!(json["currentPlayer"], "white");
        assert_eq!(json["board"].as_array().unwrap().len(), 8);
        assert_eq!(json["board"][0][4]["type"], "king");
        assert_eq!(json["board"][0][4]["color"], "black");
        assert!(json["board"][4][4].is_null());
        assert_eq!(json["clock"]["white"], 600);
        assert_eq!(json["hintsRemaining"], 3);
    }

    #[tokio::test]
    async fn create_game_with_fen_and_computer() {
        let state = test_state();
        let resp = post_json(
            &state,
            "/api/games",
            r#"{"fen":"rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
                "computerColor":"black","difficulty":"easy","clockSeconds":0}"#,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let json = body_json(resp).await;
        assert_eq!(json["currentPlayer"], "black");
        assert_eq!(json["enPassantTarget"], "e3");
        assert_eq!(json["computer"]["color"], "black");
        assert_eq!(json["computer"]["difficulty"], "easy");
        assert!(json.get("clock").is_none());
    }

    #[tokio::test]
    async fn create_game_invalid_fen() {
        let resp = post_json(&test_state(), "/api/games", r#"{"fen":"invalid"}"#).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"]["code"], "INVALID_FEN");
    }

    #[tokio::test]
    async fn create_game_invalid_color() {
        let resp = post_json(&test_state(), "/api/games", r#"{"computerColor":"green"}"#).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn get_list_and_delete() {
        let state = test_state();
        let id = create(&state, "{}").await;

        let resp = get(&state, &format!("/api/games/{id}")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["id"], id);

        let json = body_json(get(&state, "/api/games?status=active").await).await;
        assert_eq!(json["total"], 1);

        let resp = send(
            &state,
            Request::delete(format!("/api/games/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = get(&state, &format!("/api/games/{id}")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    // --- Moves ---

    #[tokio::test]
    async fn make_move_e2e4() {
        let state = test_state();
        let id = create(&state, "{}").await;

        let resp = play(&state, &id, "e2", "e4").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["currentPlayer"], "black");
        assert_eq!(json["moveHistory"].as_array().unwrap().len(), 1);
        assert_eq!(json["moveHistory"][0]["notation"], "e4");
        assert_eq!(json["moveHistory"][0]["piece"]["type"], "pawn");
        assert_eq!(json["lastMove"]["from"], "e2");
        assert_eq!(json["enPassantTarget"], "e3");
    }

    #[tokio::test]
    async fn illegal_move_leaves_game_untouched() {
        let state = test_state();
        let id = create(&state, "{}").await;

        let resp = play(&state, &id, "e2", "e5").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"]["code"], "INVALID_MOVE");

        let json = body_json(get(&state, &format!("/api/games/{id}")).await).await;
        assert_eq!(json["currentPlayer"], "white");
        assert!(json["moveHistory"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn bad_square_is_invalid_request() {
        let state = test_state();
        let id = create(&state, "{}").await;
        let resp = play(&state, &id, "e9", "e4").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"]["code"], "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn san_moves_are_accepted() {
        let state = test_state();
        let id = create(&state, "{}").await;
        let uri = format!("/api/games/{id}/moves");

        for san in ["e4", "e5", "Nf3", "Nc6", "Bc4", "Nf6"] {
            let resp = post_json(&state, &uri, &format!(r#"{{"san":"{san}"}}"#)).await;
            assert_eq!(resp.status(), StatusCode::OK, "{san} rejected");
        }
        let resp = post_json(&state, &uri, r#"{"san":"O-O"}"#).await;
        let json = body_json(resp).await;
        assert_eq!(json["lastMove"]["from"], "e1");
        assert_eq!(json["lastMove"]["to"], "g1");
        assert_eq!(json["moveHistory"][6]["notation"], "O-O");
    }

    #[tokio::test]
    async fn unplayable_san_is_rejected() {
        let state = test_state();
        let id = create(&state, "{}").await;
        let resp = post_json(&state, &format!("/api/games/{id}/moves"), r#"{"san":"Nf6"}"#).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"]["code"], "INVALID_MOVE");
    }

    #[tokio::test]
    async fn move_without_squares_or_san_is_invalid_request() {
        let state = test_state();
        let id = create(&state, "{}").await;
        let resp = post_json(&state, &format!("/api/games/{id}/moves"), r#"{"from":"e2"}"#).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"]["code"], "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn fen_with_capturable_king_is_rejected() {
        let body = r#"{"fen":"4k2R/8/8/8/8/8/8/4K3 w - - 0 1"}"#;
        let resp = post_json(&test_state(), "/api/games", body).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"]["code"], "INVALID_FEN");
    }

    #[tokio::test]
    async fn promotion_round_trip() {
        let state = test_state();
        let id = create(&state, r#"{"fen":"8/4P3/8/8/8/8/k7/4K3 w - - 0 1"}"#).await;

        let resp = play(&state, &id, "e7", "e8").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "awaiting_promotion");
        assert_eq!(json["pendingPromotion"]["to"], "e8");
        assert_eq!(json["board"][0][4]["type"], "pawn");

        let resp = post_json(
            &state,
            &format!("/api/games/{id}/promotion"),
            r#"{"piece":"knight"}"#,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["board"][0][4]["type"], "knight");
        assert_eq!(json["currentPlayer"], "black");
        assert_eq!(json["moveHistory"][0]["notation"], "e8=N");
    }

    #[tokio::test]
    async fn promotion_without_pending_move_conflicts() {
        let state = test_state();
        let id = create(&state, "{}").await;
        let resp = post_json(
            &state,
            &format!("/api/games/{id}/promotion"),
            r#"{"piece":"queen"}"#,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(resp).await["error"]["code"], "NO_PENDING_PROMOTION");
    }

    // --- Undo / reset ---

    #[tokio::test]
    async fn undo_and_reset() {
        let state = test_state();
        let id = create(&state, "{}").await;
        play(&state, &id, "e2", "e4").await;
        play(&state, &id, "e7", "e5").await;

        let resp = post_json(&state, &format!("/api/games/{id}/undo"), "").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["currentPlayer"], "black");
        assert_eq!(json["moveHistory"].as_array().unwrap().len(), 1);

        let resp = post_json(&state, &format!("/api/games/{id}/reset"), "").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert!(json["moveHistory"].as_array().unwrap().is_empty());
        assert_eq!(json["fen"], crate::engine::fen::STARTING_FEN);
    }

    #[tokio::test]
    async fn undo_against_computer_takes_back_both_plies() {
        let state = test_state();
        let id = create(&state, r#"{"computerColor":"black","difficulty":"harmless"}"#).await;
        play(&state, &id, "e2", "e4").await;
        let resp = post_json(&state, &format!("/api/games/{id}/ai-move"), "{}").await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = post_json(&state, &format!("/api/games/{id}/undo"), "").await;
        let json = body_json(resp).await;
        assert_eq!(json["currentPlayer"], "white");
        assert!(json["moveHistory"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn undo_nothing_fails() {
        let state = test_state();
        let id = create(&state, "{}").await;
        let resp = post_json(&state, &format!("/api/games/{id}/undo?plies=1"), "").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"]["code"], "NOTHING_TO_UNDO");
    }

    // --- Legal moves ---

    #[tokio::test]
    async fn legal_moves_starting() {
        let state = test_state();
        let id = create(&state, "{}").await;

        let json = body_json(get(&state, &format!("/api/games/{id}/legal-moves")).await).await;
        assert_eq!(json["moves"].as_array().unwrap().len(), 20);

        let json =
            body_json(get(&state, &format!("/api/games/{id}/legal-moves?from=g1")).await).await;
        assert_eq!(json["destinations"], serde_json::json!(["f3", "h3"]));
        let sans: Vec<&str> = json["moves"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["san"].as_str().unwrap())
            .collect();
        assert_eq!(sans.len(), 2);
        assert!(sans.contains(&"Nf3") && sans.contains(&"Nh3"));
    }

    // --- Computer ---

    #[tokio::test]
    async fn ai_move_without_oracle_plays_random() {
        let state = test_state();
        let id = create(&state, r#"{"computerColor":"white"}"#).await;

        let resp = post_json(&state, &format!("/api/games/{id}/ai-move"), "{}").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["source"], "random");
        assert_eq!(json["currentPlayer"], "black");
        assert_eq!(json["moveHistory"].as_array().unwrap().len(), 1);
        assert!(json["move"]["san"].is_string());
    }

    #[tokio::test]
    async fn ai_move_on_finished_game_conflicts() {
        let state = test_state();
        let id = create(&state, r#"{"fen":"k7/2K5/1Q6/8/8/8/8/8 b - - 0 1"}"#).await;
        let resp = post_json(&state, &format!("/api/games/{id}/ai-move"), "{}").await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn hints_are_limited() {
        let state = test_state();
        let id = create(&state, "{}").await;

        for remaining in (0..3).rev() {
            let resp = post_json(&state, &format!("/api/games/{id}/ai-hint"), "{}").await;
            assert_eq!(resp.status(), StatusCode::OK);
            let json = body_json(resp).await;
            assert_eq!(json["hintsRemaining"], remaining);
        }

        let resp = post_json(&state, &format!("/api/games/{id}/ai-hint"), "{}").await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

        // Hints never move pieces.
        let json = body_json(get(&state, &format!("/api/games/{id}")).await).await;
        assert!(json["moveHistory"].as_array().unwrap().is_empty());
    }

    // --- Export / snapshot ---

    #[tokio::test]
    async fn fen_and_pgn_export() {
        let state = test_state();
        let id = create(&state, r#"{"whitePlayer":"Ann"}"#).await;
        play(&state, &id, "e2", "e4").await;

        let json = body_json(get(&state, &format!("/api/games/{id}/fen")).await).await;
        assert_eq!(
            json["fen"],
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
        );

        let resp = get(&state, &format!("/api/games/{id}/pgn")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let pgn = body_string(resp).await;
        assert!(pgn.contains("[White \"Ann\"]"));
        assert!(pgn.contains("1. e4 *"));
    }

    #[tokio::test]
    async fn snapshot_restores_into_fresh_server() {
        let state = test_state();
        let id = create(&state, "{}").await;
        play(&state, &id, "e2", "e4").await;
        play(&state, &id, "d7", "d5").await;

        let snapshot = body_string(get(&state, &format!("/api/games/{id}/snapshot")).await).await;

        let other = test_state();
        let resp = post_json(&other, "/api/games/restore", &snapshot).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let json = body_json(resp).await;
        assert_eq!(json["id"], id);
        assert_eq!(json["enPassantTarget"], "d6");

        let resp = play(&other, &id, "e4", "d5").await;
        let json = body_json(resp).await;
        assert_eq!(json["capturedPieces"]["white"][0]["type"], "pawn");
        assert_eq!(json["score"]["white"], 1);
    }

    #[tokio::test]
    async fn tampered_snapshot_is_rejected() {
        let state = test_state();
        let id = create(&state, "{}").await;
        play(&state, &id, "e2", "e4").await;

        let snapshot = body_string(get(&state, &format!("/api/games/{id}/snapshot")).await).await;
        let mut value: Value = serde_json::from_str(&snapshot).unwrap();
        value["history"] = serde_json::json!([]);

        let resp = post_json(&test_state(), "/api/games/restore", &value.to_string()).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
