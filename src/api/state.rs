use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::ai::{ComputerPlayer, SearchOracle};
use crate::config::AppConfig;
use crate::engine::game::Game;

/// Games stored by UUID.
pub type GameStore = RwLock<HashMap<String, Game>>;

/// Shared application state passed to all handlers via Axum's State extractor.
pub struct AppState {
    pub games: GameStore,
    pub config: AppConfig,
    pub start_time: Instant,
    /// The search oracle, if one is running. The lock keeps searches from
    /// overlapping.
    pub oracle: Mutex<Option<Box<dyn SearchOracle>>>,
    pub player: ComputerPlayer,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// State without a search oracle; the computer plays random moves.
    pub fn new(config: AppConfig) -> SharedState {
        Self::with_oracle(config, None)
    }

    pub fn with_oracle(config: AppConfig, oracle: Option<Box<dyn SearchOracle>>) -> SharedState {
        let player = ComputerPlayer::new(config.ai_timeout(), config.think_delay());
        Arc::new(AppState {
            games: RwLock::new(HashMap::new()),
            config,
            start_time: Instant::now(),
            oracle: Mutex::new(oracle),
            player,
        })
    }

    /// Quit the search oracle. Later computer moves fall back to random.
    pub async fn shutdown_oracle(&self) {
        let Some(mut oracle) = self.oracle.lock().await.take() else {
            return;
        };
        match oracle.shutdown().await {
            Ok(()) => info!(engine = oracle.name(), "search oracle stopped"),
            Err(err) => warn!(%err, "search oracle did not shut down cleanly"),
        }
    }

    /// Advance every timed game by one second.
    pub async fn tick_clocks(&self) {
        let mut games = self.games.write().await;
        for game in games.values_mut() {
            if let Some(over) = game.tick() {
                debug!(game = %game.id, winner = ?over.winner, "flag fell");
            }
        }
    }
}

/// Tick all clocks once per second until the runtime shuts down.
pub fn spawn_clock_ticker(state: SharedState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        interval.tick().await;
        loop {
            interval.tick().await;
            state.tick_clocks().await;
        }
    })
}
