pub mod engine;
pub mod oracle;
pub mod player;
pub mod uci;

pub use engine::{AiEngine, RandomAi};
pub use oracle::{OracleError, SearchOracle, UciOracle, budget_for};
pub use player::{ChosenMove, ComputerPlayer, MoveSource};
pub use uci::{SearchBudget, UciCommand, UciReply};
