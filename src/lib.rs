// Branching game explorer: position tree, cursor, loaders and view models
pub mod board;
pub mod error;
pub mod repl;
pub mod session;
pub mod snapshot;
pub mod tree;
pub mod view;

pub use board::{MoveAttempt, PromotionPiece, RulesEngine, ShakmatyRules, START_FEN};
pub use error::{ErrorCode, ExplorerError};
pub use session::{Mode, MoveListMeta, MoveOutcome, PgnMeta, Session, SessionParams, Source};
pub use snapshot::GameSnapshot;
pub use tree::{Node, NodeId, Tree};
