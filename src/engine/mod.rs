pub mod blend;
pub mod chart;
pub mod draws;
pub mod drive;
pub mod outcome;
pub mod play_select;
pub mod state;

pub use drive::DriveMachine;
pub use state::{Coach, GameState, PlayChoice, Possession, UiMode};
