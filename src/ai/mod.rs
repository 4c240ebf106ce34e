//! Pursuer AI: grid search, line of sight and the decision loop built on
//! top of them. Nothing here depends on the ECS.

pub mod path;
pub mod pursuer;
pub mod sight;

pub use path::find_path;
pub use pursuer::{PursuerAgent, PursuerMode, Steering, TickReport};
pub use sight::is_visible;
