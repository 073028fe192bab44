pub mod movement;
pub mod collision;
pub mod rules;

pub use movement::*;
pub use collision::*;
pub use rules::*;
