pub use self::{game::*, protocol::*, rating::*};

pub mod game;
pub mod protocol;
pub mod rating;
