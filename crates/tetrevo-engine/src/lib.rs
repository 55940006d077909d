pub use self::{board::*, piece_source::*, tetramino::*};

pub mod board;
pub mod piece_source;
pub mod tetramino;
