pub mod board;
pub mod preview;
