pub mod activity;
pub mod board;
pub mod preview;
pub mod toasts;

pub use activity::show_activity;
pub use board::{BoardView, OpenPreview};
pub use preview::PreviewView;
pub use toasts::Toasts;
