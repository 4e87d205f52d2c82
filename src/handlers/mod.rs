pub mod health;
pub mod poll;

pub use health::health;
pub use poll::{AppState, handle_host_resources};
