pub mod poll;
pub mod source;
pub mod watcher;

pub use poll::poll_once;
pub use source::{SeedPolicy, Source};
pub use watcher::Watcher;
