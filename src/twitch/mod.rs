pub mod client;
pub mod source;
pub mod types;

pub use client::TwitchClient;
pub use source::TwitchSource;
