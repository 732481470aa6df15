pub mod client;
pub mod feed;
pub mod source;

pub use client::{YouTubeClient, extract_channel_id, is_channel_id};
pub use feed::parse_feed;
pub use source::YouTubeSource;
