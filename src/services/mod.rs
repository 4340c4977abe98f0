// src/services/mod.rs

//! Feed fetching, parsing, and notification services.

pub mod feed;
pub mod notify;
pub mod parser;

pub use feed::{FeedSource, HttpFeedClient};
pub use notify::{Notifier, NotifyOutcome, WebhookNotifier};
pub use parser::parse_feed;
