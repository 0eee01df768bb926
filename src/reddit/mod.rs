// Reddit API access: client, rate limiting, listing types, question fetching.

pub mod client;
pub mod listing;
pub mod questions;
pub mod rate_limit;
pub mod traits;
