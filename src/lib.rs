// subsift: subreddit question fetcher and query frequency analysis.
//
// This is the library root. Each module corresponds to one stage of the
// fetch -> count -> display flow.

pub mod analysis;
pub mod config;
pub mod output;
pub mod pipeline;
pub mod reddit;
pub mod snapshot;
