// Pipelines that tie fetching, caching and analysis together.

pub mod fetch;
