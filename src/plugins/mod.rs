pub mod http_dist_tags;
pub mod npm_plugin;

pub use http_dist_tags::HttpDistTagClient;
pub use npm_plugin::{NpmPlugin, QuerySource};
