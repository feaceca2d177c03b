pub mod delegated;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod hls;
pub mod model;
pub mod platform;
pub mod poller;
pub mod profile;
pub mod resolver;
pub mod select;
pub mod util;

pub use error::{KanshiError, KanshiResult};
pub use extract::Extract;
pub use fetch::{Fetch, HttpFetcher, Method, PageRequest};
pub use model::*;
pub use platform::PlatformKind;
pub use profile::PlatformProfile;
pub use resolver::{Resolver, ResolverBuilder};
pub use select::select_stream;

// Re-export
pub use async_trait::async_trait;
pub use regex;
pub use serde_json;
