pub mod http;
pub mod state;

pub use http::HttpBackend;
pub use state::Storefront;
