pub mod http_backend;
pub mod models;

pub use http_backend::HttpBackend;
