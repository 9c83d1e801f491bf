// Adapters layer: concrete implementations of the domain ports.

pub mod http;
pub mod notify;
pub mod storage;

pub use http::RemoteVerifier;
pub use notify::TracingNotifier;
pub use storage::LocalCourseStore;
