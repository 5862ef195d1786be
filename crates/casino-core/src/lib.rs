pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod gate;
pub mod session;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

// Re-export main types for convenience
pub use auth::{basic_token, probe_login};
pub use client::{ApiClient, ConsoleResponse, Download, RequestDescriptor, Transport};
pub use config::Config;
pub use error::{ApiError, LoginError, StorageError};
pub use gate::{guard, post_login_target, GateDecision, PageId, Route, Section};
pub use session::{FileStorage, MemoryStorage, Session, SessionStorage, SessionStore};
