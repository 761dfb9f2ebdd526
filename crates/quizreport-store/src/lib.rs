//! quizreport-store: Backends for report inputs and settings.
//!
//! Implements the `DataSource`, `TemplateStore` and `PacketStore` traits
//! against the assessment server's REST API, a directory of JSON files, and
//! an in-memory store for tests.

pub mod config;
pub mod directory;
pub mod error;
pub mod http;
pub mod memory;

pub use config::{create_backend, load_config, load_config_from, BackendConfig, QuizreportConfig};
pub use directory::{DirectoryBackend, RecordKind};
pub use error::StoreError;
pub use http::HttpBackend;
pub use memory::MemoryBackend;
