//! Supporting patterns around the persistence core
//!
//! - `logger`: keyed logger registry with pluggable writers
//! - `observer`: category observers and the notifiers built on the logger
//! - `user`: user factory keyed by kind name
//! - `serializer`: JSON save/load of entity collections

pub mod logger;
pub mod observer;
pub mod serializer;
pub mod user;

pub use logger::{FileWriter, LogWriter, Logger, LoggerRegistry, TracingWriter};
pub use observer::{EmailNotifier, Observer, SmsNotifier};
pub use serializer::Serializer;
pub use user::{User, UserKind};
