pub mod api;
pub mod chain;
pub mod config;
pub mod datasource;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;
pub mod store;

pub use chain::{CallError, ChainReader, MockChainReader, RpcChainReader};
pub use config::Config;
pub use datasource::{
    DataSourceError, EventSource, InstanceRegistry, JsonlEventSource, MockEventSource,
    StoreInstanceRegistry,
};
pub use db::{init_db, SqliteStore};
pub use domain::{Address, Decimal, LogEvent, ProtocolEvent, RawAmount, TxHash};
pub use engine::{Outcome, Projector, ProjectorSettings};
pub use error::AppError;
pub use orchestration::{EventRouter, Runner};
pub use store::{EntityDirectory, MemoryStore, StagedStore, Store, StoreError, StoredEntity};
