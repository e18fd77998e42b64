//! Storage adapters, identifier generation and small helpers shared by the
//! Swatch engine and CLI.

pub mod id_generator;
pub mod record_store;
pub mod storage_config;
pub mod uri_component;

pub use id_generator::{IdGenerator, SequentialIdGenerator, UuidGenerator};
pub use record_store::{
    DEFAULT_EXPIRY_DAYS, InMemoryRecordStore, JsonFileRecordStore, MAX_RECORD_BYTES, RecordOptions, RecordStore, RecordStoreError,
};
pub use storage_config::{StorageConfig, expand_tilde};
pub use uri_component::{ComponentDecodeError, decode_component, encode_component};
