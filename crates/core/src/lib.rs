pub mod config;
pub mod converter;
pub mod coordinator;
pub mod metrics;
pub mod notify;
pub mod policy;
pub mod storage;
pub mod testing;
pub mod worker;

pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError, NotifyConfig, ServerConfig, StorageConfig,
};
pub use converter::{Converter, ConverterConfig, ConverterError, FfmpegConverter};
pub use coordinator::{CoordinatorStatus, JobCoordinator};
pub use notify::{ObserverConnection, ObserverId, ObserverRegistry};
pub use policy::{select_policy, EncodingPolicy, PolicyConfig, PolicyDecision, PolicyError};
pub use storage::{is_storage_name, StorageError, StorageNamer};
pub use worker::{
    JobError, JobResult, PolicyAnnouncement, TranscodeWorker, UploadDescriptor, WorkerMessage,
};
