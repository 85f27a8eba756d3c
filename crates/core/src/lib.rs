pub mod config;
pub mod convertor;
pub mod testing;

pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use convertor::{
    BackendError, ConversionBackend, ConversionObserver, Convertor, ConvertorConfig,
    ConvertorError, ConvertorStatus, FileRef, InputFormat, JobHandle, JobSnapshot, JobState,
    OutputFormat, SimulatedBackend, SimulatedBackendConfig, TickSource,
};
