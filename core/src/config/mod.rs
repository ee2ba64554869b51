mod load;
mod types;

pub use load::{finalize, get_data_dir, load_default, load_from};
pub use types::{
    AiServiceConfig, AppConfig, ContextMode, LoggingConfig, SchedulerConfig, StorageConfig,
};
