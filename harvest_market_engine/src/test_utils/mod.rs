pub mod memory_directory;
#[cfg(feature = "sqlite")]
pub mod prepare_env;
