mod env_overrides;
mod loader;
mod types;

pub use loader::FileConfigLoader;
pub use types::Config;
