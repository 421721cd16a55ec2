/// Configuration adapters
mod fragment_config_resolver;

pub use fragment_config_resolver::FragmentConfigResolver;
