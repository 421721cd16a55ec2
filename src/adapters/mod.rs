/// Adapters layer - Infrastructure implementations
///
/// Concrete implementations of the outbound ports: configuration, locks,
/// storage, updaters, the file system and the console.
pub mod outbound;
