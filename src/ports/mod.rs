/// Ports module defining interfaces for hexagonal architecture
///
/// The update manager is driven by the CLI directly, so only outbound
/// (driven) ports are defined.
pub mod outbound;
