//! Registry trait for self-registering backend implementations.

/// Base trait for implementation registries.
///
/// Each backend module (storage, remote) provides a `Registry` struct that
/// implements this trait, declaring the name used under
/// `<section>.implementations.<name>` in the configuration and the factory
/// that builds it.
pub trait ImplementationRegistry {
	/// The name used in configuration files, e.g. "memory" for
	/// `storage.implementations.memory`.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	fn factory() -> Self::Factory;
}
