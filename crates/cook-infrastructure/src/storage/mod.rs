pub mod secret_storage;
pub mod settings_storage;

pub use secret_storage::SecretStorage;
pub use settings_storage::SettingsStorage;
