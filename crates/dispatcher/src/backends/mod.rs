//! Backend implementations

mod console;
mod recording;

pub use console::{
    format_delete_profile, format_event, format_identify, format_user_properties, ConsoleBackend,
    ConsoleConfig,
};
pub use recording::{RecordedCall, Recording, RecordingBackend};

use contracts::{Backend, BackendConfig, BackendType};

use crate::error::DispatcherError;

/// Create a backend from configuration
pub fn create_backend(config: &BackendConfig) -> Result<Box<dyn Backend>, DispatcherError> {
    match config.backend_type {
        BackendType::Console => {
            let console_config = ConsoleConfig::from_backend_config(config)
                .map_err(|e| DispatcherError::backend_creation(&config.name, e.to_string()))?;
            Ok(Box::new(ConsoleBackend::new(&config.name, console_config)))
        }
    }
}
