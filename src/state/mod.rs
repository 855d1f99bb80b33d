mod console;
mod flag;
mod log_buffer;
mod pool_registry;

pub use console::ConsoleState;
pub use console::SharedState;
pub use flag::RunningFlag;
pub use flag::SharedFlag;
pub use flag::VisibilityFlag;
pub use log_buffer::LogBuffer;
pub use log_buffer::LOG_CAPACITY;
pub use pool_registry::AgeClassification;
pub use pool_registry::PoolRegistry;
pub use pool_registry::UpdateOutcome;
