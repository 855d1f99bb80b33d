mod convert;
mod format;
mod task;

pub use convert::parse_amount;
pub use convert::round_dp;
pub use format::format_conversion;
pub use format::format_pool_line;
pub use format::short_address;
pub use task::ScheduledTask;
