pub mod pool;
mod log_entry;
mod price;
mod session;

pub use pool::MoneyBreakdown;
pub use pool::Pool;
pub use pool::PoolPatch;
pub use pool::PoolSnapshot;
pub use pool::DEFAULT_BASE_TOKEN;
pub use log_entry::LogEntry;
pub use log_entry::LogLevel;
pub use price::PortfolioSnapshot;
pub use price::PriceResponse;
pub use price::PriceSnapshot;
pub use session::BuyUnit;
pub use session::DiscoveryMode;
pub use session::FeeTier;
pub use session::RangeFilter;
pub use session::SessionConfig;
pub use session::StartPayload;
