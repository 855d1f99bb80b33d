mod channel;
mod event_source;
pub mod events;
pub mod frame;
mod websocket;

pub use channel::EventChannel;
pub use event_source::ChannelSource;
pub use event_source::EventSource;
pub use events::AgentEvent;
pub use websocket::WebSocketEventSource;
