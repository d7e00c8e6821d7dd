// Messaging module - Frame decoding, observer registry and fan-out
pub mod event;
pub mod registry;
pub mod router;

pub use event::FeedEvent;
pub use registry::{Observer, ObserverId, ObserverRegistry};
pub use router::MessageRouter;
