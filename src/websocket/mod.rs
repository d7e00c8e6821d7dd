mod factory;

pub use factory::{FrameSink, FrameStream, Transport, TransportFactory, WebSocketFactory};
