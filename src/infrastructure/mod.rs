// Infrastructure module - Background services, retry state and REST collaborators
pub mod demo;
pub mod http;
pub mod task_manager;
pub mod timer;

pub use demo::{demo_queue, demo_statistics};
pub use http::{QueueApi, ws_to_http_endpoint};
pub use task_manager::TaskManager;
pub use timer::Timer;
