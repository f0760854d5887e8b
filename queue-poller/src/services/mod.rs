mod polling_service;
mod processing_service;
pub mod server;

pub use polling_service::PollingService;
pub use processing_service::ProcessingService;

/// The capacity of each queue's channel between its polling workers and its processing
/// service. A full channel stops the workers from polling, so a slow processor never holds
/// more than this many received messages in memory.
pub const MPSC_CHANNEL_BOUND: usize = 1_000;
