pub mod connected;
pub mod disconnected;
pub mod stats;
