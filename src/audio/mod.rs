pub mod autoplay;
pub mod queue;
pub mod session;
pub mod track;
pub mod transport;
pub mod worker;
