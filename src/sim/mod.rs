pub mod event;
pub mod loader;
pub mod progress;
pub mod session;
pub mod world;
