pub mod loopback;
pub mod session;
pub mod stack;

pub use loopback::LoopbackStack;
pub use session::Session;
pub use stack::{Connection, DialOptions, OverlayStack};
