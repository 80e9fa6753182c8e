pub mod catalog;
pub(crate) mod dial;
pub(crate) mod enroll;
pub(crate) mod events;
pub mod relay;

pub use catalog::{Protocol, ServiceCatalog};
pub use relay::StreamRelay;
