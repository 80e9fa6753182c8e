//! Overlink public prelude (curated stable-intent exports).
//! Import with: `use overlink::prelude::*;`
//!
//! Items here are considered *stable-intent* prior to 1.0.0. Their shape may
//! still adjust minimally until the first tagged release, but we aim to avoid
//! breaking renames or removals. Exclusions are deliberate.

pub use crate::config::Config;
pub use crate::identity::IdentityConfig;
pub use crate::network::catalog::Protocol;
pub use crate::runtime::{LoopbackStack, OverlayStack, Session};
pub use crate::status::{Failure, Status};
