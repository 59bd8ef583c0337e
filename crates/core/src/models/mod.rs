//! Data models for Tilehunt

mod ids;
mod participant;
mod session;

pub use ids::*;
pub use participant::*;
pub use session::*;
