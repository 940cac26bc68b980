mod client;
pub mod discovery;
pub mod model;

pub use client::{base_url, BondClient};
pub use model::{Action, ActionArgument, BondObject, ObjectKind};
