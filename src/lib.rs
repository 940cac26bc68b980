pub mod bond;
pub mod config;
pub mod consts;
pub mod error;
pub mod loxone;
pub mod pipeline;

pub use error::{Error, Result};
pub use pipeline::{run, Settings, Summary};
