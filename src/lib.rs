pub mod config;
pub mod error;
pub mod mediator;
pub mod music;
pub mod score;

pub use config::MediatorConfig;
pub use error::{Error, Result};
pub use mediator::{Event, Mediator};
pub use score::Score;
