// Library surface for headless/integration tests and reuse.
// Terminal setup and the CLI stay in main.rs.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod logging;
pub mod passage;
pub mod runtime;
pub mod session;
pub mod terminal;
pub mod ui;

pub use app::{App, Command};
pub use error::{Error, Result};
pub use session::{Effect, Phase, Session, SessionConfig};
