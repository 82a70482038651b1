pub mod branch;
pub mod ops;
pub mod push;
pub mod template;

mod app;
pub mod commands;
pub mod config;
pub mod error;

// Re-export App and Config from modules
pub use app::App;
pub use app::CommitRef;
pub use app::HeadAction;
pub use app::Plan;
pub use config::Config;
pub use config::Invocation;

// Disable colors for all tests to get clean output
#[cfg(test)]
#[ctor::ctor]
fn init_tests() {
    colored::control::set_override(false);
}
