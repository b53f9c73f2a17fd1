//! CLI command implementations.

mod call;
mod config;
mod doctor;
mod list;
mod mcp;
mod questions;
mod serve;
mod smoke;

pub use call::run_call;
pub use config::run_config;
pub use doctor::run_doctor;
pub use list::run_list;
pub use mcp::run_mcp;
pub use questions::run_questions;
pub use serve::run_serve;
pub use smoke::run_smoke;
