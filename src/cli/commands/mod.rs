pub mod apps;
pub mod config;
pub mod demo;
pub mod tui;

pub use apps::apps_command;
pub use config::config_command;
pub use demo::demo_command;
pub use tui::tui_command;
