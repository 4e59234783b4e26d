//! CLI command implementations.

mod audio;
mod chat;
mod config;
mod doctor;
mod files;
mod flashcards;
mod menu;
mod quiz;
mod records;
mod summary;

pub use config::run_config;
pub use doctor::run_doctor;
pub use files::{run_delete, run_extensions, run_list, run_upload};
pub use menu::{menu_loop, run_menu};
