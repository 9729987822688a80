//! Terminal presentation: menus, the interactive selector prompt, notices
//! and label formatting

pub mod format;
pub mod menu;
pub mod notice;
pub mod prompt;
