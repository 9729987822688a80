//! Static menus

use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};

use crate::types::MenuItem;

/// Pick one entry of a fixed menu. `None` when the menu is empty or the user
/// pressed Esc.
pub fn choose<T: Clone>(items: &[MenuItem<T>], prompt: &str) -> Option<T> {
    if items.is_empty() {
        return None;
    }

    let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .items(&labels)
        .default(0)
        .interact_opt()
        .ok()
        .flatten()?;

    items.get(selection).map(|item| item.value.clone())
}

/// Free-text prompt; `None` on terminal errors
pub fn ask(prompt: &str, allow_empty: bool) -> Option<String> {
    Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .allow_empty(allow_empty)
        .interact_text()
        .ok()
}

/// Yes/no prompt; Esc counts as "no"
pub fn confirm(prompt: &str) -> bool {
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact_opt()
        .ok()
        .flatten()
        .unwrap_or(false)
}
