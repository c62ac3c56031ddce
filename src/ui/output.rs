use owo_colors::OwoColorize;

use crate::ui::{theme, Icons};

pub fn title(text: &str) {
    println!("{} {}", Icons::GAME, text.style(theme().title.clone()));
}

/// `label: value` line under a leading icon
pub fn field(icon: &str, label: &str, value: &str) {
    println!("{} {}: {}", icon, label.style(theme().label.clone()), value);
}

pub fn done(message: &str) {
    println!("{} {}", Icons::CHECK, message.style(theme().ok.clone()));
}

/// Confirmation for a committed entity, e.g. `Category 'Action' created (id 3)`
pub fn created(kind: &str, name: &str, id: i64, detail: &str) {
    let id = format!("id {}", id);
    println!(
        "{} {} '{}' created ({}){}",
        Icons::CHECK,
        kind.style(theme().ok.clone()),
        name,
        id.style(theme().id.clone()),
        detail
    );
}

pub fn failure(message: &str) {
    eprintln!("{} {}", Icons::CROSS, message.style(theme().failure.clone()));
}

pub fn caution(message: &str) {
    eprintln!("{} {}", Icons::WARN, message.style(theme().caution.clone()));
}

/// Titled block holding a rendered table, or a placeholder when there are no rows
pub fn listing(icon: &str, heading: &str, table: Option<String>) {
    println!();
    println!("{} {}", icon, heading.style(theme().title.clone()));
    match table {
        Some(table) => println!("{}", table),
        None => println!("  {}", format!("No {} yet.", heading.to_lowercase()).style(theme().label.clone())),
    }
}
