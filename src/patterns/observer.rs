//! Observers notified when a game is added to a category

use std::sync::Arc;

use crate::domain::Category;
use super::logger::{Logger, LoggerRegistry};

/// Receives the category after a game was appended to it
pub trait Observer: Send + Sync {
    fn update(&self, subject: &Category);
}

/// Announces new games by "email" through the `notifier` logger
#[derive(Debug, Clone)]
pub struct EmailNotifier {
    logger: Arc<Logger>,
}

impl EmailNotifier {
    pub fn new(loggers: &LoggerRegistry) -> Self {
        Self { logger: loggers.get("notifier") }
    }
}

impl Observer for EmailNotifier {
    fn update(&self, subject: &Category) {
        if let Some(game) = subject.games.last() {
            self.logger.log(&format!(
                "Email: game '{}' was added to category '{}'",
                game.read().name,
                subject.name
            ));
        }
    }
}

/// Announces new games by "SMS" through the `notifier` logger
#[derive(Debug, Clone)]
pub struct SmsNotifier {
    logger: Arc<Logger>,
}

impl SmsNotifier {
    pub fn new(loggers: &LoggerRegistry) -> Self {
        Self { logger: loggers.get("notifier") }
    }
}

impl Observer for SmsNotifier {
    fn update(&self, subject: &Category) {
        if let Some(game) = subject.games.last() {
            self.logger.log(&format!(
                "SMS: '{}' now has {} game(s), latest '{}'",
                subject.name,
                subject.games.len(),
                game.read().name
            ));
        }
    }
}
