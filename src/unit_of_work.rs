//! Unit of work - batches entity changes until commit
//!
//! Pending changes are kept in three append-only lists. `commit` flushes
//! them through the mapper registry in a fixed order (new, modified,
//! removed), one statement per entity, and then empties every list.
//! There is no surrounding transaction: statements that ran before a
//! failure stay applied.

use serde::Serialize;
use crate::domain::Entity;
use crate::mapper::MapperRegistry;
use crate::{Error, Result};

/// Statements applied by a successful commit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CommitSummary {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl CommitSummary {
    pub fn total(&self) -> usize {
        self.inserted + self.updated + self.deleted
    }
}

#[derive(Debug, Clone, Copy)]
enum Change {
    New,
    Modified,
    Removed,
}

/// Pending new/modified/removed entities plus the registry that persists them
#[derive(Debug)]
pub struct UnitOfWork {
    registry: MapperRegistry,
    new_objects: Vec<Entity>,
    modified_objects: Vec<Entity>,
    removed_objects: Vec<Entity>,
}

impl UnitOfWork {
    pub fn new(registry: MapperRegistry) -> Self {
        Self {
            registry,
            new_objects: Vec::new(),
            modified_objects: Vec::new(),
            removed_objects: Vec::new(),
        }
    }

    pub fn registry(&self) -> &MapperRegistry {
        &self.registry
    }

    pub fn register_new(&mut self, entity: Entity) {
        self.new_objects.push(entity);
    }

    pub fn register_modify(&mut self, entity: Entity) {
        self.modified_objects.push(entity);
    }

    pub fn register_removed(&mut self, entity: Entity) {
        self.removed_objects.push(entity);
    }

    pub fn new_objects(&self) -> &[Entity] {
        &self.new_objects
    }

    pub fn modified_objects(&self) -> &[Entity] {
        &self.modified_objects
    }

    pub fn removed_objects(&self) -> &[Entity] {
        &self.removed_objects
    }

    /// Number of changes waiting for commit
    pub fn pending(&self) -> usize {
        self.new_objects.len() + self.modified_objects.len() + self.removed_objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending() == 0
    }

    /// Flush pending changes: inserts, then updates, then deletes.
    ///
    /// Stops at the first failing statement and returns
    /// [`Error::PartialCommit`]. Either way all pending lists are empty
    /// afterwards, so callers must re-register anything they want retried.
    pub fn commit(&mut self) -> Result<CommitSummary> {
        let pending = self.pending();
        let new_objects = std::mem::take(&mut self.new_objects);
        let modified_objects = std::mem::take(&mut self.modified_objects);
        let removed_objects = std::mem::take(&mut self.removed_objects);

        let batches = [
            (Change::New, new_objects),
            (Change::Modified, modified_objects),
            (Change::Removed, removed_objects),
        ];

        let mut summary = CommitSummary::default();
        for (change, entities) in &batches {
            for entity in entities {
                if let Err(e) = self.apply(*change, entity) {
                    let applied = summary.total();
                    tracing::error!(%entity, applied, "Commit stopped: {}", e);
                    return Err(Error::PartialCommit {
                        applied,
                        dropped: pending - applied,
                        source: Box::new(e),
                    });
                }
                match change {
                    Change::New => summary.inserted += 1,
                    Change::Modified => summary.updated += 1,
                    Change::Removed => summary.deleted += 1,
                }
            }
        }

        tracing::debug!(
            inserted = summary.inserted,
            updated = summary.updated,
            deleted = summary.deleted,
            "Unit of work committed"
        );
        Ok(summary)
    }

    fn apply(&self, change: Change, entity: &Entity) -> Result<()> {
        let mapper = self.registry.get_mapper(entity);
        match change {
            Change::New => mapper.insert(entity),
            Change::Modified => mapper.update(entity),
            Change::Removed => mapper.delete(entity),
        }
    }
}

/// Per-request holder of the active unit of work.
///
/// The unit of work must be started explicitly with [`WorkContext::begin`];
/// asking for it earlier is a usage error, never an implicit creation.
#[derive(Debug, Default)]
pub struct WorkContext {
    unit_of_work: Option<UnitOfWork>,
}

impl WorkContext {
    /// Context with no unit of work yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Context with a fresh unit of work bound to `registry`
    pub fn begin(registry: MapperRegistry) -> Self {
        let mut context = Self::new();
        context.set_current(UnitOfWork::new(registry));
        context
    }

    /// Replace the active unit of work, dropping any pending changes
    pub fn set_current(&mut self, unit_of_work: UnitOfWork) {
        if let Some(previous) = &self.unit_of_work {
            if !previous.is_empty() {
                tracing::warn!(pending = previous.pending(), "Discarding uncommitted unit of work");
            }
        }
        self.unit_of_work = Some(unit_of_work);
    }

    /// The active unit of work, or [`Error::UnitOfWorkNotInitialized`]
    pub fn unit_of_work(&mut self) -> Result<&mut UnitOfWork> {
        self.unit_of_work.as_mut().ok_or(Error::UnitOfWorkNotInitialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, DomainObject, Game, GameCategoryLink, Shared};
    use crate::mapper::Mapper;
    use crate::storage::Store;

    fn registry() -> MapperRegistry {
        MapperRegistry::new(Store::open_in_memory().unwrap().with_statement_journal())
    }

    fn game(id: i64, name: &str) -> Shared<Game> {
        Shared::new(Game::new(id, name, "", 5.0, "2000-01-01"))
    }

    #[test]
    fn test_mark_new_then_commit_issues_one_insert_per_entity() {
        let registry = registry();
        let mut uow = UnitOfWork::new(registry.clone());

        game(1, "Doom").mark_new(&mut uow);
        Shared::new(Category::new(1, "Shooter")).mark_new(&mut uow);
        Shared::new(GameCategoryLink::new(1, 1, 1)).mark_new(&mut uow);

        let summary = uow.commit().unwrap();
        assert_eq!(summary, CommitSummary { inserted: 3, updated: 0, deleted: 0 });

        let journal = registry.store().journal();
        assert_eq!(journal.len(), 3);
        assert!(journal[0].starts_with("INSERT INTO games "));
        assert!(journal[1].starts_with("INSERT INTO categories "));
        assert!(journal[2].starts_with("INSERT INTO games_categories "));
    }

    #[test]
    fn test_commit_orders_insert_update_delete() {
        let registry = registry();
        let existing = game(1, "Doom");
        let doomed = game(2, "Quake");
        registry.games().insert(&existing).unwrap();
        registry.games().insert(&doomed).unwrap();

        let mut uow = UnitOfWork::new(registry.clone());
        // Registered in reverse of commit order on purpose
        doomed.mark_removed(&mut uow);
        existing.mark_modify(&mut uow);
        game(3, "Myst").mark_new(&mut uow);

        uow.commit().unwrap();

        let journal = registry.store().journal();
        let verbs: Vec<&str> = journal[2..]
            .iter()
            .map(|sql| sql.split_whitespace().next().unwrap())
            .collect();
        assert_eq!(verbs, vec!["INSERT", "UPDATE", "DELETE"]);
    }

    #[test]
    fn test_commit_clears_pending_lists() {
        let mut uow = UnitOfWork::new(registry());
        game(1, "Doom").mark_new(&mut uow);
        assert_eq!(uow.pending(), 1);

        uow.commit().unwrap();

        assert!(uow.new_objects().is_empty());
        assert!(uow.modified_objects().is_empty());
        assert!(uow.removed_objects().is_empty());
    }

    #[test]
    fn test_partial_failure_keeps_earlier_statements_and_clears_lists() {
        let registry = registry();
        let mut uow = UnitOfWork::new(registry.clone());

        game(1, "Doom").mark_new(&mut uow);
        game(2, "Quake").mark_new(&mut uow);
        // Violates the store's unique name constraint
        game(3, "Doom").mark_new(&mut uow);
        game(4, "Myst").mark_new(&mut uow);
        game(5, "Riven").mark_new(&mut uow);

        let err = uow.commit().unwrap_err();
        match &err {
            Error::PartialCommit { applied, dropped, source } => {
                assert_eq!(*applied, 2);
                assert_eq!(*dropped, 3);
                assert!(matches!(**source, Error::Commit(_)));
            }
            other => panic!("expected PartialCommit, got {other:?}"),
        }
        assert!(err.is_persistence());

        assert!(uow.is_empty());
        let names: Vec<String> = registry.games().all().unwrap().iter().map(|g| g.read().name.clone()).collect();
        assert_eq!(names, vec!["Doom", "Quake"]);
    }

    #[test]
    fn test_duplicate_registration_persists_twice() {
        let registry = registry();
        let mut uow = UnitOfWork::new(registry.clone());
        let link = Shared::new(GameCategoryLink::new(1, 1, 1));

        link.mark_new(&mut uow);
        link.mark_new(&mut uow);
        let summary = uow.commit().unwrap();

        assert_eq!(summary.inserted, 2);
        assert_eq!(registry.game_categories().all().unwrap().len(), 2);
    }

    #[test]
    fn test_mutation_after_registration_is_persisted() {
        let registry = registry();
        let mut uow = UnitOfWork::new(registry.clone());
        let doom = game(1, "Doom");

        doom.mark_new(&mut uow);
        doom.write().name = "Doom II".to_string();
        uow.commit().unwrap();

        assert_eq!(registry.games().find_by_id(1).unwrap().read().name, "Doom II");
    }

    #[test]
    fn test_work_context_requires_initialization() {
        let mut context = WorkContext::new();
        let err = context.unit_of_work().unwrap_err();
        assert!(matches!(err, Error::UnitOfWorkNotInitialized));
        assert!(err.is_configuration());

        let mut context = WorkContext::begin(registry());
        let uow = context.unit_of_work().unwrap();
        game(1, "Doom").mark_new(uow);
        assert_eq!(context.unit_of_work().unwrap().pending(), 1);
    }
}
