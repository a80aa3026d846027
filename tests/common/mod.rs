//! Shared test utilities

use scribe_agent::store::{self, NoteStore};
use scribe_agent::{ToolRegistry, NoteTools};

/// Set up an in-memory note store
#[must_use]
pub fn setup_test_store() -> NoteStore {
    NoteStore::new(store::init_memory().expect("failed to init test store"))
}

/// Build a tool registry over a fresh in-memory store
#[must_use]
pub fn setup_test_registry() -> ToolRegistry {
    NoteTools::new(setup_test_store()).registry()
}
