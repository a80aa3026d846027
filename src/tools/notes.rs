//! Built-in note tools backed by the note store
//!
//! `save_note` persists one note; `get_notes` reads everything back. The
//! reply strings here are the agent's spoken copy and are covered by tests;
//! change them deliberately.

use serde::Deserialize;

use super::{ToolOutcome, ToolRegistry, ToolSpec};
use crate::store::NoteStore;
use crate::{Error, Result};

/// Reply when the note backend cannot be reached
const STORAGE_UNAVAILABLE_REPLY: &str =
    "I couldn't reach your notes just now. Please try again in a moment.";

/// Reply for `get_notes` on an empty store
pub const EMPTY_NOTES_REPLY: &str = "No notes saved yet.";

/// Where the tools get their store from
///
/// Production hands over a database location and the process-wide pool is
/// created on the first call, matching the store's lazy contract. Tests hand
/// over a ready store on a private pool.
#[derive(Clone)]
enum StoreSource {
    Ready(NoteStore),
    Lazy(String),
}

impl StoreSource {
    fn resolve(&self) -> Result<NoteStore> {
        match self {
            Self::Ready(store) => Ok(store.clone()),
            Self::Lazy(database_url) => NoteStore::shared(database_url),
        }
    }
}

/// Built-in note tools for the voice agent
#[derive(Clone)]
pub struct NoteTools {
    source: StoreSource,
}

impl NoteTools {
    /// Note tools over an already-initialized store
    #[must_use]
    pub const fn new(store: NoteStore) -> Self {
        Self {
            source: StoreSource::Ready(store),
        }
    }

    /// Note tools that open the process-wide store on first use
    #[must_use]
    pub fn lazy(database_url: impl Into<String>) -> Self {
        Self {
            source: StoreSource::Lazy(database_url.into()),
        }
    }

    /// Build a registry exposing `save_note` and `get_notes`
    #[must_use]
    pub fn registry(self) -> ToolRegistry {
        let mut registry = ToolRegistry::new();

        let tools = self.clone();
        registry.register(
            ToolSpec::new(
                "save_note",
                "Save a note so it can be recalled later. Use the user's own words.",
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "note": {
                            "type": "string",
                            "description": "The note to save"
                        }
                    },
                    "required": ["note"]
                }),
            ),
            move |arguments| {
                let tools = tools.clone();
                async move { tools.save_note(&arguments).await }
            },
        );

        let tools = self;
        registry.register(
            ToolSpec::new(
                "get_notes",
                "Read back every note saved so far, oldest first.",
                serde_json::json!({
                    "type": "object",
                    "properties": {}
                }),
            ),
            move |_arguments| {
                let tools = tools.clone();
                async move { tools.get_notes().await }
            },
        );

        registry
    }

    async fn save_note(&self, arguments: &str) -> ToolOutcome {
        #[derive(Deserialize)]
        struct SaveNoteArgs {
            note: String,
        }

        let args: SaveNoteArgs = match serde_json::from_str(arguments) {
            Ok(args) => args,
            Err(e) => {
                tracing::warn!(error = %e, "save_note: invalid arguments");
                return ToolOutcome::error(
                    "I couldn't make out the note to save. Please try again.",
                );
            }
        };

        let source = self.source.clone();
        let saved =
            tokio::task::spawn_blocking(move || source.resolve()?.save(&args.note)).await;

        match saved {
            Ok(Ok(note)) => {
                tracing::info!(note_id = note.id, "note saved");
                ToolOutcome::success(format!("Saved note #{}: {}", note.id, note.content))
            }
            Ok(Err(Error::Validation(_))) => ToolOutcome::error("I can't save an empty note."),
            Ok(Err(e)) => {
                tracing::error!(error = %e, "save_note failed");
                ToolOutcome::error(STORAGE_UNAVAILABLE_REPLY)
            }
            Err(e) => {
                tracing::error!(error = %e, "save_note task failed");
                ToolOutcome::error(STORAGE_UNAVAILABLE_REPLY)
            }
        }
    }

    async fn get_notes(&self) -> ToolOutcome {
        let source = self.source.clone();
        let listed = tokio::task::spawn_blocking(move || source.resolve()?.list_all()).await;

        match listed {
            Ok(Ok(notes)) if notes.is_empty() => ToolOutcome::success(EMPTY_NOTES_REPLY),
            Ok(Ok(notes)) => {
                let lines: Vec<String> = notes
                    .iter()
                    .map(|n| format!("#{}: {}", n.id, n.content))
                    .collect();
                ToolOutcome::success(lines.join("\n"))
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "get_notes failed");
                ToolOutcome::error(STORAGE_UNAVAILABLE_REPLY)
            }
            Err(e) => {
                tracing::error!(error = %e, "get_notes task failed");
                ToolOutcome::error(STORAGE_UNAVAILABLE_REPLY)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::init_memory;

    fn make_registry() -> ToolRegistry {
        let store = NoteStore::new(init_memory().unwrap());
        NoteTools::new(store).registry()
    }

    /// Store whose pool points at an unopenable database, so acquisition
    /// fails at the timeout instead of at pool construction.
    fn broken_registry() -> ToolRegistry {
        let manager = r2d2_sqlite::SqliteConnectionManager::file("/nonexistent-dir/notes.db");
        let pool = r2d2::Pool::builder()
            .connection_timeout(std::time::Duration::from_millis(100))
            .build_unchecked(manager);
        NoteTools::new(NoteStore::new(pool)).registry()
    }

    #[tokio::test]
    async fn save_note_confirms_with_id_and_content() {
        let registry = make_registry();
        let outcome = registry
            .dispatch("save_note", r#"{"note":"buy milk"}"#)
            .await;
        assert!(!outcome.is_error());
        assert_eq!(outcome.text(), "Saved note #1: buy milk");
    }

    #[tokio::test]
    async fn get_notes_empty_store_uses_fixed_reply() {
        let registry = make_registry();
        let outcome = registry.dispatch("get_notes", "{}").await;
        assert!(!outcome.is_error());
        assert_eq!(outcome.text(), EMPTY_NOTES_REPLY);
    }

    #[tokio::test]
    async fn save_then_get_lists_notes_in_order() {
        let registry = make_registry();
        registry
            .dispatch("save_note", r#"{"note":"buy milk"}"#)
            .await;
        registry
            .dispatch("save_note", r#"{"note":"call mom"}"#)
            .await;

        let outcome = registry.dispatch("get_notes", "{}").await;
        assert_eq!(outcome.text(), "#1: buy milk\n#2: call mom");
    }

    #[tokio::test]
    async fn save_note_rejects_empty_content() {
        let registry = make_registry();
        let outcome = registry.dispatch("save_note", r#"{"note":"   "}"#).await;
        assert!(outcome.is_error());
        assert!(outcome.text().contains("empty"));

        // Nothing was written
        let listed = registry.dispatch("get_notes", "{}").await;
        assert_eq!(listed.text(), EMPTY_NOTES_REPLY);
    }

    #[tokio::test]
    async fn save_note_rejects_malformed_arguments() {
        let registry = make_registry();

        let outcome = registry.dispatch("save_note", "not json").await;
        assert!(outcome.is_error());

        let outcome = registry.dispatch("save_note", r#"{"memo":"wrong key"}"#).await;
        assert!(outcome.is_error());
    }

    #[tokio::test]
    async fn storage_outage_is_spoken_not_fatal() {
        let registry = broken_registry();

        let outcome = registry
            .dispatch("save_note", r#"{"note":"doomed"}"#)
            .await;
        assert!(outcome.is_error());
        assert_eq!(outcome.text(), STORAGE_UNAVAILABLE_REPLY);

        // The registry still serves subsequent calls
        let outcome = registry.dispatch("get_notes", "{}").await;
        assert!(outcome.is_error());
        assert_eq!(outcome.text(), STORAGE_UNAVAILABLE_REPLY);
    }

    #[test]
    fn definitions_declare_both_tools() {
        let registry = make_registry();
        let names: Vec<String> = registry.definitions().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["save_note", "get_notes"]);
    }
}
