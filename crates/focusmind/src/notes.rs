//! Smart notes
//!
//! Notes are kept newest-first under one storage key. A note is never
//! edited after it is saved; it only leaves the list by delete or clear.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::Result;
use crate::store::{keys, load_or_default, save, KeyValueStore};

/// A saved note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// `note_<epoch millis>`
    pub id: String,
    pub content: String,
    /// ISO-8601 creation time
    pub created_at: String,
}

impl Note {
    fn new(content: String, created: DateTime<Utc>) -> Self {
        Self {
            id: format!("note_{}", created.timestamp_millis()),
            content,
            created_at: created.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// The notes collection
pub struct NotesManager {
    store: Arc<dyn KeyValueStore>,
    /// Serializes read-modify-write of the notes list
    write: Mutex<()>,
}

impl NotesManager {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write: Mutex::new(()),
        }
    }

    /// Save a new note at the front of the list
    pub async fn save(&self, content: impl Into<String>) -> Result<Note> {
        let _write = self.write.lock().await;
        let mut notes: Vec<Note> = load_or_default(self.store.as_ref(), keys::NOTES).await?;

        // Ids come from the clock; step past a note saved in the same millisecond
        let mut created = Utc::now();
        while notes.iter().any(|n| n.id == format!("note_{}", created.timestamp_millis())) {
            created += chrono::Duration::milliseconds(1);
        }

        let note = Note::new(content.into(), created);
        notes.insert(0, note.clone());
        save(self.store.as_ref(), keys::NOTES, &notes).await?;

        info!(id = %note.id, "Note saved");
        Ok(note)
    }

    /// All notes, newest first
    pub async fn list(&self) -> Result<Vec<Note>> {
        load_or_default(self.store.as_ref(), keys::NOTES).await
    }

    /// Delete a note by id; returns whether it existed
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let _write = self.write.lock().await;
        let mut notes: Vec<Note> = load_or_default(self.store.as_ref(), keys::NOTES).await?;
        let before = notes.len();
        notes.retain(|note| note.id != id);
        let removed = notes.len() != before;

        save(self.store.as_ref(), keys::NOTES, &notes).await?;
        if removed {
            info!(id = %id, "Note deleted");
        }
        Ok(removed)
    }

    /// Remove every note
    pub async fn clear(&self) -> Result<()> {
        let _write = self.write.lock().await;
        save(self.store.as_ref(), keys::NOTES, &Vec::<Note>::new()).await?;
        info!("All notes cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn manager() -> NotesManager {
        NotesManager::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_save_note() {
        let notes = manager();
        let note = notes.save("This is a test note.").await.unwrap();

        let all = notes.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].content, "This is a test note.");
        assert!(note.id.starts_with("note_"));
        assert!(note.created_at.ends_with('Z'));
    }

    #[tokio::test]
    async fn test_newest_first_with_unique_ids() {
        let notes = manager();
        notes.save("first").await.unwrap();
        notes.save("second").await.unwrap();
        notes.save("third").await.unwrap();

        let all = notes.list().await.unwrap();
        let contents: Vec<&str> = all.iter().map(|n| n.content.as_str()).collect();
        assert_eq!(contents, vec!["third", "second", "first"]);

        let mut ids: Vec<&str> = all.iter().map(|n| n.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_list() {
        assert!(manager().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reads_existing_notes() {
        let store = MemoryStore::with_entries([(
            keys::NOTES.to_string(),
            json!([
                {"id": "1", "content": "Note 1", "createdAt": "2024-01-01T00:00:00.000Z"},
                {"id": "2", "content": "Note 2", "createdAt": "2024-01-01T00:00:00.000Z"}
            ]),
        )]);
        let notes = NotesManager::new(Arc::new(store));

        assert!(notes.delete("1").await.unwrap());
        let all = notes.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, "2");
    }

    #[tokio::test]
    async fn test_delete_missing_note() {
        let notes = manager();
        notes.save("keep").await.unwrap();
        assert!(!notes.delete("note_0").await.unwrap());
        assert_eq!(notes.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_clear_all() {
        let notes = manager();
        notes.save("a").await.unwrap();
        notes.save("b").await.unwrap();
        notes.clear().await.unwrap();
        assert!(notes.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_saves_keep_every_note() {
        let notes = Arc::new(manager());
        let mut handles = Vec::new();
        for i in 0..10 {
            let notes = notes.clone();
            handles.push(tokio::spawn(async move { notes.save(format!("note {}", i)).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(notes.list().await.unwrap().len(), 10);
    }
}
