//! End-to-end service tests over the in-memory store and mock backend.

use std::sync::Arc;

use quill_core::{Error, Mark, Node, NoteStore, Schema};
use quill_doc::{flatten, Step, Transaction};
use quill_notes::{MockCompletionBackend, NoteService, NOTES_ASSISTANT_PROMPT};
use quill_store::{MemoryNoteStore, MemoryShareStore};

fn service() -> (NoteService, MemoryNoteStore, MockCompletionBackend) {
    let notes = MemoryNoteStore::new();
    let shares = MemoryShareStore::new();
    let mock = MockCompletionBackend::new();
    let service = NoteService::new(
        Arc::new(notes.clone()),
        Arc::new(shares),
        Arc::new(mock.clone()),
        Schema::default(),
    );
    (service, notes, mock)
}

fn insert_text(actor: &str, at: usize, text: &str) -> Transaction {
    Transaction::new(actor, vec![Step::insert(at, vec![Node::text(text)])])
}

#[tokio::test]
async fn test_owner_edit_is_attributed_and_flattens() {
    let (service, _, _) = service();
    let note = service.create_note("bob", "scratch", None).await.unwrap();

    let updated = service
        .apply_edit(note.id, &insert_text("bob", 0, "hello"))
        .await
        .unwrap();

    assert_eq!(
        updated.content,
        Node::doc(vec![Node::paragraph(vec![Node::marked_text(
            "hello",
            vec![Mark::author("bob")]
        )])])
    );
    assert_eq!(updated.version, 2);
    assert_eq!(flatten(&Schema::default(), &updated.content), "hello");
}

#[tokio::test]
async fn test_stranger_edit_is_forbidden_and_snapshot_unchanged() {
    let (service, notes, _) = service();
    let note = service.create_note("alice", "private", None).await.unwrap();

    let err = service
        .apply_edit(note.id, &insert_text("eve", 0, "intruder"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));

    let stored = notes.load(note.id).await.unwrap();
    assert_eq!(stored.content, note.content);
    assert_eq!(stored.version, 1);
}

#[tokio::test]
async fn test_shared_writer_can_edit_but_not_share_or_delete() {
    let (service, _, _) = service();
    let note = service.create_note("alice", "shared", None).await.unwrap();
    service.share_note("alice", note.id, "bob").await.unwrap();

    // bob edits; his insertion carries his own authorship.
    let updated = service
        .apply_edit(note.id, &insert_text("bob", 0, "from bob"))
        .await
        .unwrap();
    assert_eq!(
        updated.content.content[0].content[0].marks[0].author_id(),
        Some("bob")
    );

    assert!(matches!(
        service.share_note("bob", note.id, "carol").await,
        Err(Error::Forbidden(_))
    ));
    assert!(matches!(
        service.delete_note("bob", note.id).await,
        Err(Error::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_duplicate_share_rejected() {
    let (service, _, _) = service();
    let note = service.create_note("alice", "n", None).await.unwrap();
    service.share_note("alice", note.id, "bob").await.unwrap();
    assert!(matches!(
        service.share_note("alice", note.id, " \"bob\" ").await,
        Err(Error::AlreadyShared(_))
    ));
}

#[tokio::test]
async fn test_invalid_range_rejects_whole_transaction() {
    let (service, notes, _) = service();
    let note = service.create_note("alice", "n", None).await.unwrap();

    let tx = Transaction::new(
        "alice",
        vec![
            Step::insert(0, vec![Node::text("keep?")]),
            Step::delete(0, 99),
        ],
    );
    assert!(matches!(
        service.apply_edit(note.id, &tx).await,
        Err(Error::InvalidRange(_))
    ));
    // No partial application was persisted.
    let stored = notes.load(note.id).await.unwrap();
    assert_eq!(stored.version, 1);
    assert_eq!(flatten(&Schema::default(), &stored.content), "");
}

#[tokio::test]
async fn test_sequential_edits_stack_provenance() {
    let (service, _, _) = service();
    let note = service.create_note("alice", "n", None).await.unwrap();
    service
        .apply_edit(note.id, &insert_text("alice", 0, "hers "))
        .await
        .unwrap();
    let updated = service
        .apply_edit(note.id, &insert_text("bob", 5, "his"))
        .await
        .unwrap();

    let runs = &updated.content.content[0].content;
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].marks[0].author_id(), Some("alice"));
    assert_eq!(runs[1].marks[0].author_id(), Some("bob"));
    assert_eq!(flatten(&Schema::default(), &updated.content), "hers his");
}

#[tokio::test]
async fn test_search_spans_owned_and_shared_notes() {
    let (service, _, _) = service();
    let own = service.create_note("bob", "mine", None).await.unwrap();
    service
        .apply_edit(own.id, &insert_text("bob", 0, "alpha"))
        .await
        .unwrap();
    // A note alice shares with bob.
    let shared = service.create_note("alice", "theirs", None).await.unwrap();
    service
        .apply_edit(shared.id, &insert_text("alice", 0, "needle in here"))
        .await
        .unwrap();
    service.share_note("alice", shared.id, "bob").await.unwrap();

    let results = service.search_notes("bob", "needle").await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].note_id, shared.id);
    assert_eq!(results[0].snippets, vec!["needle in here".to_string()]);

    // eve sees nothing.
    assert!(service.search_notes("eve", "needle").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_query_returns_no_matches() {
    let (service, _, _) = service();
    let note = service.create_note("bob", "n", None).await.unwrap();
    service
        .apply_edit(note.id, &insert_text("bob", 0, "content"))
        .await
        .unwrap();
    assert!(service.search_notes("bob", "").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_ask_assembles_context_with_separator() {
    let (service, _, mock) = service();
    let first = service.create_note("bob", "a", None).await.unwrap();
    service
        .apply_edit(first.id, &insert_text("bob", 0, "older note"))
        .await
        .unwrap();
    let second = service.create_note("bob", "b", None).await.unwrap();
    service
        .apply_edit(second.id, &insert_text("bob", 0, "newer note"))
        .await
        .unwrap();

    let answer = service.ask("bob", "what do I know?").await.unwrap();
    assert_eq!(answer.answer, "Mock response");
    assert_eq!(answer.note_count, 2);

    let calls = mock.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].system, NOTES_ASSISTANT_PROMPT);
    // Newest updated note first, separator between documents.
    assert_eq!(calls[0].context, "newer note\n---\nolder note");
    assert_eq!(calls[0].prompt, "what do I know?");
}

#[tokio::test]
async fn test_ask_surfaces_backend_failure() {
    let notes = MemoryNoteStore::new();
    let shares = MemoryShareStore::new();
    let mock = MockCompletionBackend::new().with_failure("model offline");
    let service = NoteService::new(
        Arc::new(notes),
        Arc::new(shares),
        Arc::new(mock),
        Schema::default(),
    );
    service.create_note("bob", "n", None).await.unwrap();
    assert!(matches!(
        service.ask("bob", "q").await,
        Err(Error::ExternalService(_))
    ));
}

#[tokio::test]
async fn test_delete_removes_note_and_grants() {
    let (service, notes, _) = service();
    let note = service.create_note("alice", "n", None).await.unwrap();
    service.share_note("alice", note.id, "bob").await.unwrap();

    service.delete_note("alice", note.id).await.unwrap();
    assert!(matches!(
        notes.load(note.id).await,
        Err(Error::NoteNotFound(_))
    ));
    // bob's listing no longer reaches the deleted note.
    assert!(service.search_notes("bob", "anything").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_quoted_actor_ids_resolve_to_same_identity() {
    let (service, _, _) = service();
    let note = service.create_note(" \"alice\" ", "n", None).await.unwrap();
    // The quoted spelling still resolves to the owner relation.
    let updated = service
        .apply_edit(note.id, &insert_text("'alice'", 0, "hi"))
        .await
        .unwrap();
    assert_eq!(
        updated.content.content[0].content[0].marks[0].author_id(),
        Some("alice")
    );
}

#[tokio::test]
async fn test_get_note_respects_gate() {
    let (service, _, _) = service();
    let note = service.create_note("alice", "n", None).await.unwrap();
    assert!(service.get_note("alice", note.id).await.is_ok());
    assert!(matches!(
        service.get_note("eve", note.id).await,
        Err(Error::Forbidden(_))
    ));
}
