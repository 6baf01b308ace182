//! Integration tests for the chat crate
//!
//! These tests drive the public API end to end: selecting text in a
//! rendered message, turning it into a note, rendering the result and
//! recovering from remote failures.

use chat::{
    AnnotationStore, ClientSettings, Conversation, ConversationId, Folder, FolderId,
    FolderTreeStore, InMemoryRemote, NativeRange, Note, NodeId, OverlapPolicy, Rect, RemoteOp,
    RenderedDocument, SelectionSource, SelectionTracker, SegmentKind, build_segments,
    is_valid_range,
};
use parking_lot::{Mutex, RwLock};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

const TEXT: &str = "The quick brown fox jumps over the lazy dog";

/// Selection source backed by a settable range
#[derive(Default)]
struct TestSelection {
    range: Mutex<Option<NativeRange>>,
}

impl SelectionSource for TestSelection {
    fn current_range(&self) -> Option<NativeRange> {
        *self.range.lock()
    }

    fn clear(&self) {
        *self.range.lock() = None;
    }

    fn bounding_rect(&self, _range: &NativeRange) -> Option<Rect> {
        Some(Rect::new(100.0, 200.0, 40.0, 16.0))
    }
}

/// `<div><p>The <strong>quick</strong> brown fox</p><p>...</p></div>`
fn render_message() -> (Arc<RwLock<RenderedDocument>>, NodeId) {
    let mut doc = RenderedDocument::new();
    let container = doc.append_element(doc.root(), "div");
    let p1 = doc.append_element(container, "p");
    doc.append_text(p1, "The ");
    let strong = doc.append_element(p1, "strong");
    doc.append_text(strong, "quick");
    doc.append_text(p1, " brown fox");
    let p2 = doc.append_element(container, "p");
    doc.append_text(p2, " jumps over the lazy dog");
    (Arc::new(RwLock::new(doc)), container)
}

fn select(
    source: &TestSelection,
    document: &RwLock<RenderedDocument>,
    container: NodeId,
    from: usize,
    to: usize,
) {
    let doc = document.read();
    let range = NativeRange::new(
        doc.boundary_at(container, from).unwrap(),
        doc.boundary_at(container, to).unwrap(),
    );
    *source.range.lock() = Some(range);
}

#[derive(Debug, Clone)]
enum Mutation {
    Add { from: usize, span: usize },
    Edit { pick: prop::sample::Index, from: usize, span: usize },
}

fn mutation() -> impl Strategy<Value = Mutation> {
    let len = TEXT.chars().count();
    prop_oneof![
        2 => (0..len, 1usize..7).prop_map(|(from, span)| Mutation::Add { from, span }),
        1 => (any::<prop::sample::Index>(), 0..len, 1usize..7)
            .prop_map(|(pick, from, span)| Mutation::Edit { pick, from, span }),
    ]
}

fn assert_no_overlaps(notes: &[Note]) {
    for a in notes {
        for b in notes {
            if a.id != b.id {
                assert!(
                    !OverlapPolicy::Inclusive.overlaps(a.from_index, a.to_index, b),
                    "{} [{}..{}) overlaps {} [{}..{})",
                    a.id,
                    a.from_index,
                    a.to_index,
                    b.id,
                    b.from_index,
                    b.to_index
                );
            }
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_selection_to_highlight_flow() {
    let (document, container) = render_message();
    let text = document.read().text_content(container);
    assert_eq!(text, TEXT);

    let source = Arc::new(TestSelection::default());
    let settings = ClientSettings::default();
    let tracker = SelectionTracker::from_settings(
        Arc::clone(&source),
        Arc::clone(&document),
        container,
        &settings,
    );

    // Drag across "quick", which sits inside <strong>
    select(&source, &document, container, 4, 9);
    tracker.on_selection_change();
    tokio::time::sleep(Duration::from_millis(150)).await;
    let selection = tracker.current().expect("selection should be published");
    assert_eq!(selection.selected_text, "quick");

    let remote = Arc::new(InMemoryRemote::new());
    let store = AnnotationStore::new(Arc::clone(&remote), "resp-1", &settings)
        .with_text_len(text.chars().count());
    store.fetch().await.unwrap();

    assert!(store.is_valid_range(selection.from_index, selection.to_index, None));
    store
        .add("adjective", selection.from_index, selection.to_index)
        .await
        .unwrap();
    tracker.clear();
    assert!(tracker.current().is_none());

    let notes = store.notes();
    let segments: Vec<_> = build_segments(&text, &notes).collect();
    assert_eq!(segments.len(), 3);
    assert_eq!(segments[1].text, "quick");
    assert!(matches!(segments[1].kind, SegmentKind::Highlighted(n) if n.content == "adjective"));
    assert_eq!(segments.iter().map(|s| s.text).collect::<String>(), text);
}

#[tokio::test(start_paused = true)]
async fn test_click_without_drag_yields_no_selection() {
    let (document, container) = render_message();
    let source = Arc::new(TestSelection::default());
    let tracker = SelectionTracker::new(
        Arc::clone(&source),
        Arc::clone(&document),
        container,
        Duration::from_millis(100),
    );

    select(&source, &document, container, 12, 12);
    tracker.on_pointer_up(true);
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(tracker.current().is_none());
}

#[test]
fn test_scenario_plain_text_without_notes() {
    let segments: Vec<_> = build_segments("The quick brown fox", &[]).collect();
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].text, "The quick brown fox");
    assert!(!segments[0].is_highlighted());
}

#[test]
fn test_scenario_exact_and_adjacent_ranges_rejected() {
    let notes = vec![Note::new("n1", "resp-1", "quick", 4, 9)];
    assert!(!is_valid_range(&notes, 4, 9, None));
    assert!(!is_valid_range(&notes, 9, 15, None));
    assert!(is_valid_range(&notes, 10, 15, None));
}

async fn apply_mutations(mutations: Vec<Mutation>) {
    let remote = Arc::new(InMemoryRemote::new());
    let store = AnnotationStore::new(remote, "resp-1", &ClientSettings::default())
        .with_text_len(TEXT.chars().count());

    for (step, mutation) in mutations.into_iter().enumerate() {
        let notes = store.notes();
        let result = match mutation {
            Mutation::Add { from, span } => store
                .add(&format!("note {step}"), from, from + span)
                .await
                .map(|_| ()),
            Mutation::Edit { pick, from, span } if !notes.is_empty() => {
                let target = &notes[pick.index(notes.len())];
                store
                    .edit(&target.id, &format!("edit {step}"), from, from + span)
                    .await
                    .map(|_| ())
            }
            Mutation::Edit { .. } => continue,
        };

        // Only validation can fail here; it must leave notes untouched
        if let Err(e) = result {
            assert!(e.is_validation(), "unexpected error: {e}");
            assert_eq!(store.notes(), notes);
        }
        assert_no_overlaps(&store.notes());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_random_successful_mutations_never_overlap(
        mutations in prop::collection::vec(mutation(), 1..60)
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(apply_mutations(mutations));
    }
}

#[tokio::test]
async fn test_failed_mutations_leave_collection_unchanged() {
    let remote = Arc::new(InMemoryRemote::new());
    let store = AnnotationStore::new(Arc::clone(&remote), "resp-1", &ClientSettings::default())
        .with_text_len(TEXT.chars().count());
    store.add("the", 0, 3).await.unwrap();
    store.add("fox", 16, 19).await.unwrap();
    store.add("dog", 40, 43).await.unwrap();

    // add("note", 10, 15) against a failing remote
    let before = store.notes();
    remote.fail_next(RemoteOp::CreateNote);
    let err = store.add("note", 10, 15).await.unwrap_err();
    assert!(err.is_remote());
    assert_eq!(store.notes(), before);

    let fox = before[1].id.clone();
    remote.fail_next(RemoteOp::UpdateNote);
    assert!(store.edit(&fox, "a fox", 16, 20).await.unwrap_err().is_remote());
    assert_eq!(store.notes(), before);

    remote.fail_next(RemoteOp::DeleteNote);
    assert!(store.delete(&fox).await.unwrap_err().is_remote());
    assert_eq!(store.notes(), before);

    // Server state is untouched too
    let stored = remote.stored_notes(&"resp-1".into());
    assert_eq!(stored.len(), 3);
    assert!(stored.iter().all(|n| !n.is_deleted));
}

#[tokio::test]
async fn test_adjacent_notes_with_half_open_settings() {
    let settings = ClientSettings::from_json(r#"{ "overlap_policy": "half_open" }"#).unwrap();
    let remote = Arc::new(InMemoryRemote::new());
    let store = AnnotationStore::new(Arc::clone(&remote), "resp-1", &settings);

    store.add("quick", 4, 9).await.unwrap();
    store.add("space brown", 9, 15).await.unwrap();
    assert!(store.add("inside", 8, 10).await.unwrap_err().is_validation());
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn test_scenario_delete_conversation_in_subfolder() {
    let tree = Folder::new("root", "Root")
        .with_conversation(Conversation::new("welcome", "Welcome", "llama3"))
        .with_sub_folder(
            Folder::new("a", "A")
                .with_conversation(Conversation::new("x", "X", "llama3"))
                .with_conversation(Conversation::new("y", "Y", "llama3")),
        )
        .with_sub_folder(Folder::new("b", "B").with_conversation(Conversation::new("z", "Z", "llama3")))
        .with_sub_folder(Folder::new("c", "C"));
    let remote = Arc::new(InMemoryRemote::with_folder_tree(tree));
    let store = FolderTreeStore::new(Arc::clone(&remote));
    store.fetch_tree().await.unwrap();

    let before = store.tree();
    store.delete_conversation(&ConversationId::new("x")).await.unwrap();
    let after = store.tree();

    let a = after.get(&FolderId::new("a")).unwrap();
    let remaining: Vec<_> = a.conversations.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(remaining, vec!["y"]);
    assert!(after.find_conversation(&ConversationId::new("x")).is_none());

    for id in ["root", "b", "c"] {
        let id = FolderId::new(id);
        assert_eq!(before.get(&id), after.get(&id));
        assert!(Arc::ptr_eq(
            before.node_arc(&id).unwrap(),
            after.node_arc(&id).unwrap()
        ));
    }
}

#[tokio::test]
async fn test_in_flight_conversation_delete_is_visible_then_restored() {
    let tree = Folder::new("root", "Root")
        .with_sub_folder(Folder::new("a", "A").with_conversation(Conversation::new("x", "X", "m")));
    let remote = Arc::new(InMemoryRemote::with_folder_tree(tree));
    let store = FolderTreeStore::new(Arc::clone(&remote));
    store.fetch_tree().await.unwrap();
    store.set_active_conversation(&ConversationId::new("x")).unwrap();

    remote.hold(RemoteOp::DeleteConversation);
    remote.fail_next(RemoteOp::DeleteConversation);

    let x = ConversationId::new("x");
    let (deleted, ()) = tokio::join!(store.delete_conversation(&x), async {
        while remote.call_count(RemoteOp::DeleteConversation) == 0 {
            tokio::task::yield_now().await;
        }
        assert!(store.find_conversation(&x).is_none());
        assert_eq!(store.active_conversation(), None);
        assert!(store.is_loading());
        remote.release(RemoteOp::DeleteConversation);
    });

    assert!(deleted.unwrap_err().is_remote());
    assert!(store.find_conversation(&x).is_some());
    assert_eq!(store.active_conversation(), Some(x));
}
