use futures::FutureExt;

use super::test_helpers::{FailingSource, GatedSource, options, record};
use super::*;
use crate::connector::NodeId;
use crate::error::ErrorCode;

fn ids(comments: &[Comment]) -> Vec<u64> {
    comments.iter().map(|c| c.id.0).collect()
}

fn memory_store(annotation: &Annotation, records: Vec<CommentRecord>) -> CommentStore {
    let source = MemorySource::new();
    source.insert(annotation.id(), records);
    let store = CommentStore::new(Rc::new(source));
    store.set_annotation(Some(annotation.clone()));
    store
}

// =============================================================================
// queries
// =============================================================================

#[test]
fn new_store_has_no_list() {
    let store = CommentStore::new(Rc::new(MemorySource::new()));
    assert!(store.comments().is_none());
    assert!(store.overlay_comments().is_none());
    assert!(!store.is_highlighting());
    assert!(!store.is_relevant_list());
    assert!(store.annotation_id().is_none());
}

#[tokio::test]
async fn overlay_comments_skip_document_level_comments() {
    let annotation = Annotation::new();
    let store = memory_store(&annotation, vec![record(1, Some(10)), record(2, None), record(3, Some(30))]);

    store.list_comments(options(&MountFlag::mounted(), false)).await.unwrap();

    assert_eq!(store.comments().map(|c| ids(&c)), Some(vec![1, 2, 3]));
    assert_eq!(store.overlay_comments().map(|c| ids(&c)), Some(vec![1, 3]));
}

#[tokio::test]
async fn overlay_comments_keep_first_of_duplicate_ids() {
    let annotation = Annotation::new();
    let store = memory_store(&annotation, vec![record(1, Some(10)), record(2, Some(20)), record(1, Some(30))]);

    store.list_comments(options(&MountFlag::mounted(), false)).await.unwrap();

    let overlay = store.overlay_comments().unwrap();
    assert_eq!(ids(&overlay), vec![1, 2]);
    assert_eq!(overlay[0].region.and_then(|r| r.node), Some(NodeId(10)));
    assert_eq!(store.comments().map(|c| c.len()), Some(3));
}

#[tokio::test]
async fn relevance_follows_the_active_annotation() {
    let annotation = Annotation::new();
    let store = memory_store(&annotation, vec![record(1, Some(10))]);
    assert!(!store.is_relevant_list());

    store.list_comments(options(&MountFlag::mounted(), false)).await.unwrap();
    assert!(store.is_relevant_list());

    store.set_annotation(Some(Annotation::new()));
    assert!(!store.is_relevant_list());

    store.set_annotation(Some(annotation));
    assert!(store.is_relevant_list());

    store.clear_comments();
    assert!(!store.is_relevant_list());
    assert_eq!(store.comments(), Some(Vec::new()));
}

// =============================================================================
// highlight + scroll
// =============================================================================

#[tokio::test]
async fn set_highlighted_toggles_and_notifies() {
    let annotation = Annotation::new();
    let store = memory_store(&annotation, vec![record(1, Some(10)), record(2, Some(20))]);
    store.list_comments(options(&MountFlag::mounted(), false)).await.unwrap();
    let mut changes = store.subscribe();
    changes.mark_unchanged();

    assert!(store.set_highlighted(CommentId(2), true));
    assert!(store.is_highlighting());
    assert!(changes.has_changed().unwrap());
    changes.mark_unchanged();

    assert!(store.set_highlighted(CommentId(2), true));
    assert!(!changes.has_changed().unwrap());

    assert!(store.set_highlighted(CommentId(2), false));
    assert!(!store.is_highlighting());
}

#[test]
fn set_highlighted_unknown_comment_is_false() {
    let store = CommentStore::new(Rc::new(MemorySource::new()));
    assert!(!store.set_highlighted(CommentId(5), true));
}

#[test]
fn scroll_requests_reach_the_host() {
    let store = CommentStore::new(Rc::new(MemorySource::new()));
    let mut requests = store.take_scroll_requests().unwrap();
    assert!(store.take_scroll_requests().is_none());

    store.scroll_into_view(CommentId(4));
    store.scroll_into_view(CommentId(7));
    assert_eq!(requests.try_recv().unwrap(), CommentId(4));
    assert_eq!(requests.try_recv().unwrap(), CommentId(7));
    assert!(requests.try_recv().is_err());
}

#[test]
fn insert_json_rejects_malformed_payload() {
    let source = MemorySource::new();
    let err = source.insert_json(AnnotationId::new(), r#"{"id": 1}"#).unwrap_err();
    assert_eq!(err.error_code(), "E_SOURCE_DECODE");
}

#[tokio::test]
async fn insert_json_feeds_fetch() {
    let source = MemorySource::new();
    let id = AnnotationId::new();
    source
        .insert_json(id, r#"[{"id": 1, "region": {"node": 10}}, {"id": 2, "region": {"node": 20, "hidden": true}}]"#)
        .unwrap();
    let records = source.fetch(id).await.unwrap();
    assert_eq!(records.len(), 2);
    assert!(records[1].region.unwrap().hidden);
}

// =============================================================================
// list_comments
// =============================================================================

#[tokio::test]
async fn load_without_annotation_reports_it() {
    let store = CommentStore::new(Rc::new(MemorySource::new()));
    let outcome = store.list_comments(options(&MountFlag::mounted(), false)).await.unwrap();
    assert_eq!(outcome, LoadOutcome::NoAnnotation);
}

#[tokio::test]
async fn load_clears_immediately_unless_suppressed() {
    let source = Rc::new(GatedSource::default());
    let store = CommentStore::new(source.clone());
    let annotation = Annotation::new();
    store.set_annotation(Some(annotation.clone()));

    let gate = source.gate(annotation.id());
    let first = store.list_comments(options(&MountFlag::mounted(), false));
    gate.send(Ok(vec![record(1, Some(10))])).unwrap();
    first.await.unwrap();

    let gate = source.gate(annotation.id());
    let pending = store.list_comments(options(&MountFlag::mounted(), false));
    assert_eq!(store.comments(), Some(Vec::new()));

    gate.send(Ok(vec![record(2, Some(20))])).unwrap();
    assert_eq!(pending.await.unwrap(), LoadOutcome::Applied { count: 1 });
    assert_eq!(store.comments().map(|c| ids(&c)), Some(vec![2]));
}

#[tokio::test]
async fn suppressed_load_keeps_old_list_until_replacement() {
    let source = Rc::new(GatedSource::default());
    let store = CommentStore::new(source.clone());
    let annotation = Annotation::new();
    store.set_annotation(Some(annotation.clone()));

    let gate = source.gate(annotation.id());
    let first = store.list_comments(options(&MountFlag::mounted(), false));
    gate.send(Ok(vec![record(1, Some(10))])).unwrap();
    first.await.unwrap();

    let gate = source.gate(annotation.id());
    let pending = store.list_comments(options(&MountFlag::mounted(), true));
    assert_eq!(store.comments().map(|c| ids(&c)), Some(vec![1]));

    gate.send(Ok(vec![record(1, Some(10)), record(2, Some(20))])).unwrap();
    pending.await.unwrap();
    assert_eq!(store.comments().map(|c| ids(&c)), Some(vec![1, 2]));
}

#[tokio::test]
async fn stale_load_never_overwrites_newer_annotation() {
    let source = Rc::new(GatedSource::default());
    let store = CommentStore::new(source.clone());
    let a = Annotation::new();
    let b = Annotation::new();
    let gate_a = source.gate(a.id());
    let gate_b = source.gate(b.id());

    store.set_annotation(Some(a.clone()));
    let load_a = store.list_comments(options(&MountFlag::mounted(), false));
    store.set_annotation(Some(b.clone()));
    let load_b = store.list_comments(options(&MountFlag::mounted(), false));

    gate_b.send(Ok(vec![record(2, Some(20))])).unwrap();
    assert_eq!(load_b.await.unwrap(), LoadOutcome::Applied { count: 1 });

    gate_a.send(Ok(vec![record(1, Some(10)), record(3, Some(30))])).unwrap();
    assert_eq!(load_a.await.unwrap(), LoadOutcome::Superseded);

    assert_eq!(store.comments().map(|c| ids(&c)), Some(vec![2]));
    assert!(store.is_relevant_list());
}

#[tokio::test]
async fn stale_load_resolving_first_is_still_discarded() {
    let source = Rc::new(GatedSource::default());
    let store = CommentStore::new(source.clone());
    let a = Annotation::new();
    let b = Annotation::new();
    let gate_a = source.gate(a.id());
    let gate_b = source.gate(b.id());

    store.set_annotation(Some(a));
    let load_a = store.list_comments(options(&MountFlag::mounted(), false));
    store.set_annotation(Some(b));
    let load_b = store.list_comments(options(&MountFlag::mounted(), false));

    gate_a.send(Ok(vec![record(1, Some(10))])).unwrap();
    gate_b.send(Ok(vec![record(2, Some(20))])).unwrap();
    let (outcome_a, outcome_b) = tokio::join!(load_a, load_b);

    assert_eq!(outcome_a.unwrap(), LoadOutcome::Superseded);
    assert_eq!(outcome_b.unwrap(), LoadOutcome::Applied { count: 1 });
    assert_eq!(store.comments().map(|c| ids(&c)), Some(vec![2]));
}

#[tokio::test]
async fn newer_load_for_same_annotation_supersedes_older() {
    let source = Rc::new(GatedSource::default());
    let store = CommentStore::new(source.clone());
    let annotation = Annotation::new();
    store.set_annotation(Some(annotation.clone()));

    let gate_old = source.gate(annotation.id());
    let old = store.list_comments(options(&MountFlag::mounted(), false));
    // Start the old fetch so it takes the first gate.
    let mut old = Box::pin(old);
    assert!(old.as_mut().now_or_never().is_none());

    let gate_new = source.gate(annotation.id());
    let new = store.list_comments(options(&MountFlag::mounted(), true));

    gate_new.send(Ok(vec![record(9, Some(90))])).unwrap();
    assert_eq!(new.await.unwrap(), LoadOutcome::Applied { count: 1 });
    gate_old.send(Ok(vec![record(1, Some(10))])).unwrap();
    assert_eq!(old.await.unwrap(), LoadOutcome::Superseded);
    assert_eq!(store.comments().map(|c| ids(&c)), Some(vec![9]));
}

#[tokio::test]
async fn unmounted_requester_discards_result() {
    let source = Rc::new(GatedSource::default());
    let store = CommentStore::new(source.clone());
    let annotation = Annotation::new();
    store.set_annotation(Some(annotation.clone()));
    let mounted = MountFlag::mounted();

    let gate = source.gate(annotation.id());
    let load = store.list_comments(options(&mounted, false));
    mounted.set_unmounted();
    gate.send(Ok(vec![record(1, Some(10))])).unwrap();

    assert_eq!(load.await.unwrap(), LoadOutcome::Unmounted);
    assert_eq!(store.comments(), Some(Vec::new()));
    assert!(!store.is_relevant_list());
}

#[tokio::test]
async fn failed_load_leaves_list_as_it_was() {
    let store = CommentStore::new(Rc::new(FailingSource));
    store.set_annotation(Some(Annotation::new()));

    let err = store.list_comments(options(&MountFlag::mounted(), true)).await.unwrap_err();
    assert_eq!(err.error_code(), "E_SOURCE_UNAVAILABLE");
    assert!(store.comments().is_none());

    let err = store.list_comments(options(&MountFlag::mounted(), false)).await.unwrap_err();
    assert_eq!(err.error_code(), "E_SOURCE_UNAVAILABLE");
    assert_eq!(store.comments(), Some(Vec::new()));
}
