mod common;

use common::{create_encrypted_pdf, create_inheriting_pdf, create_test_pdf, page_labels, source};
use lopdf::{Document, Object};
use pdf_merge::*;

fn items(sources: Vec<SourceFile>) -> Vec<DocumentItem> {
    let mut store = OrderingStore::local();
    store.add_files(sources);
    store.items().to_vec()
}

#[tokio::test]
async fn test_merge_preserves_item_then_page_order() {
    let merged = merge_items(
        &items(vec![source("A", 2), source("B", 1), source("C", 3)]),
        |_| {},
    )
    .await
    .unwrap();

    assert_eq!(merged.page_count, 6);
    assert_eq!(merged.file_name, MERGED_FILE_NAME);
    assert_eq!(
        page_labels(&merged.bytes),
        vec!["A-1", "A-2", "B-1", "C-1", "C-2", "C-3"]
    );
}

#[tokio::test]
async fn test_merge_after_reorder_scenario() {
    let mut store = OrderingStore::local();
    let ids = store.add_files(vec![source("A", 2), source("B", 1), source("C", 3)]);
    assert!(store.move_item(ids[1], Direction::Up));

    let merged = merge_items(store.items(), |_| {}).await.unwrap();

    assert_eq!(merged.page_count, 6);
    assert_eq!(
        page_labels(&merged.bytes),
        vec!["B-1", "A-1", "A-2", "C-1", "C-2", "C-3"]
    );
}

#[tokio::test]
async fn test_merge_reports_progress_per_item() {
    let mut progress = Vec::new();
    merge_items(&items(vec![source("A", 1), source("B", 1)]), |p| {
        progress.push((p.current, p.total, p.name))
    })
    .await
    .unwrap();

    assert_eq!(
        progress,
        vec![(1, 2, "A.pdf".to_string()), (2, 2, "B.pdf".to_string())]
    );
}

#[tokio::test]
async fn test_merge_same_file_twice() {
    let merged = merge_items(&items(vec![source("A", 2), source("A", 2)]), |_| {})
        .await
        .unwrap();
    assert_eq!(page_labels(&merged.bytes), vec!["A-1", "A-2", "A-1", "A-2"]);
}

#[tokio::test]
async fn test_merge_aborts_on_corrupt_source() {
    let broken = SourceFile::new("broken.pdf", b"%PDF-1.4\nthis is not a pdf".to_vec());
    let mut progress = Vec::new();

    let result = merge_items(
        &items(vec![source("A", 1), broken, source("C", 1)]),
        |p| progress.push(p.current),
    )
    .await;

    match result {
        Err(MergeError::Parse { name, .. }) | Err(MergeError::InvalidInput { name, .. }) => {
            assert_eq!(name, "broken.pdf")
        }
        other => panic!("expected parse error, got {other:?}"),
    }
    // Only the first item was copied before the abort
    assert_eq!(progress, vec![1]);
}

#[tokio::test]
async fn test_merge_empty_fails() {
    let result = merge_items(&[], |_| {}).await;
    assert!(matches!(result, Err(MergeError::NoDocuments)));
}

#[test]
fn test_merged_pages_point_at_new_tree() {
    let a = Document::load_mem(&create_test_pdf("A", 2)).unwrap();
    let b = Document::load_mem(&create_test_pdf("B", 2)).unwrap();
    let merged = merge_documents(vec![a, b]).unwrap();

    let catalog_id = merged
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .unwrap();
    let pages_id = merged
        .get_object(catalog_id)
        .and_then(Object::as_dict)
        .and_then(|c| c.get(b"Pages"))
        .and_then(Object::as_reference)
        .unwrap();

    for page_id in merged.get_pages().into_values() {
        let parent = merged
            .get_object(page_id)
            .and_then(Object::as_dict)
            .and_then(|p| p.get(b"Parent"))
            .and_then(Object::as_reference)
            .unwrap();
        assert_eq!(parent, pages_id);
    }
    assert_eq!(merged.get_pages().len(), 4);
}

#[test]
fn test_inherited_media_box_is_copied_to_pages() {
    let doc = Document::load_mem(&create_inheriting_pdf("I", 2)).unwrap();
    let merged = merge_documents(vec![doc]).unwrap();

    for page_id in merged.get_pages().into_values() {
        let page = merged.get_object(page_id).and_then(Object::as_dict).unwrap();
        let media_box = page.get(b"MediaBox").and_then(Object::as_array).unwrap();
        assert_eq!(media_box[2].as_i64().unwrap(), 420);
        assert_eq!(media_box[3].as_i64().unwrap(), 595);
        assert!(page.has(b"Resources"));
    }
}

#[tokio::test]
async fn test_write_merged_output() {
    let merged = merge_items(&items(vec![source("A", 1), source("B", 2)]), |_| {})
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(&merged.file_name);
    merged.write_to(&path).await.unwrap();

    let written = std::fs::read(&path).unwrap();
    assert_eq!(page_labels(&written), vec!["A-1", "B-1", "B-2"]);
}

#[test]
fn test_load_source_reports_name_on_parse_failure() {
    let err = load_source("junk.pdf", b"not a pdf at all").unwrap_err();
    assert!(matches!(err, MergeError::Parse { ref name, .. } if name == "junk.pdf"));
    assert!(err.to_string().contains("junk.pdf"));
}

#[test]
fn test_load_source_detects_user_password() {
    let bytes = create_encrypted_pdf("L", 1, "secret", "owner");
    let err = load_source("locked.pdf", &bytes).unwrap_err();
    assert!(matches!(err, MergeError::Encrypted { ref name } if name == "locked.pdf"));
}

#[tokio::test]
async fn test_merge_aborts_on_password_protected_source() {
    let locked = SourceFile::new("locked.pdf", create_encrypted_pdf("L", 1, "secret", "owner"));
    let mut progress = Vec::new();

    let err = merge_items(
        &items(vec![source("A", 1), locked, source("C", 1)]),
        |p| progress.push(p.current),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, MergeError::Encrypted { ref name } if name == "locked.pdf"));
    assert_eq!(progress, vec![1]);

    let notice = Notice::from(&err);
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.message.starts_with("locked.pdf is password-protected"));
}

#[tokio::test]
async fn test_owner_password_only_source_merges() {
    let restricted = SourceFile::new(
        "restricted.pdf",
        create_encrypted_pdf("R", 2, "", "owner"),
    );
    assert!(load_source("restricted.pdf", &restricted.bytes).is_ok());

    let merged = merge_items(&items(vec![source("A", 1), restricted]), |_| {})
        .await
        .unwrap();
    assert_eq!(merged.page_count, 3);
}
