use pdf_async_runtime::*;
use std::path::PathBuf;

#[tokio::test]
async fn test_every_subscriber_receives_event() {
    let bus = EventBus::default();
    let mut first = bus.subscribe();
    let mut second = bus.subscribe();

    assert_eq!(bus.publish(AppEvent::MergeRequested).unwrap(), 2);

    assert_eq!(first.recv().await.unwrap(), AppEvent::MergeRequested);
    assert_eq!(second.recv().await.unwrap(), AppEvent::MergeRequested);
}

#[test]
fn test_publish_without_subscribers_fails() {
    let bus = EventBus::default();
    assert_eq!(
        bus.publish(AppEvent::MergeRequested),
        Err(BusError::NoSubscribers)
    );
}

#[test]
fn test_late_subscriber_misses_earlier_events() {
    let bus = EventBus::default();
    let _early = bus.subscribe();
    bus.publish(AppEvent::FilesUploaded(vec![PathBuf::from("a.pdf")]))
        .unwrap();

    let mut late = bus.subscribe();
    assert!(late.try_recv().is_none());
}

#[test]
fn test_try_recv_skips_lagged_events() {
    let bus = EventBus::new(2);
    let mut sub = bus.subscribe();
    for n in 0..4 {
        bus.publish(AppEvent::MergeCompleted {
            path: PathBuf::from("merged.pdf"),
            page_count: n,
        })
        .unwrap();
    }

    // Only the two newest events are still buffered
    assert_eq!(
        sub.try_recv(),
        Some(AppEvent::MergeCompleted {
            path: PathBuf::from("merged.pdf"),
            page_count: 2
        })
    );
    assert_eq!(
        sub.try_recv(),
        Some(AppEvent::MergeCompleted {
            path: PathBuf::from("merged.pdf"),
            page_count: 3
        })
    );
    assert!(sub.try_recv().is_none());
}

#[tokio::test]
async fn test_recv_reports_lag() {
    let bus = EventBus::new(1);
    let mut sub = bus.subscribe();
    bus.publish(AppEvent::MergeRequested).unwrap();
    bus.publish(AppEvent::MergeRequested).unwrap();

    assert_eq!(sub.recv().await, Err(BusError::Lagged(1)));
    assert_eq!(sub.recv().await, Ok(AppEvent::MergeRequested));
}

#[test]
fn test_board_events_convert_to_updates() {
    let update: PdfUpdate = BoardEvent::Notice(Notice::info("hello")).into();
    assert!(matches!(update, PdfUpdate::Board(BoardEvent::Notice(n)) if n.message == "hello"));
}
