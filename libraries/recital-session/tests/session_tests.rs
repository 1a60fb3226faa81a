//! Reading session runtime tests
//!
//! Run on a paused tokio clock so the paced engine, settle delays and
//! autosave debounce complete instantly and deterministically.

use recital_core::storage::PositionStore;
use recital_core::types::{DocumentId, PositionSnapshot, ReaderState};
use recital_playback::{ControllerSettings, PlaybackError, ReaderEvent};
use recital_session::{PacedEngine, ReaderSession, SessionConfig, SessionHandle};
use recital_storage::MemoryPositionStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

fn create_test_session(store: &MemoryPositionStore) -> (SessionHandle, JoinHandle<()>) {
    let (engine, engine_events) = PacedEngine::new(20.0);
    ReaderSession::start(
        Box::new(engine),
        engine_events,
        Arc::new(store.clone()),
        ControllerSettings::default(),
        SessionConfig::default(),
    )
}

async fn wait_for(
    events: &mut broadcast::Receiver<ReaderEvent>,
    matches: impl Fn(&ReaderEvent) -> bool,
) -> ReaderEvent {
    tokio::time::timeout(Duration::from_secs(120), async {
        loop {
            match events.recv().await {
                Ok(event) if matches(&event) => return event,
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => panic!("session closed"),
            }
        }
    })
    .await
    .expect("event before timeout")
}

#[tokio::test(start_paused = true)]
async fn reads_to_the_end_and_saves_finish() {
    let store = MemoryPositionStore::new();
    let (session, task) = create_test_session(&store);
    let mut events = session.subscribe();
    let doc = DocumentId::new("doc");

    session.open(doc.clone(), "One. Two.").unwrap();
    session.play().unwrap();

    wait_for(&mut events, |e| {
        matches!(
            e,
            ReaderEvent::StateChanged {
                state: ReaderState::Finished,
                ..
            }
        )
    })
    .await;

    let status = session.status().await.unwrap();
    assert_eq!(status.state, ReaderState::Finished);
    assert_eq!(status.cursor, 2);

    let saved = store.get(&doc).await.unwrap();
    assert_eq!(saved.sentence_index, 2);

    session.close().await.unwrap();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn open_restores_saved_position() {
    let store = MemoryPositionStore::new();
    let doc = DocumentId::new("doc");
    store
        .save(&PositionSnapshot::new(doc.clone(), 2, 4))
        .await
        .unwrap();

    let (session, _task) = create_test_session(&store);
    session.open(doc, "A. B. C. D.").unwrap();

    let status = session.status().await.unwrap();
    assert_eq!(status.cursor, 2);
    assert_eq!(status.saved_index, Some(2));
    assert_eq!(status.char_offset, 0);
    assert_eq!(status.state, ReaderState::Idle);
}

#[tokio::test(start_paused = true)]
async fn restore_clamps_to_shorter_text() {
    let store = MemoryPositionStore::new();
    let doc = DocumentId::new("doc");
    store
        .save(&PositionSnapshot::new(doc.clone(), 40, 0))
        .await
        .unwrap();

    let (session, _task) = create_test_session(&store);
    session.open(doc, "Only. Two.").unwrap();

    assert_eq!(session.status().await.unwrap().cursor, 1);
}

#[tokio::test(start_paused = true)]
async fn finished_document_reopens_at_the_start() {
    let store = MemoryPositionStore::new();
    let doc = DocumentId::new("doc");
    let text = "One. Two. Three.";

    let (session, task) = create_test_session(&store);
    let mut events = session.subscribe();
    session.open(doc.clone(), text).unwrap();
    session.play().unwrap();
    wait_for(&mut events, |e| {
        matches!(
            e,
            ReaderEvent::StateChanged {
                state: ReaderState::Finished,
                ..
            }
        )
    })
    .await;
    session.close().await.unwrap();
    task.await.unwrap();
    assert_eq!(store.get(&doc).await.unwrap().sentence_index, 3);

    let (session, _task) = create_test_session(&store);
    session.open(doc, text).unwrap();

    let status = session.status().await.unwrap();
    assert_eq!(status.cursor, 0);
    assert_eq!(status.state, ReaderState::Idle);
}

#[tokio::test(start_paused = true)]
async fn advances_are_debounced_until_close() {
    let store = MemoryPositionStore::new();
    let (session, task) = create_test_session(&store);
    let mut events = session.subscribe();
    let doc = DocumentId::new("doc");

    session
        .open(doc.clone(), "One. Two. Three. Four. Five.")
        .unwrap();
    session.play().unwrap();

    wait_for(&mut events, |e| {
        matches!(e, ReaderEvent::SentenceStarted { index: 1 })
    })
    .await;
    assert_eq!(store.save_count(), 0);

    session.close().await.unwrap();
    task.await.unwrap();

    assert_eq!(store.save_count(), 1);
    assert_eq!(store.get(&doc).await.unwrap().sentence_index, 1);
}

#[tokio::test(start_paused = true)]
async fn store_failure_is_reported_and_retried() {
    let store = MemoryPositionStore::new();
    store.set_failing(true);
    let (session, _task) = create_test_session(&store);
    let mut events = session.subscribe();
    let doc = DocumentId::new("doc");

    session.open(doc.clone(), "One. Two. Three.").unwrap();
    session.play().unwrap();
    session.pause().unwrap();

    let event = wait_for(&mut events, |e| {
        matches!(
            e,
            ReaderEvent::Error {
                error: PlaybackError::Store(_)
            }
        )
    })
    .await;
    if let ReaderEvent::Error { error } = event {
        assert!(error.is_warning());
    }

    // Reading carries on regardless
    assert_eq!(session.status().await.unwrap().state, ReaderState::Paused);

    store.set_failing(false);
    tokio::time::sleep(Duration::from_secs(15)).await;

    let saved = store.get(&doc).await.unwrap();
    assert_eq!(saved.sentence_index, 0);
}

#[tokio::test(start_paused = true)]
async fn reset_clears_saved_position() {
    let store = MemoryPositionStore::new();
    let doc = DocumentId::new("doc");
    store
        .save(&PositionSnapshot::new(doc.clone(), 1, 0))
        .await
        .unwrap();

    let (session, _task) = create_test_session(&store);
    session.open(doc.clone(), "One. Two. Three.").unwrap();
    session.reset().unwrap();

    let status = session.status().await.unwrap();
    assert_eq!(status.cursor, 0);
    assert!(store.get(&doc).await.is_none());
}

#[tokio::test(start_paused = true)]
async fn eta_is_pushed_when_requested() {
    let store = MemoryPositionStore::new();
    let (session, _task) = create_test_session(&store);
    let mut events = session.subscribe();

    session.open(DocumentId::new("doc"), "One. Two. Three.").unwrap();
    session.set_eta_requested(true).unwrap();

    let event = wait_for(&mut events, |e| matches!(e, ReaderEvent::EtaUpdated { .. })).await;
    // 16 characters at the default 15 per second
    assert!(matches!(event, ReaderEvent::EtaUpdated { ref label, .. } if label == "0:01"));
}

#[tokio::test(start_paused = true)]
async fn dropping_every_handle_stops_the_session() {
    let store = MemoryPositionStore::new();
    let (session, task) = create_test_session(&store);
    let doc = DocumentId::new("doc");

    session.open(doc.clone(), "One. Two.").unwrap();
    session.next().unwrap();
    drop(session);

    task.await.unwrap();
    assert_eq!(store.get(&doc).await.unwrap().sentence_index, 1);
}

#[tokio::test(start_paused = true)]
async fn commands_after_close_fail() {
    let store = MemoryPositionStore::new();
    let (session, task) = create_test_session(&store);

    session.close().await.unwrap();
    task.await.unwrap();

    assert!(session.play().is_err());
    assert!(session.status().await.is_err());
}
