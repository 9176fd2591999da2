//! Integration tests for undoable writes against the in-memory service.

mod common;

use assert_matches::assert_matches;
use iems_core::attendance::AttendanceKey;
use iems_core::fee::{Fee, FeeStatus};
use iems_core::homework::HomeworkEntry;
use iems_remote::{InMemoryRemote, Operation};
use iems_sync::{QueryState, SyncError};

use common::attached_client;

// ---------------------------------------------------------------------------
// Test: attendance mark then undo
// ---------------------------------------------------------------------------

/// Marking a student present and undoing it brings the read back to the
/// value observed before the mark.
#[tokio::test]
async fn attendance_undo_restores_previous_value() {
    let remote = InMemoryRemote::new();
    let client = attached_client(&remote, "teacher-1").await;

    assert_eq!(client.attendance("class-1", "555").await, QueryState::Ready(false));

    let offer = client
        .mark_attendance(AttendanceKey::new("class-1", "555"), true)
        .await
        .expect("mark succeeds");
    assert_eq!(client.attendance("class-1", "555").await, QueryState::Ready(true));

    client.undo(&offer).await.expect("undo succeeds");
    assert_eq!(client.attendance("class-1", "555").await, QueryState::Ready(false));
    assert_eq!(remote.calls(Operation::UndoAttendance), 1);
}

// ---------------------------------------------------------------------------
// Test: undo is single step
// ---------------------------------------------------------------------------

/// Two fee updates followed by one undo land on the first update, not on
/// the original value. The offer from the first update has expired.
#[tokio::test]
async fn fee_undo_reverts_only_the_latest_update() {
    let remote = InMemoryRemote::new();
    let client = attached_client(&remote, "chair-1").await;

    let first = client
        .update_fee("555", Fee::new(FeeStatus::Paid, 100))
        .await
        .unwrap();
    let second = client
        .update_fee("555", Fee::new(FeeStatus::Due, 50))
        .await
        .unwrap();

    assert!(!client.can_undo(&first));
    assert_matches!(client.undo(&first).await, Err(SyncError::UndoExpired));

    client.undo(&second).await.unwrap();
    assert_eq!(
        client.fees("555").await,
        QueryState::Ready(Some(Fee::new(FeeStatus::Paid, 100)))
    );
}

/// An offer can be used once.
#[tokio::test]
async fn offer_cannot_be_used_twice() {
    let remote = InMemoryRemote::new();
    let client = attached_client(&remote, "chair-1").await;

    let offer = client
        .update_fee("555", Fee::new(FeeStatus::Advance, 20))
        .await
        .unwrap();
    client.undo(&offer).await.unwrap();

    assert_matches!(client.undo(&offer).await, Err(SyncError::UndoExpired));
    assert_eq!(remote.calls(Operation::UndoFee), 1);
    assert_eq!(client.fees("555").await, QueryState::Ready(None));
}

// ---------------------------------------------------------------------------
// Test: failures
// ---------------------------------------------------------------------------

/// A failed write shows the service message, grants no undo and leaves the
/// cached read as it was.
#[tokio::test]
async fn failed_write_leaves_cache_and_grants_no_undo() {
    let remote = InMemoryRemote::new();
    let client = attached_client(&remote, "teacher-1").await;

    assert_eq!(client.homework("c1").await, QueryState::Ready(None));
    remote.fail_next(Operation::AddHomework, "Class is closed");

    let entry = HomeworkEntry::new("Read", "Chapter 1", "2026-11-01");
    let result = client.add_homework("c1", entry).await;
    assert_matches!(result, Err(SyncError::RemoteOperationFailed(m)) if m == "Class is closed");

    assert_eq!(client.homework("c1").await, QueryState::Ready(None));
    assert_eq!(remote.calls(Operation::GetHomework), 1, "cache was not invalidated");
}

/// When the service rejects an undo the offer stays usable for a retry.
#[tokio::test]
async fn rejected_undo_can_be_retried() {
    let remote = InMemoryRemote::new();
    let client = attached_client(&remote, "teacher-1").await;

    let offer = client.delete_homework("c1").await.unwrap();
    remote.fail_next(Operation::UndoHomework, "Service busy");

    assert_matches!(
        client.undo(&offer).await,
        Err(SyncError::RemoteOperationFailed(m)) if m == "Service busy"
    );
    assert!(client.can_undo(&offer));
    client.undo(&offer).await.unwrap();
    assert!(!client.can_undo(&offer));
}

/// Incomplete homework is rejected before any call is made.
#[tokio::test]
async fn incomplete_homework_is_not_sent() {
    let remote = InMemoryRemote::new();
    let client = attached_client(&remote, "teacher-1").await;

    let result = client
        .add_homework("c1", HomeworkEntry::new("Read", " ", ""))
        .await;
    assert_matches!(result, Err(SyncError::Validation(m)) if m.contains("description"));
    assert_eq!(remote.calls(Operation::AddHomework), 0);
}

/// Direct undo without an offer also retires the outstanding offer.
#[tokio::test]
async fn direct_undo_retires_offer() {
    let remote = InMemoryRemote::new();
    let client = attached_client(&remote, "chair-1").await;

    let offer = client
        .update_fee("555", Fee::new(FeeStatus::Due, 5))
        .await
        .unwrap();
    client.undo_fee("555").await.unwrap();

    assert!(!client.can_undo(&offer));
}

/// Without an attached port every write fails fast.
#[tokio::test]
async fn writes_need_a_transport() {
    let client = iems_sync::QueryClient::new(common::test_config());
    let result = client
        .mark_attendance(AttendanceKey::new("c1", "555"), true)
        .await;
    assert_matches!(result, Err(SyncError::TransportUnavailable));
}
