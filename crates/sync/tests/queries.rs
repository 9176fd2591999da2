//! Integration tests for cached reads: enablement, caching, invalidation
//! scope, retries and last-request-wins.

mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use iems_core::fee::{Fee, FeeStatus};
use iems_core::homework::HomeworkEntry;
use iems_core::message::Message;
use iems_remote::{InMemoryRemote, Operation};
use iems_sync::{QueryClient, QueryState, SyncConfig};

use common::attached_client;

// ---------------------------------------------------------------------------
// Test: disabled reads
// ---------------------------------------------------------------------------

/// Before a port is attached reads are disabled and make no call.
#[tokio::test]
async fn reads_are_disabled_without_transport() {
    let remote = InMemoryRemote::new();
    let client = QueryClient::new(common::test_config());

    assert_eq!(client.messages().await, QueryState::Disabled);
    assert_eq!(client.caller_profile().await, QueryState::Disabled);

    client.attach(Arc::new(remote.clone())).await;
    assert_eq!(client.messages().await, QueryState::Ready(Vec::new()));
    assert_eq!(remote.calls(Operation::GetMessages), 1);
}

/// A blank parameter disables the read.
#[tokio::test]
async fn blank_parameter_disables_read() {
    let remote = InMemoryRemote::new();
    let client = attached_client(&remote, "p-1").await;

    assert_eq!(client.fees("").await, QueryState::Disabled);
    assert_eq!(client.attendance("c1", "  ").await, QueryState::Disabled);
    assert_eq!(remote.calls(Operation::GetFees), 0);
    assert_eq!(remote.calls(Operation::GetAttendance), 0);
}

// ---------------------------------------------------------------------------
// Test: caching and invalidation
// ---------------------------------------------------------------------------

/// A fresh cached value is served without another call.
#[tokio::test]
async fn fresh_value_is_served_from_cache() {
    let remote = InMemoryRemote::new();
    let client = attached_client(&remote, "p-1").await;

    client.fees("555").await;
    client.fees("555").await;
    assert_eq!(remote.calls(Operation::GetFees), 1);
}

/// A write invalidates its own family only.
#[tokio::test]
async fn write_invalidates_only_its_family() {
    let remote = InMemoryRemote::new();
    let client = attached_client(&remote, "p-1").await;

    client.fees("555").await;
    client.homework("c1").await;

    client
        .update_fee("555", Fee::new(FeeStatus::Due, 40))
        .await
        .unwrap();

    assert_eq!(
        client.fees("555").await,
        QueryState::Ready(Some(Fee::new(FeeStatus::Due, 40)))
    );
    client.homework("c1").await;

    assert_eq!(remote.calls(Operation::GetFees), 2);
    assert_eq!(remote.calls(Operation::GetHomework), 1);
}

/// Messages are append-only; sending one shows up on the next read.
#[tokio::test]
async fn sent_message_appears_in_list() {
    let remote = InMemoryRemote::new();
    let client = attached_client(&remote, "p-1").await;

    assert_eq!(client.messages().await, QueryState::Ready(Vec::new()));
    client
        .send_message(Message::new("Exams on Monday", "office", Vec::new()))
        .await
        .unwrap();

    let messages = client.messages().await.ready().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "Exams on Monday");
}

// ---------------------------------------------------------------------------
// Test: retries
// ---------------------------------------------------------------------------

/// Reads retry with backoff before reporting failure.
#[tokio::test(start_paused = true)]
async fn failed_read_is_retried() {
    let remote = InMemoryRemote::new();
    let client = QueryClient::new(SyncConfig::default());
    client.attach(Arc::new(remote.as_caller("p-1"))).await;

    remote.fail_next(Operation::GetHomework, "busy");
    remote.fail_next(Operation::GetHomework, "busy");
    assert_eq!(client.homework("c1").await, QueryState::Ready(None));
    assert_eq!(remote.calls(Operation::GetHomework), 3);

    for _ in 0..4 {
        remote.fail_next(Operation::GetFees, "still busy");
    }
    assert_matches!(client.fees("555").await, QueryState::Failed(m) if m == "still busy");
    assert_eq!(remote.calls(Operation::GetFees), 4);
}

/// The caller profile is never retried.
#[tokio::test(start_paused = true)]
async fn caller_profile_is_not_retried() {
    let remote = InMemoryRemote::new();
    let client = QueryClient::new(SyncConfig::default());
    client.attach(Arc::new(remote.as_caller("p-1"))).await;

    remote.fail_next(Operation::GetCallerUserProfile, "down");
    assert_matches!(client.caller_profile().await, QueryState::Failed(_));
    assert_eq!(remote.calls(Operation::GetCallerUserProfile), 1);
}

// ---------------------------------------------------------------------------
// Test: last request wins
// ---------------------------------------------------------------------------

/// A slow early read that lands after a newer one is discarded.
#[tokio::test(start_paused = true)]
async fn stale_response_is_discarded() {
    let remote = InMemoryRemote::new();
    let client = attached_client(&remote, "p-1").await;

    // The slow read captures the original (absent) homework.
    remote.delay_next(Operation::GetHomework, Duration::from_secs(5));
    let slow = {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.refetch(&client.homework_query("c1")).await })
    };
    // Let the slow read start before the write.
    tokio::time::sleep(Duration::from_millis(1)).await;

    client
        .add_homework("c1", HomeworkEntry::new("Essay", "300 words", "2026-11-02"))
        .await
        .unwrap();
    let fresh = client.homework("c1").await;
    assert_matches!(&fresh, QueryState::Ready(Some(entry)) if entry.title == "Essay");

    // The slow read returns the newer state too.
    assert_eq!(slow.await.unwrap(), fresh);
    assert_eq!(client.homework("c1").await, fresh);
}

/// A read that overlaps a write to its family answers with the data as it
/// is after the write.
#[tokio::test(start_paused = true)]
async fn read_overlapping_write_is_reissued() {
    let remote = InMemoryRemote::new();
    let client = attached_client(&remote, "p-1").await;

    remote.delay_next(Operation::GetFees, Duration::from_secs(2));
    let read = {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.fees("555").await })
    };
    tokio::time::sleep(Duration::from_secs(1)).await;

    client
        .update_fee("555", Fee::new(FeeStatus::Due, 50))
        .await
        .unwrap();

    assert_eq!(
        read.await.unwrap(),
        QueryState::Ready(Some(Fee::new(FeeStatus::Due, 50)))
    );
    assert_eq!(remote.calls(Operation::GetFees), 2);
}

// ---------------------------------------------------------------------------
// Test: eviction
// ---------------------------------------------------------------------------

/// Entries nobody watches are dropped once idle; watched ones stay.
#[tokio::test(start_paused = true)]
async fn idle_unwatched_entries_are_evicted() {
    let remote = InMemoryRemote::new();
    let client = attached_client(&remote, "p-1").await;

    assert_eq!(client.attendance("c1", "555").await, QueryState::Ready(false));
    let mut watch = client.watch(client.fees_query("555"));
    watch.wait_for(|s| s.is_ready()).await;
    assert_eq!(client.cache().len().await, 2);

    tokio::time::sleep(client.config().cache_idle + Duration::from_secs(1)).await;
    client.messages().await;

    assert_eq!(client.cache().len().await, 2);
    let attendance = client.attendance_query("c1", "555");
    assert_eq!(client.cache().value(attendance.key()).await, None);
    assert!(client.cache().is_fresh(client.fees_query("555").key()).await);

    // An evicted entry is simply fetched again.
    assert_eq!(client.attendance("c1", "555").await, QueryState::Ready(false));
    assert_eq!(remote.calls(Operation::GetAttendance), 2);
}
