//! Save path: dirty tracking, debounce, manual sync, verification and rollback.

mod common;

use block_sync::{
    LoadOutcome, NoticeLevel, SaveOutcome, Settings, SyncMode, SyncPhase, SyncResult,
};
use common::{Harness, WriteFault};

#[tokio::test]
async fn test_load_binds_clean_buffer() {
    let mut h = Harness::new([("Note.md", "# Hello")]);

    let outcome = h.manager.load_file("Note.md").await.unwrap();

    assert_eq!(outcome, LoadOutcome::Loaded);
    assert_eq!(h.editor_text(), "# Hello");
    let state = h.manager.state();
    assert_eq!(state.current_file_path.as_deref(), Some("Note.md"));
    assert!(!state.dirty);
    assert!(!state.saving);
    assert_eq!(state.mode, SyncMode::Auto);
}

#[tokio::test]
async fn test_load_missing_file_keeps_previous_binding() {
    let mut h = Harness::bound("content").await;

    assert!(h.manager.load_file("Missing.md").await.is_err());

    assert_eq!(h.manager.current_path(), Some("Note.md"));
    assert_eq!(h.editor_text(), "content");
}

#[tokio::test]
async fn test_debounce_coalesces_burst_into_one_save() {
    let mut h = Harness::bound("start").await;

    for i in 1..=5 {
        h.type_text(&format!("start {}", i));
        h.clock.advance(100);
        assert_eq!(h.manager.poll_timers().await, None);
    }

    // Last edit was 100ms ago; the deadline is 500ms after it
    h.clock.advance(399);
    assert_eq!(h.manager.poll_timers().await, None);
    assert!(h.fs.writes_to("Note.md").is_empty());

    h.clock.advance(1);
    assert_eq!(h.manager.poll_timers().await, Some(SaveOutcome::Saved));

    assert_eq!(h.fs.writes_to("Note.md"), vec!["start 5".to_string()]);
    assert_eq!(h.manager.poll_timers().await, None);
}

#[tokio::test]
async fn test_edits_schedule_deadline_from_last_edit() {
    let mut h = Harness::bound("a").await;
    let t0 = h.manager.state();
    assert!(!t0.dirty);

    h.type_text("ab");
    let first = h.manager.next_deadline().unwrap();
    h.clock.advance(300);
    h.type_text("abc");
    let second = h.manager.next_deadline().unwrap();

    assert_eq!(second - first, 300);
    assert!(h.manager.is_dirty());
}

#[tokio::test]
async fn test_successful_save_updates_baselines() {
    let mut h = Harness::bound("old").await;
    h.type_text("new");
    h.clock.advance(500);

    assert_eq!(h.manager.poll_timers().await, Some(SaveOutcome::Saved));

    let state = h.manager.state();
    assert!(!state.dirty);
    assert_eq!(state.last_saved_at, Some(h.now()));
    assert_eq!(state.last_sync_result, Some(SyncResult::Ok));
    assert_eq!(state.last_sync_message, None);
    assert_eq!(h.fs.content("Note.md").as_deref(), Some("new"));

    let notices = h.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Info);
}

#[tokio::test]
async fn test_huge_debounce_never_fires() {
    let settings = Settings {
        debounce_ms: u64::MAX,
        ..Settings::default()
    };
    let mut h = Harness::with_settings([("Note.md", "a")], settings);
    h.manager.load_file("Note.md").await.unwrap();

    h.type_text("ab");
    assert_eq!(h.manager.next_deadline(), Some(u64::MAX));

    let manual = Settings {
        sync_mode: SyncMode::Manual,
        debounce_ms: u64::MAX,
        ..Settings::default()
    };
    h.manager.update_settings(manual.clone());
    h.manager.update_settings(Settings {
        sync_mode: SyncMode::Auto,
        ..manual
    });
    assert_eq!(h.manager.next_deadline(), Some(u64::MAX));

    h.clock.advance(3_600_000);
    assert_eq!(h.manager.poll_timers().await, None);
    assert!(h.manager.is_dirty());
}

#[tokio::test]
async fn test_manual_mode_waits_for_explicit_sync() {
    let settings = Settings {
        sync_mode: SyncMode::Manual,
        ..Settings::default()
    };
    let mut h = Harness::with_settings([("Note.md", "a")], settings);
    h.manager.load_file("Note.md").await.unwrap();

    h.type_text("a and more");
    assert!(h.manager.is_dirty());
    assert_eq!(h.manager.next_deadline(), None);

    h.clock.advance(60_000);
    assert_eq!(h.manager.poll_timers().await, None);
    assert!(h.fs.writes_to("Note.md").is_empty());

    assert_eq!(h.manager.trigger_manual_sync().await, SaveOutcome::Saved);
    assert_eq!(h.fs.content("Note.md").as_deref(), Some("a and more"));
}

#[tokio::test]
async fn test_manual_sync_twice_writes_once() {
    let mut h = Harness::bound("a").await;
    h.type_text("b");

    assert_eq!(h.manager.trigger_manual_sync().await, SaveOutcome::Saved);
    assert_eq!(h.manager.trigger_manual_sync().await, SaveOutcome::UpToDate);

    assert_eq!(h.fs.writes_to("Note.md").len(), 1);
}

#[tokio::test]
async fn test_manual_sync_cancels_pending_timer() {
    let mut h = Harness::bound("a").await;
    h.type_text("b");
    assert!(h.manager.next_deadline().is_some());

    h.manager.trigger_manual_sync().await;
    h.clock.advance(1_000);

    assert_eq!(h.manager.poll_timers().await, None);
    assert_eq!(h.fs.writes_to("Note.md").len(), 1);
}

#[tokio::test]
async fn test_whitespace_only_change_is_not_an_edit() {
    let mut h = Harness::bound("line one\nline two").await;

    h.type_text("line one  \r\nline two\n");

    assert!(!h.manager.is_dirty());
    assert_eq!(h.manager.next_deadline(), None);
}

#[tokio::test]
async fn test_typing_back_to_baseline_is_ignored() {
    let mut h = Harness::bound("same").await;
    h.type_text("same");
    assert_eq!(h.manager.phase(), SyncPhase::Clean);
}

#[tokio::test]
async fn test_pre_read_failure_aborts_without_writing() {
    let mut h = Harness::bound("disk").await;
    h.type_text("local");
    h.fs.script_reads([true]);

    assert_eq!(h.manager.trigger_manual_sync().await, SaveOutcome::Failed);

    assert!(h.fs.writes_to("Note.md").is_empty());
    let state = h.manager.state();
    assert!(state.dirty);
    assert_eq!(state.last_sync_result, Some(SyncResult::Error));
    assert!(state.last_sync_message.unwrap().contains("Could not read"));
    let notices = h.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
}

#[tokio::test]
async fn test_write_failure_keeps_buffer_dirty() {
    let mut h = Harness::bound("disk").await;
    h.type_text("local");
    h.fs.script_writes([Some(WriteFault::Fail)]);

    assert_eq!(h.manager.trigger_manual_sync().await, SaveOutcome::Failed);

    assert_eq!(h.fs.content("Note.md").as_deref(), Some("disk"));
    assert!(h.manager.is_dirty());

    // Next attempt succeeds; disk still matches the baseline so no conflict
    assert_eq!(h.manager.trigger_manual_sync().await, SaveOutcome::Saved);
    assert_eq!(h.fs.content("Note.md").as_deref(), Some("local"));
}

#[tokio::test]
async fn test_read_back_failure_is_unverified_and_stays_dirty() {
    let mut h = Harness::bound("disk").await;
    h.type_text("local");
    // Pre-read passes, read-back fails
    h.fs.script_reads([false, true]);

    assert_eq!(h.manager.trigger_manual_sync().await, SaveOutcome::Unverified);

    assert_eq!(h.fs.content("Note.md").as_deref(), Some("local"));
    let state = h.manager.state();
    assert!(state.dirty);
    assert_eq!(state.last_sync_result, Some(SyncResult::Error));

    // The next sync sees our own write on disk and verifies it without a
    // conflict or a second write
    assert_eq!(h.manager.trigger_manual_sync().await, SaveOutcome::UpToDate);
    assert!(!h.manager.is_dirty());
    assert_eq!(h.fs.writes_to("Note.md").len(), 1);

    let state = h.manager.state();
    assert_eq!(state.last_sync_result, Some(SyncResult::Ok));
    assert_eq!(state.last_sync_message, None);
    assert_eq!(state.last_saved_at, Some(h.now()));
}

#[tokio::test]
async fn test_reverting_after_failed_write_clears_error() {
    let mut h = Harness::bound("disk").await;
    h.type_text("local");
    h.fs.script_writes([Some(WriteFault::Fail)]);
    assert_eq!(h.manager.trigger_manual_sync().await, SaveOutcome::Failed);

    h.type_text("disk");
    assert!(h.manager.is_dirty());

    assert_eq!(h.manager.trigger_manual_sync().await, SaveOutcome::UpToDate);
    let state = h.manager.state();
    assert!(!state.dirty);
    assert_eq!(state.last_sync_result, Some(SyncResult::Ok));
    assert_eq!(state.last_sync_message, None);
    assert!(h.fs.writes_to("Note.md").is_empty());
}

#[tokio::test]
async fn test_verification_mismatch_rolls_back() {
    let mut h = Harness::bound("before").await;
    h.type_text("mine");
    h.fs.script_writes([Some(WriteFault::Race("racer".to_string()))]);

    assert_eq!(h.manager.trigger_manual_sync().await, SaveOutcome::RolledBack);

    assert_eq!(h.fs.content("Note.md").as_deref(), Some("before"));
    assert_eq!(
        h.fs.writes_to("Note.md"),
        vec!["mine".to_string(), "before".to_string()]
    );
    assert!(h.manager.is_dirty());
    assert_eq!(h.editor_text(), "mine");

    let errors: Vec<_> = h
        .take_notices()
        .into_iter()
        .filter(|n| n.level == NoticeLevel::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("restored"));
}

#[tokio::test]
async fn test_rollback_failure_points_to_backups() {
    let mut h = Harness::bound("before").await;
    h.type_text("mine");
    h.fs.script_writes([
        Some(WriteFault::Race("racer".to_string())),
        Some(WriteFault::Fail),
    ]);

    assert_eq!(h.manager.trigger_manual_sync().await, SaveOutcome::RollbackFailed);

    assert_eq!(h.fs.content("Note.md").as_deref(), Some("racer"));
    assert!(h.manager.is_dirty());
    let state = h.manager.state();
    assert!(state.last_sync_message.unwrap().contains("backup"));

    // Disk no longer matches the baseline, so the next save asks first
    h.decisions.push_conflict(block_sync::ConflictDecision::Cancel);
    h.manager.trigger_manual_sync().await;
    assert_eq!(h.decisions.conflict_prompts().len(), 1);
}

#[tokio::test]
async fn test_flush_saves_pending_edits_immediately() {
    let mut h = Harness::bound("a").await;
    h.type_text("b");

    assert_eq!(h.manager.flush().await, SaveOutcome::Saved);
    assert_eq!(h.manager.next_deadline(), None);
    assert_eq!(h.manager.flush().await, SaveOutcome::UpToDate);
    assert_eq!(h.fs.writes_to("Note.md").len(), 1);
}

#[tokio::test]
async fn test_dispose_drops_pending_save() {
    let mut h = Harness::bound("a").await;
    h.type_text("unsaved");

    h.manager.dispose();
    h.clock.advance(10_000);

    assert_eq!(h.manager.poll_timers().await, None);
    assert!(h.fs.writes_to("Note.md").is_empty());
    assert_eq!(h.manager.current_path(), None);
    assert!(!h.manager.is_dirty());
}

#[tokio::test]
async fn test_unbound_manager_ignores_edits() {
    let mut h = Harness::new([("Note.md", "a")]);
    h.type_text("typed");

    assert!(!h.manager.is_dirty());
    assert_eq!(h.manager.trigger_manual_sync().await, SaveOutcome::Unbound);
}

#[tokio::test]
async fn test_switching_to_manual_cancels_timer() {
    let mut h = Harness::bound("a").await;
    h.type_text("b");

    h.manager.update_settings(Settings {
        sync_mode: SyncMode::Manual,
        ..Settings::default()
    });
    assert_eq!(h.manager.next_deadline(), None);
    assert!(h.manager.is_dirty());
    assert_eq!(h.manager.state().mode, SyncMode::Manual);

    h.clock.advance(1_000);
    h.manager.update_settings(Settings::default());
    assert_eq!(h.manager.next_deadline(), Some(h.now() + 500));

    h.clock.advance(500);
    assert_eq!(h.manager.poll_timers().await, Some(SaveOutcome::Saved));
}

#[tokio::test]
async fn test_state_changes_are_published() {
    let mut h = Harness::bound("a").await;
    h.type_text("b");
    h.manager.trigger_manual_sync().await;

    let saving_seen = h.events().iter().any(|event| {
        matches!(event, block_sync::SyncEvent::StateChanged { state } if state.saving)
    });
    assert!(saving_seen);
    assert!(!h.manager.state().saving);
}
