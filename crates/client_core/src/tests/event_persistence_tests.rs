use chrono::{DateTime, Duration, TimeZone, Utc};
use shared::domain::{AuthStatus, EventId};
use tokio::sync::broadcast::{self, error::TryRecvError};

use super::*;
use crate::{
    alerts::AlertCategory,
    mock_backend::{test_user, MockBackend, SERVER_FAILURE_MESSAGE},
    session::{store_token, MemorySessionRepository},
};

struct Harness {
    backend: MockBackend,
    calendar: Arc<Store<CalendarState>>,
    alerts: broadcast::Receiver<Alert>,
    hook: EventPersistence,
}

async fn harness() -> Harness {
    let backend = MockBackend::spawn().await;
    let session = Arc::new(MemorySessionRepository::new());
    let token = backend.issue_token_for_test_user().await;
    store_token(session.as_ref(), &token, Utc::now())
        .await
        .expect("store token");

    let api = Arc::new(CalendarApi::new(&backend.url, session).expect("api"));
    let auth = Arc::new(Store::with_state(AuthState {
        status: AuthStatus::Authenticated,
        user: Some(test_user()),
        error_message: None,
    }));
    let calendar = Arc::new(Store::<CalendarState>::new());
    let sink = AlertSink::new();
    let alerts = sink.subscribe();
    let hook = EventPersistence::new(api, auth, calendar.clone(), sink);
    Harness {
        backend,
        calendar,
        alerts,
        hook,
    }
}

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 11, 25, hour, 0, 0).unwrap()
}

fn new_draft(title: &str) -> EventDraft {
    EventDraft {
        id: None,
        title: title.to_string(),
        notes: "Some note".to_string(),
        start: at(13),
        end: at(15),
        user: None,
    }
}

fn seeded_event(id: &str, title: &str) -> CalendarEvent {
    CalendarEvent {
        id: EventId::new(id),
        title: title.to_string(),
        notes: String::new(),
        start: at(9),
        end: at(10),
        user: Some(test_user()),
    }
}

#[tokio::test]
async fn loads_events_from_server() {
    let h = harness().await;
    h.backend.seed_event(seeded_event("1", "Standup")).await;
    h.backend.seed_event(seeded_event("2", "Retro")).await;

    h.hook.start_loading_events().await.expect("load");

    let state = h.hook.snapshot();
    assert!(!state.is_loading_events);
    assert_eq!(
        state.events,
        vec![seeded_event("1", "Standup"), seeded_event("2", "Retro")]
    );
}

#[tokio::test]
async fn saving_new_draft_appends_event_with_server_id() {
    let h = harness().await;
    h.calendar
        .dispatch(CalendarAction::LoadEvents(vec![seeded_event("1", "Standup")]));

    let saved = h
        .hook
        .start_saving_event(new_draft("Birthday"))
        .await
        .expect("save");

    let server_events = h.backend.events().await;
    assert_eq!(server_events.len(), 1);
    assert_eq!(saved.id, server_events[0].id);
    assert_eq!(saved.user, Some(test_user()));
    assert_eq!(h.hook.events(), vec![seeded_event("1", "Standup"), saved]);
}

#[tokio::test]
async fn saving_existing_event_replaces_entry() {
    let h = harness().await;
    h.backend.seed_event(seeded_event("1", "Standup")).await;
    h.backend.seed_event(seeded_event("2", "Retro")).await;
    h.hook.start_loading_events().await.expect("load");

    let mut draft = EventDraft::from(seeded_event("1", "Standup"));
    draft.title = "Standup (moved)".to_string();
    draft.start = at(11);
    draft.end = at(12);
    h.hook.set_active_event(draft.clone());

    let saved = h.hook.start_saving_event(draft).await.expect("save");

    assert_eq!(saved.title, "Standup (moved)");
    let events = h.hook.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], saved);
    assert_eq!(events[1], seeded_event("2", "Retro"));
    assert_eq!(h.backend.events().await[0].title, "Standup (moved)");
}

#[tokio::test]
async fn invalid_dates_raise_alert_without_calling_server() {
    let mut h = harness().await;
    let mut draft = new_draft("Birthday");
    draft.end = draft.start - Duration::minutes(30);

    let err = h
        .hook
        .start_saving_event(draft)
        .await
        .expect_err("must be rejected");

    assert!(matches!(
        err,
        CalendarError::Validation(ValidationError::InvalidDates)
    ));
    let alert = h.alerts.try_recv().expect("alert");
    assert_eq!(alert.category, AlertCategory::Validation);
    assert_eq!(alert.title, "Invalid Dates");
    assert!(h.backend.events().await.is_empty());
    assert!(h.backend.seen_tokens().await.is_empty());
    assert_eq!(h.hook.snapshot(), CalendarState::default());
}

#[tokio::test]
async fn empty_title_is_rejected_locally() {
    let h = harness().await;

    let err = h
        .hook
        .start_saving_event(new_draft(""))
        .await
        .expect_err("must be rejected");

    assert!(matches!(
        err,
        CalendarError::Validation(ValidationError::MissingTitle)
    ));
    assert!(h.backend.seen_tokens().await.is_empty());
}

#[tokio::test]
async fn failed_save_leaves_state_unchanged_and_alerts() {
    let mut h = harness().await;
    h.calendar
        .dispatch(CalendarAction::LoadEvents(vec![seeded_event("1", "Standup")]));
    let before = h.hook.snapshot();
    h.backend.fail_event_writes(true).await;

    let err = h
        .hook
        .start_saving_event(new_draft("Birthday"))
        .await
        .expect_err("must fail");

    assert!(matches!(err, CalendarError::Api { action: "create", .. }));
    assert_eq!(h.hook.snapshot(), before);
    let alert = h.alerts.try_recv().expect("alert");
    assert_eq!(alert.title, "Error saving event");
    assert_eq!(alert.message, SERVER_FAILURE_MESSAGE);
}

#[tokio::test]
async fn deleting_active_event_removes_it() {
    let h = harness().await;
    h.backend.seed_event(seeded_event("1", "Standup")).await;
    h.backend.seed_event(seeded_event("2", "Retro")).await;
    h.hook.start_loading_events().await.expect("load");
    h.hook.set_active_event(seeded_event("1", "Standup"));
    assert!(h.hook.has_event_selected());

    h.hook.start_deleting_event().await.expect("delete");

    assert_eq!(h.hook.active_event(), None);
    assert_eq!(h.hook.events(), vec![seeded_event("2", "Retro")]);
    assert_eq!(h.backend.events().await, vec![seeded_event("2", "Retro")]);
}

#[tokio::test]
async fn deleting_without_selection_is_an_error() {
    let h = harness().await;

    let err = h
        .hook
        .start_deleting_event()
        .await
        .expect_err("nothing selected");

    assert!(matches!(err, CalendarError::NoActiveEvent));
    assert!(h.backend.seen_tokens().await.is_empty());
}

#[tokio::test]
async fn deleting_unsaved_draft_is_an_error() {
    let h = harness().await;
    h.hook.set_active_event(new_draft("Not saved"));

    let err = h
        .hook
        .start_deleting_event()
        .await
        .expect_err("draft has no id");

    assert!(matches!(err, CalendarError::NoActiveEvent));
    assert!(h.hook.has_event_selected());
}

#[tokio::test]
async fn failed_delete_keeps_event_and_selection() {
    let mut h = harness().await;
    h.backend.seed_event(seeded_event("1", "Standup")).await;
    h.hook.start_loading_events().await.expect("load");
    h.hook.set_active_event(seeded_event("1", "Standup"));
    let before = h.hook.snapshot();
    h.backend.fail_event_writes(true).await;

    let err = h.hook.start_deleting_event().await.expect_err("must fail");

    assert!(matches!(err, CalendarError::Api { action: "delete", .. }));
    assert_eq!(h.hook.snapshot(), before);
    assert_eq!(h.alerts.try_recv().expect("alert").title, "Error deleting event");
}

#[tokio::test]
async fn failed_load_clears_loading_flag_and_alerts() {
    let backend = MockBackend::spawn().await;
    let session = Arc::new(MemorySessionRepository::new());
    let api = Arc::new(CalendarApi::new(&backend.url, session).expect("api"));
    let calendar = Arc::new(Store::<CalendarState>::new());
    let sink = AlertSink::new();
    let mut alerts = sink.subscribe();
    let hook = EventPersistence::new(api, Arc::new(Store::new()), calendar, sink);

    let err = hook.start_loading_events().await.expect_err("no token");

    assert!(matches!(err, CalendarError::Api { action: "load", .. }));
    assert!(!hook.snapshot().is_loading_events);
    let alert = alerts.try_recv().expect("alert");
    assert_eq!(alert.category, AlertCategory::Auth);
    assert!(matches!(alerts.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn selection_changed_during_delete_removes_the_deleted_event() {
    let h = harness().await;
    h.backend.seed_event(seeded_event("1", "Standup")).await;
    h.backend.seed_event(seeded_event("2", "Retro")).await;
    h.hook.start_loading_events().await.expect("load");
    h.hook.set_active_event(seeded_event("1", "Standup"));
    h.backend
        .delay_event_writes(std::time::Duration::from_millis(300))
        .await;

    let hook = h.hook.clone();
    let pending = tokio::spawn(async move { hook.start_deleting_event().await });
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    h.hook.set_active_event(seeded_event("2", "Retro"));
    pending.await.expect("join").expect("delete");

    assert_eq!(h.backend.events().await, vec![seeded_event("2", "Retro")]);
    assert_eq!(h.hook.events(), vec![seeded_event("2", "Retro")]);
    assert_eq!(
        h.hook.active_event(),
        Some(EventDraft::from(seeded_event("2", "Retro")))
    );
}

#[tokio::test]
async fn selection_changed_during_create_is_kept() {
    let h = harness().await;
    h.calendar
        .dispatch(CalendarAction::LoadEvents(vec![seeded_event("1", "Standup")]));
    h.hook.set_active_event(new_draft("Birthday"));
    h.backend
        .delay_event_writes(std::time::Duration::from_millis(300))
        .await;

    let hook = h.hook.clone();
    let pending =
        tokio::spawn(async move { hook.start_saving_event(new_draft("Birthday")).await });
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    h.hook.set_active_event(seeded_event("1", "Standup"));
    let saved = pending.await.expect("join").expect("save");

    assert_eq!(h.hook.events(), vec![seeded_event("1", "Standup"), saved]);
    assert_eq!(
        h.hook.active_event(),
        Some(EventDraft::from(seeded_event("1", "Standup")))
    );
}
