use std::sync::Arc;

use chrono::NaiveDate;
use taskwave::memory::{MailKind, MemoryAuth, MemoryStore};
use taskwave::{
    AuthError, Route, SignupRequest, SyncOutcome, TaskDraft, TaskError, TaskFilter, TaskId,
    TaskRecord, TaskWave, RemoteTimestamp, RESET_EMAIL_SENT, VERIFICATION_EMAIL_SENT,
};

fn new_app() -> (TaskWave, Arc<MemoryAuth>, Arc<MemoryStore>) {
    let auth = Arc::new(MemoryAuth::new());
    let store = Arc::new(MemoryStore::new());
    let app = TaskWave::builder(auth.clone(), store.clone()).build();
    (app, auth, store)
}

async fn signed_in_app() -> (TaskWave, Arc<MemoryAuth>, Arc<MemoryStore>) {
    let (mut app, auth, store) = new_app();
    app.sign_up(SignupRequest::new("me@example.com", "hunter2", "hunter2"))
        .await
        .expect("signup");
    auth.mark_verified("me@example.com");
    app.sign_in("me@example.com", "hunter2").await.expect("login");
    (app, auth, store)
}

#[tokio::test]
async fn test_signup_sends_verification_email_and_notice() {
    let (app, auth, _store) = new_app();

    let receipt = app
        .sign_up(SignupRequest::new("me@example.com", "hunter2", "hunter2"))
        .await
        .expect("signup");

    assert_eq!(receipt.notice, VERIFICATION_EMAIL_SENT);
    let mail = auth.sent_mail();
    assert_eq!(mail.len(), 1);
    assert_eq!(mail[0].to, "me@example.com");
    assert_eq!(mail[0].kind, MailKind::Verification);
    // Signup never establishes a session; the user goes back to login.
    assert!(app.session().is_none());
}

#[tokio::test]
async fn test_signup_rejects_mismatched_passwords_before_the_gateway() {
    let (app, auth, _store) = new_app();

    let err = app
        .sign_up(SignupRequest::new("me@example.com", "hunter2", "hunter3"))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::PasswordMismatch));
    assert!(auth.sent_mail().is_empty());
}

#[tokio::test]
async fn test_unverified_login_never_reaches_the_dashboard() {
    let (mut app, _auth, _store) = new_app();
    app.sign_up(SignupRequest::new("me@example.com", "hunter2", "hunter2"))
        .await
        .expect("signup");

    let err = app.sign_in("me@example.com", "hunter2").await.unwrap_err();

    assert!(matches!(err, AuthError::EmailNotVerified));
    assert_eq!(err.to_string(), "Please verify your email before logging in.");
    assert!(app.session().is_none());
    assert_eq!(app.resolve(Route::Dashboard), Route::Login);
}

#[tokio::test]
async fn test_verified_login_reaches_the_dashboard() {
    let (app, _auth, _store) = signed_in_app().await;

    assert!(app.session().is_some());
    assert_eq!(app.resolve(Route::Dashboard), Route::Dashboard);
    assert_eq!(
        app.resolve(Route::TaskDetail(TaskId::from("abc"))),
        Route::TaskDetail(TaskId::from("abc"))
    );
}

#[tokio::test]
async fn test_wrong_password_is_invalid_credentials() {
    let (mut app, auth, _store) = new_app();
    app.sign_up(SignupRequest::new("me@example.com", "hunter2", "hunter2"))
        .await
        .expect("signup");
    auth.mark_verified("me@example.com");

    let err = app.sign_in("me@example.com", "wrong").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn test_buy_milk_scenario() {
    let (mut app, _auth, _store) = signed_in_app().await;

    assert!(app.tasks().tasks().is_empty());
    let task = app
        .tasks()
        .create(TaskDraft::new("Buy milk"))
        .expect("create");

    let list = app.tasks().tasks();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].title, "Buy milk");
    assert!(!list[0].completed);
    assert!(list[0].created_at.is_some());

    assert!(app.tasks().toggle(&task.id).expect("first toggle"));
    assert!(!app.tasks().toggle(&task.id).expect("second toggle"));
    assert_eq!(app.tasks().tasks()[0].completed_at, None);
}

#[tokio::test]
async fn test_load_is_authoritative_and_newest_first() {
    let (mut app, _auth, _store) = signed_in_app().await;
    let mut rx = app.tasks().sync_rx();

    let mut temp_ids: Vec<TaskId> = Vec::new();
    for title in ["First", "Second", "Third"] {
        temp_ids.push(app.tasks().create(TaskDraft::new(title)).expect("create").id);
        let report = rx.recv().await.expect("create report");
        assert_eq!(report.outcome, SyncOutcome::Committed);
        // Keep server creation stamps strictly ordered.
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let loaded: Vec<_> = app
        .tasks()
        .load()
        .await
        .expect("load")
        .iter()
        .cloned()
        .collect();

    assert_eq!(loaded.len(), 3);
    // Newest first, per server creation time.
    let titles: Vec<_> = loaded.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["Third", "Second", "First"]);
    // The store re-keyed every record: the temporary creation ids are gone.
    for task in &loaded {
        assert!(!temp_ids.contains(&task.id));
    }
}

#[tokio::test]
async fn test_load_normalizes_mixed_timestamp_forms_and_sorts() {
    let (mut app, _auth, store) = signed_in_app().await;
    let user = app.session().expect("session").user.clone();

    let record = |title: &str, created_at: Option<RemoteTimestamp>| TaskRecord {
        title: title.to_string(),
        description: String::new(),
        due_date: None,
        completed: false,
        created_at,
        updated_at: None,
        completed_at: None,
    };
    store.seed_document(
        &user,
        record("iso", Some(RemoteTimestamp::Iso("2024-01-02T00:00:00Z".into()))),
    );
    store.seed_document(
        &user,
        record(
            "native",
            Some(RemoteTimestamp::Native {
                seconds: 1_704_412_800, // 2024-01-05
                nanos: 0,
            }),
        ),
    );
    store.seed_document(&user, record("undated", None));

    app.tasks().load().await.expect("load");
    let titles: Vec<_> = app.tasks().tasks().iter().map(|t| t.title.as_str()).collect();

    // Both wire forms normalize and order together; the record with no
    // creation time sorts last.
    assert_eq!(titles, vec!["native", "iso", "undated"]);
    assert!(app.tasks().tasks()[0].created_at.is_some());
    assert_eq!(app.tasks().tasks()[2].created_at, None);
}

#[tokio::test]
async fn test_load_ties_preserve_store_order() {
    let (mut app, _auth, store) = signed_in_app().await;
    let user = app.session().expect("session").user.clone();

    let same_instant = RemoteTimestamp::Native {
        seconds: 1_700_000_000,
        nanos: 0,
    };
    for title in ["one", "two", "three"] {
        store.seed_document(
            &user,
            TaskRecord {
                title: title.to_string(),
                description: String::new(),
                due_date: None,
                completed: false,
                created_at: Some(same_instant.clone()),
                updated_at: None,
                completed_at: None,
            },
        );
    }

    app.tasks().load().await.expect("load");
    let titles: Vec<_> = app.tasks().tasks().iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["one", "two", "three"]);
}

#[tokio::test]
async fn test_full_edit_round_trip() {
    let (mut app, _auth, _store) = signed_in_app().await;
    let mut rx = app.tasks().sync_rx();
    app.tasks()
        .create(TaskDraft::new("Draft title"))
        .expect("create");
    rx.recv().await.expect("create report");
    app.tasks().load().await.expect("load");

    let mut task = app.tasks().tasks()[0].clone();
    task.title = "Final title".to_string();
    task.description = "now with details".to_string();
    task.due_date = NaiveDate::from_ymd_opt(2026, 9, 1);
    task.completed = true;
    app.tasks().update(task.clone()).await.expect("update");

    // The detail read-through sees what was written, server-stamped.
    let fetched = app
        .tasks()
        .fetch(&task.id)
        .await
        .expect("fetch")
        .expect("task exists");
    assert_eq!(fetched.title, "Final title");
    assert_eq!(fetched.description, "now with details");
    assert_eq!(fetched.due_date, NaiveDate::from_ymd_opt(2026, 9, 1));
    assert!(fetched.completed);
    assert!(fetched.completed_at.is_some());
    assert!(fetched.updated_at.is_some());

    // And the in-memory record was refreshed too.
    assert_eq!(app.tasks().tasks()[0].title, "Final title");
    assert!(app.tasks().tasks()[0].completed);
}

#[tokio::test]
async fn test_fetch_missing_task_is_none() {
    let (mut app, _auth, _store) = signed_in_app().await;
    let found = app
        .tasks()
        .fetch(&TaskId::from("nope"))
        .await
        .expect("fetch");
    assert!(found.is_none());
}

#[tokio::test]
async fn test_filter_counts_on_a_mixed_list() {
    let (mut app, _auth, _store) = signed_in_app().await;
    let a = app.tasks().create(TaskDraft::new("a")).expect("create");
    app.tasks().create(TaskDraft::new("b")).expect("create");
    let c = app.tasks().create(TaskDraft::new("c")).expect("create");
    app.tasks().toggle(&a.id).expect("toggle");
    app.tasks().toggle(&c.id).expect("toggle");

    assert_eq!(app.tasks().filter(TaskFilter::All).len(), 3);
    assert_eq!(app.tasks().filter(TaskFilter::Pending).len(), 1);
    assert_eq!(app.tasks().filter(TaskFilter::Completed).len(), 2);
    assert_eq!(app.tasks().completed_count(), 2);
}

#[tokio::test]
async fn test_sign_out_clears_session_and_list() {
    let (mut app, _auth, _store) = signed_in_app().await;
    app.tasks().create(TaskDraft::new("private")).expect("create");

    app.sign_out().await.expect("sign out");

    assert!(app.session().is_none());
    assert!(app.tasks_ref().tasks().is_empty());
    assert_eq!(app.resolve(Route::Dashboard), Route::Login);
    assert!(matches!(
        app.tasks().load().await,
        Err(TaskError::NoSession)
    ));
}

#[tokio::test]
async fn test_password_reset_flow() {
    let (app, auth, _store) = new_app();

    let err = app
        .request_password_reset("stranger@example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::UnknownEmail));

    app.sign_up(SignupRequest::new("me@example.com", "hunter2", "hunter2"))
        .await
        .expect("signup");
    let receipt = app
        .request_password_reset("me@example.com")
        .await
        .expect("reset");

    assert_eq!(receipt.notice, RESET_EMAIL_SENT);
    let mail = auth.sent_mail();
    assert_eq!(mail.last().map(|m| m.kind), Some(MailKind::PasswordReset));
}
