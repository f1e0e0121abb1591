use dashboard_core::{BackgroundTaskLog, Contact, JobApplication};

#[test]
fn application_decodes_with_missing_optional_fields() {
    let raw = r#"{"id": 12, "status": "prepared", "job_id": 4, "user_id": 1,
                  "created_at": "2025-02-01T10:00:00"}"#;
    let app: JobApplication = serde_json::from_str(raw).expect("decode");

    assert_eq!(app.id, 12);
    assert_eq!(app.status, "prepared");
    assert_eq!(app.resume_id, None);
    assert_eq!(app.notes, None);
}

#[test]
fn log_accepts_naive_backend_timestamp() {
    let raw = r#"{"id": 1, "action_type": "cold_mail", "status": "running",
                  "message": null, "created_at": "2025-02-01T10:00:00.123456"}"#;
    let log: BackgroundTaskLog = serde_json::from_str(raw).expect("decode");

    assert!(log.is_running());
    assert_eq!(log.created_at.to_rfc3339(), "2025-02-01T10:00:00.123456+00:00");
}

#[test]
fn contact_requires_email() {
    let raw = r#"{"id": 3, "name": "No Mail"}"#;
    assert!(serde_json::from_str::<Contact>(raw).is_err());
}
