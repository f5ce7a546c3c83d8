mod common;

use common::{create_developer, create_staff, setup, RecordingNotifier};

use entity::developer;
use stormlink_service::ops::submission::{submit_manager, ManagerSubmission, ParcelSubmission};
use stormlink_service::ops::{developers, managers, RetrofitFlags};
use stormlink_service::ApiError;

fn submission(email: &str, parcels: Vec<(i64, &str)>, developer_ids: Vec<i64>) -> ManagerSubmission {
    ManagerSubmission {
        name: "Riverside Holdings".to_string(),
        email: email.to_string(),
        phone: Some("215-555-0123".to_string()),
        prefer_email: Some(true),
        prefer_phone: None,
        parcels: parcels
            .into_iter()
            .map(|(parcel_id, address)| ParcelSubmission {
                parcel_id,
                address: address.to_string(),
                building_type: String::new(),
            })
            .collect(),
        selected_developers: developer_ids,
        retrofits: RetrofitFlags::default(),
        note: String::new(),
        accepts_contacts: true,
    }
}

#[tokio::test]
async fn status_transitions_keep_timestamps_mutually_exclusive() {
    let (db, _config) = setup().await;
    let staff = create_staff(&db, "staff@example.com").await;
    let dev = create_developer(&db, "Applicant", "applicant@example.com").await;

    let denied = developers::set_developer_status(
        &db,
        &staff.email,
        dev.id,
        developer::STATUS_DENIED,
        Some("Missing license".to_string()),
    )
    .await
    .unwrap();
    assert_eq!(denied.status, developer::STATUS_DENIED);
    assert!(denied.denied_at.is_some());
    assert!(denied.approved_at.is_none());
    assert!(denied.deactivated_at.is_none());
    assert_eq!(denied.reason_for_denial, "Missing license");

    let approved = developers::set_developer_status(
        &db,
        &staff.email,
        dev.id,
        developer::STATUS_ACTIVE,
        None,
    )
    .await
    .unwrap();
    assert!(approved.approved_at.is_some());
    assert!(approved.denied_at.is_none());
    assert_eq!(approved.reason_for_denial, "");

    let deactivated = developers::set_developer_status(
        &db,
        &staff.email,
        dev.id,
        developer::STATUS_DEACTIVATED,
        None,
    )
    .await
    .unwrap();
    assert!(deactivated.deactivated_at.is_some());
    assert!(deactivated.approved_at.is_none());
    assert!(deactivated.denied_at.is_none());
}

#[tokio::test]
async fn status_transitions_are_staff_only_and_validated() {
    let (db, _config) = setup().await;
    let outsider = create_developer(&db, "Outsider", "outsider@example.com").await;
    let staff = create_staff(&db, "staff@example.com").await;
    let dev = create_developer(&db, "Applicant", "applicant@example.com").await;

    let err = developers::set_developer_status(
        &db,
        &outsider.email,
        dev.id,
        developer::STATUS_ACTIVE,
        None,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::Permission));

    let err =
        developers::set_developer_status(&db, "nobody@example.com", dev.id, developer::STATUS_ACTIVE, None)
            .await
            .unwrap_err();
    assert!(matches!(err, ApiError::Permission));

    let err = developers::set_developer_status(&db, &staff.email, dev.id, 42, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}

#[tokio::test]
async fn staff_removal_is_silent_cleanup() {
    let (db, config) = setup().await;
    let notifier = RecordingNotifier::new();
    let staff = create_staff(&db, "staff@example.com").await;
    let dev = create_developer(&db, "Quiet", "quiet@example.com").await;

    let mgr = submit_manager(
        &db,
        &config,
        &notifier,
        submission(
            "owner@example.com",
            vec![(1, "1 A St"), (2, "2 B St")],
            vec![dev.id],
        ),
    )
    .await
    .unwrap();
    notifier.take();

    developers::staff_remove_developer_customer_parcels(&db, &staff.email, dev.id, mgr.id)
        .await
        .unwrap();

    assert!(notifier.take().is_empty());
    assert!(developers::interested(&db, dev.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn manager_scoped_removal_notifies_per_parcel() {
    let (db, config) = setup().await;
    let notifier = RecordingNotifier::new();
    let staff = create_staff(&db, "staff@example.com").await;
    let dev = create_developer(&db, "Notified", "notified@example.com").await;

    let mgr = submit_manager(
        &db,
        &config,
        &notifier,
        submission(
            "owner@example.com",
            vec![(1, "1 A St"), (2, "2 B St")],
            vec![dev.id],
        ),
    )
    .await
    .unwrap();
    notifier.take();

    managers::remove_developer_from_manager_parcels(
        &db, &config, &notifier, &staff.email, mgr.id, dev.id,
    )
    .await
    .unwrap();

    assert_eq!(notifier.count("developer_unsubscribe"), 2);
    assert!(developers::interested(&db, dev.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn self_service_removal_is_idempotent() {
    let (db, config) = setup().await;
    let notifier = RecordingNotifier::new();
    let dev = create_developer(&db, "Selfserve", "selfserve@example.com").await;

    submit_manager(
        &db,
        &config,
        &notifier,
        submission("owner@example.com", vec![(5, "5 E St")], vec![dev.id]),
    )
    .await
    .unwrap();
    notifier.take();

    developers::remove_developer_from_parcel(&db, &config, &notifier, 5, dev.id)
        .await
        .unwrap();
    assert_eq!(notifier.count("developer_unsubscribe"), 1);
    notifier.take();

    // Already absent: success, and no further notification.
    developers::remove_developer_from_parcel(&db, &config, &notifier, 5, dev.id)
        .await
        .unwrap();
    assert!(notifier.take().is_empty());
}

#[tokio::test]
async fn saved_parcels_stay_sorted_and_idempotent() {
    let (db, _config) = setup().await;
    let dev = create_developer(&db, "Collector", "collector@example.com").await;

    let ids = developers::save_parcel(&db, dev.id, "10").await.unwrap();
    assert_eq!(ids, vec![10]);

    let ids = developers::save_parcel(&db, dev.id, "3").await.unwrap();
    assert_eq!(ids, vec![3, 10]);

    // Duplicate add is a no-op, not an error.
    let ids = developers::save_parcel(&db, dev.id, "10").await.unwrap();
    assert_eq!(ids, vec![3, 10]);

    // Removing an id that was never saved is success.
    let ids = developers::unsave_parcel(&db, dev.id, "99").await.unwrap();
    assert_eq!(ids, vec![3, 10]);

    let ids = developers::unsave_parcel(&db, dev.id, "3").await.unwrap();
    assert_eq!(ids, vec![10]);

    // The list survives a round trip through the store.
    assert_eq!(developers::saved_parcels(&db, dev.id).await.unwrap(), vec![10]);

    let err = developers::save_parcel(&db, dev.id, "not-a-number")
        .await
        .unwrap_err();
    match err {
        ApiError::Validation(message) => assert_eq!(message, "Parcel ID must be an integer"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn interested_gates_contact_channels_by_preference() {
    let (db, config) = setup().await;
    let notifier = RecordingNotifier::new();
    let dev = create_developer(&db, "Curious", "curious@example.com").await;

    // prefer_email only: phone stays hidden.
    submit_manager(
        &db,
        &config,
        &notifier,
        submission("owner@example.com", vec![(40, "40 View St")], vec![dev.id]),
    )
    .await
    .unwrap();

    let interested = developers::interested(&db, dev.id).await.unwrap();
    assert_eq!(interested.len(), 1);
    assert_eq!(interested[0].parcel_id, 40);
    assert_eq!(interested[0].contact_name, "Riverside Holdings");
    assert_eq!(
        interested[0].contact_email.as_deref(),
        Some("owner@example.com")
    );
    assert_eq!(interested[0].contact_phone, None);
}

#[tokio::test]
async fn enrolled_lists_every_parcel_with_contact_gate() {
    let (db, config) = setup().await;
    let notifier = RecordingNotifier::new();

    let mut s = submission(
        "owner@example.com",
        vec![(50, "50 Open St"), (51, "51 Open St")],
        vec![],
    );
    s.accepts_contacts = false;
    submit_manager(&db, &config, &notifier, s).await.unwrap();

    let enrolled = developers::enrolled(&db).await.unwrap();
    assert_eq!(enrolled.len(), 2);
    assert!(enrolled.iter().all(|p| !p.accepts_contacts));
}
