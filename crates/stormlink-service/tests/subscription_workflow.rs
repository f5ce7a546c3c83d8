mod common;

use common::{create_developer, setup, RecordingNotifier};

use stormlink_service::notify::Notification;
use stormlink_service::ops::parcels::{self, CreateParcelRequest};
use stormlink_service::ops::preferences::{self, UpdateParcelRequest};
use stormlink_service::ops::submission::{submit_manager, ManagerSubmission, ParcelSubmission};
use stormlink_service::ops::{managers, RetrofitFlags};
use stormlink_service::ApiError;

fn submission(email: &str, parcels: Vec<ParcelSubmission>, developers: Vec<i64>) -> ManagerSubmission {
    ManagerSubmission {
        name: "Acme Properties".to_string(),
        email: email.to_string(),
        phone: Some("215-555-0199".to_string()),
        prefer_email: Some(true),
        prefer_phone: None,
        parcels,
        selected_developers: developers,
        retrofits: RetrofitFlags {
            rain_garden: true,
            cistern: true,
            ..RetrofitFlags::default()
        },
        note: "South-facing roof".to_string(),
        accepts_contacts: true,
    }
}

fn parcel(parcel_id: i64, address: &str) -> ParcelSubmission {
    ParcelSubmission {
        parcel_id,
        address: address.to_string(),
        building_type: "warehouse".to_string(),
    }
}

#[tokio::test]
async fn submission_then_token_update_dispatches_expected_events() {
    let (db, config) = setup().await;
    let notifier = RecordingNotifier::new();

    let d1 = create_developer(&db, "Raincatch", "d1@example.com").await;
    let d2 = create_developer(&db, "Greenworks", "d2@example.com").await;

    let mgr = submit_manager(
        &db,
        &config,
        &notifier,
        submission(
            "owner@example.com",
            vec![parcel(100, "1 First St"), parcel(200, "2 Second St")],
            vec![d1.id, d2.id],
        ),
    )
    .await
    .expect("submission succeeds");

    assert_eq!(notifier.count("manager_confirmation"), 1);
    assert_eq!(notifier.count("developer_subscribe"), 4);

    let sent = notifier.take();
    let confirmation = sent
        .iter()
        .find(|n| n.kind() == "manager_confirmation")
        .expect("confirmation present");
    match confirmation {
        Notification::ManagerConfirmation {
            parcel_addresses,
            developers,
            preferences_url,
            selected_retrofits,
            ..
        } => {
            assert!(parcel_addresses.contains("1 First St"));
            assert!(parcel_addresses.contains("2 Second St"));
            assert_eq!(developers.len(), 2);
            assert!(preferences_url.contains(&mgr.unsubscribe_token));
            assert_eq!(selected_retrofits, "Rain Garden, Cistern");
        }
        _ => unreachable!(),
    }

    // Update the first parcel via the token, keeping only d2: exactly one
    // unsubscribe (d1) and no subscribe (d2 was already selected).
    let token = Some(mgr.unsubscribe_token.as_str());
    let views = preferences::preferences_parcels(&db, token)
        .await
        .expect("token lists parcels");
    let p1 = views.iter().find(|v| v.parcel_id == 100).unwrap();

    let updated = preferences::update_parcel_preferences(
        &db,
        &config,
        &notifier,
        token,
        UpdateParcelRequest {
            id: p1.id,
            selected_developers: vec![d2.id],
            retrofits: p1.retrofits,
            accepts_contacts: true,
        },
    )
    .await
    .expect("update succeeds");

    assert_eq!(updated.selected_developers, vec![d2.id]);
    assert_eq!(notifier.count("developer_unsubscribe"), 1);
    assert_eq!(notifier.count("developer_subscribe"), 0);

    let sent = notifier.take();
    match sent
        .iter()
        .find(|n| n.kind() == "developer_unsubscribe")
        .unwrap()
    {
        Notification::DeveloperUnsubscribe {
            developer, address, ..
        } => {
            assert_eq!(developer.email, "d1@example.com");
            assert_eq!(address, "1 First St");
        }
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn conflicting_submission_names_addresses_but_keeps_fresh_parcels() {
    let (db, config) = setup().await;
    let notifier = RecordingNotifier::new();

    submit_manager(
        &db,
        &config,
        &notifier,
        submission("first@example.com", vec![parcel(100, "1 Claimed St")], vec![]),
    )
    .await
    .expect("first claim succeeds");
    notifier.take();

    let err = submit_manager(
        &db,
        &config,
        &notifier,
        submission(
            "second@example.com",
            vec![parcel(100, "1 Claimed St"), parcel(300, "3 Fresh St")],
            vec![],
        ),
    )
    .await
    .expect_err("conflicting submission fails");

    match err {
        ApiError::ParcelsAlreadyClaimed(messages) => {
            assert_eq!(
                messages,
                vec!["Parcel at 1 Claimed St already submitted".to_string()]
            );
        }
        other => panic!("unexpected error: {other}"),
    }

    // Documented partial success: the non-conflicting parcel was inserted
    // for the second manager despite the error.
    let all = parcels::list_parcels(&db).await.unwrap();
    assert!(all.iter().any(|p| p.parcel_id == 300));
    assert_eq!(all.len(), 2);

    // And the failed submission sent nothing.
    assert!(notifier.take().is_empty());
}

#[tokio::test]
async fn repeat_submission_upserts_manager_by_email() {
    let (db, config) = setup().await;
    let notifier = RecordingNotifier::new();

    let first = submit_manager(
        &db,
        &config,
        &notifier,
        submission("repeat@example.com", vec![parcel(10, "10 Elm St")], vec![]),
    )
    .await
    .unwrap();

    let mut second_submission =
        submission("repeat@example.com", vec![parcel(11, "11 Elm St")], vec![]);
    second_submission.phone = Some("215-555-0777".to_string());

    let second = submit_manager(&db, &config, &notifier, second_submission)
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.phone, "215-555-0777");
    assert_eq!(second.unsubscribe_token, first.unsubscribe_token);

    let summary = managers::manager_summary(&db, first.id).await.unwrap();
    assert_eq!(summary.parcels.len(), 2);
    assert!(summary.retrofits.rain_garden);
    assert!(!summary.retrofits.green_roof);
}

#[tokio::test]
async fn destroy_parcel_reports_developers_with_no_remaining_shared_parcel() {
    let (db, config) = setup().await;
    let notifier = RecordingNotifier::new();

    let d1 = create_developer(&db, "Shared", "shared@example.com").await;
    let d2 = create_developer(&db, "OnlyHere", "onlyhere@example.com").await;

    let mgr = submit_manager(
        &db,
        &config,
        &notifier,
        submission("owner@example.com", vec![parcel(1, "1 A St")], vec![d1.id, d2.id]),
    )
    .await
    .unwrap();

    // Second parcel shares only d1.
    parcels::create_parcel(
        &db,
        &config,
        &notifier,
        CreateParcelRequest {
            parcel_id: 2,
            manager_id: mgr.id,
            address: "2 B St".to_string(),
            building_type: String::new(),
            retrofits: RetrofitFlags::default(),
            selected_developers: vec![d1.id],
            note: String::new(),
            accepts_contacts: true,
        },
    )
    .await
    .unwrap();
    notifier.take();

    let views = parcels::list_parcels(&db).await.unwrap();
    let p1 = views.iter().find(|v| v.parcel_id == 1).unwrap();
    let p2 = views.iter().find(|v| v.parcel_id == 2).unwrap();

    // d1 is still selected on parcel 2, so only d2 is orphaned.
    let orphaned = parcels::destroy_parcel(&db, &config, &notifier, p1.id)
        .await
        .unwrap();
    assert_eq!(orphaned, vec![d2.id]);
    assert_eq!(notifier.count("developer_unsubscribe"), 2);
    notifier.take();

    // Deleting the last shared parcel orphans d1 too.
    let orphaned = parcels::destroy_parcel(&db, &config, &notifier, p2.id)
        .await
        .unwrap();
    assert_eq!(orphaned, vec![d1.id]);

    // Destroying a parcel that no longer exists is absorbed as success.
    let orphaned = parcels::destroy_parcel(&db, &config, &notifier, p2.id)
        .await
        .unwrap();
    assert!(orphaned.is_empty());
}

#[tokio::test]
async fn delete_manager_unsubscribes_and_cascades() {
    let (db, config) = setup().await;
    let notifier = RecordingNotifier::new();

    let d1 = create_developer(&db, "Watcher", "watcher@example.com").await;

    let mgr = submit_manager(
        &db,
        &config,
        &notifier,
        submission(
            "owner@example.com",
            vec![parcel(1, "1 A St"), parcel(2, "2 B St")],
            vec![d1.id],
        ),
    )
    .await
    .unwrap();
    notifier.take();

    managers::delete_manager(&db, &config, &notifier, mgr.id)
        .await
        .unwrap();

    assert_eq!(notifier.count("developer_unsubscribe"), 2);
    assert!(parcels::list_parcels(&db).await.unwrap().is_empty());

    // Deleting again is a no-op.
    managers::delete_manager(&db, &config, &notifier, mgr.id)
        .await
        .unwrap();
}

#[tokio::test]
async fn create_parcel_enforces_store_invariants() {
    let (db, config) = setup().await;
    let notifier = RecordingNotifier::new();

    let mgr = submit_manager(
        &db,
        &config,
        &notifier,
        submission("owner@example.com", vec![parcel(500, "5 High St")], vec![]),
    )
    .await
    .unwrap();

    let request = CreateParcelRequest {
        parcel_id: 500,
        manager_id: mgr.id,
        address: "5 High St".to_string(),
        building_type: String::new(),
        retrofits: RetrofitFlags::default(),
        selected_developers: vec![],
        note: String::new(),
        accepts_contacts: true,
    };

    // Duplicate external id anywhere in the store is a conflict.
    let err = parcels::create_parcel(&db, &config, &notifier, request.clone())
        .await
        .expect_err("duplicate parcel id");
    assert!(matches!(err, ApiError::Conflict(500)));

    // Unknown owning manager is rejected before anything is created.
    let err = parcels::create_parcel(
        &db,
        &config,
        &notifier,
        CreateParcelRequest {
            parcel_id: 501,
            manager_id: mgr.id + 999,
            ..request
        },
    )
    .await
    .expect_err("missing manager");
    assert!(matches!(err, ApiError::NotFound(_)));
}
