//! Invitation workflow scenarios
//!
//! Drives the notification engine together with the join engine over the
//! in-memory store and mock email service: idempotent invite creation,
//! recipient-only authorization, and best-effort email delivery.

use std::sync::Arc;

use uuid::Uuid;

use kudos_email::mock::MockEmailService;
use kudos_email::EmailService;
use kudos_leagues::{
    GroupRef, League, LeagueType, MemoryStore, MembershipStore, NotificationEngine,
    NotificationKind, User,
};

struct Workflow {
    store: MemoryStore,
    email: Arc<MockEmailService>,
    engine: NotificationEngine,
}

fn workflow() -> Workflow {
    let store = MemoryStore::new();
    let email = Arc::new(MockEmailService::new());
    let engine = NotificationEngine::new(
        Arc::new(store.clone()),
        email.clone() as Arc<dyn EmailService>,
    );
    Workflow {
        store,
        email,
        engine,
    }
}

async fn seed_league(store: &MemoryStore) -> League {
    let league = League::new("Spring Steps".to_string(), LeagueType::Private, None, None).unwrap();
    store.insert_league(&league).await.unwrap();
    league
}

fn group(league: &League) -> GroupRef {
    GroupRef {
        id: league.id,
        name: league.name.clone(),
    }
}

#[tokio::test]
async fn test_invite_confirm_workflow() {
    let wf = workflow();
    let league = seed_league(&wf.store).await;

    let invitee = Uuid::new_v4();
    let mut profile = User::new(invitee);
    profile.email = Some("invitee@example.com".to_string());
    wf.store.insert_user(&profile).await.unwrap();

    // Moderator sends the invite: one live notification, one email
    wf.engine
        .invite_users(
            NotificationKind::IndLeagueInvite,
            group(&league),
            &[invitee],
            None,
            Some("Join our spring league!".to_string()),
            "Ana",
        )
        .await
        .unwrap();

    let live = wf.store.live_notifications_for_user(invitee).await.unwrap();
    assert_eq!(live.len(), 1);
    assert!(wf.email.was_invitation_sent_to("invitee@example.com"));

    // Invitee confirms: joins the league; redemption is the route layer's
    // job, so the engine leaves the notification pending
    let notification = &live[0];
    wf.engine
        .handle(invitee, notification, true, None)
        .await
        .unwrap();

    let league = wf.store.league(league.id).await.unwrap().unwrap();
    assert!(league.members.is_active(invitee));

    let still_live = wf.store.live_notifications_for_user(invitee).await.unwrap();
    assert_eq!(still_live.len(), 1);

    wf.store
        .mark_redeemed(notification.id, chrono::Utc::now())
        .await
        .unwrap();
    assert!(wf
        .store
        .live_notifications_for_user(invitee)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_reinvite_before_redemption_is_idempotent() {
    let wf = workflow();
    let league = seed_league(&wf.store).await;
    let invitee = Uuid::new_v4();

    for message in ["first nudge", "second nudge"] {
        wf.engine
            .invite_users(
                NotificationKind::IndLeagueInvite,
                group(&league),
                &[invitee],
                None,
                Some(message.to_string()),
                "Ana",
            )
            .await
            .unwrap();
    }

    let live = wf.store.live_notifications_for_user(invitee).await.unwrap();
    assert_eq!(live.len(), 1, "re-invite must replace the pending invite");
    assert_eq!(live[0].messages, vec!["second nudge".to_string()]);
}

#[tokio::test]
async fn test_only_the_recipient_can_act() {
    let wf = workflow();
    let league = seed_league(&wf.store).await;
    let invitee = Uuid::new_v4();
    let stranger = Uuid::new_v4();

    wf.engine
        .invite_users(
            NotificationKind::IndLeagueInvite,
            group(&league),
            &[invitee],
            None,
            None,
            "Ana",
        )
        .await
        .unwrap();

    let live = wf.store.live_notifications_for_user(invitee).await.unwrap();
    let err = wf
        .engine
        .handle(stranger, &live[0], true, None)
        .await
        .unwrap_err();
    assert!(matches!(err, kudos_common::Error::Forbidden(_)));

    // Nothing changed: no membership, notification still pending
    let league = wf.store.league(league.id).await.unwrap().unwrap();
    assert!(league.members.is_empty());
    assert_eq!(
        wf.store
            .live_notifications_for_user(invitee)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_rejecting_records_declined_membership() {
    let wf = workflow();
    let league = seed_league(&wf.store).await;
    let invitee = Uuid::new_v4();

    wf.engine
        .invite_users(
            NotificationKind::IndLeagueInvite,
            group(&league),
            &[invitee],
            None,
            None,
            "Ana",
        )
        .await
        .unwrap();

    let live = wf.store.live_notifications_for_user(invitee).await.unwrap();
    wf.engine
        .handle(invitee, &live[0], false, None)
        .await
        .unwrap();

    // Rejection still writes the membership entry, activated but inactive
    let league = wf.store.league(league.id).await.unwrap().unwrap();
    assert!(league.members.is_activated(invitee));
    assert!(!league.members.is_active(invitee));
}
