//! Integration tests for moderator override reactions and
//! cross-community ban notices.

mod common;

use common::{FakeGateway, make_member, policy};
use gatewarden::config::EngineConfig;
use gatewarden::db::Database;
use gatewarden::platform::{CommunityId, Permissions, RoleId, UserId};
use gatewarden::{BanNotice, OverrideSignal, ValidationEngine};
use std::sync::Arc;

async fn engine_with(gateway: Arc<FakeGateway>) -> ValidationEngine {
    common::init_tracing();
    let db = Database::new(":memory:").await.expect("in-memory db");
    ValidationEngine::new(EngineConfig::default(), gateway, db)
        .await
        .expect("engine construction")
}

fn seed(gateway: &FakeGateway) {
    gateway.add_community(1, "testers", 200);
    gateway.add_member(make_member(1, 20, "moderator_mary"));
    gateway.add_member(make_member(1, 21, "pending_user"));
}

#[tokio::test]
async fn test_unauthorized_reaction_is_silently_ignored() {
    let gateway = Arc::new(FakeGateway::new());
    seed(&gateway);
    // Reactor 20 has no permissions at all.

    let engine = engine_with(gateway.clone()).await;
    engine
        .handle_override_reaction(
            CommunityId(1),
            UserId(20),
            UserId(21),
            OverrideSignal::Kick,
            &policy(7),
        )
        .await
        .unwrap();

    assert!(gateway.kicked().is_empty());
    assert!(gateway.modlog().is_empty());
}

#[tokio::test]
async fn test_kick_by_reaction_cites_the_moderator() {
    let gateway = Arc::new(FakeGateway::new());
    seed(&gateway);
    gateway.set_member_permissions(
        1,
        20,
        Permissions {
            manage_roles: false,
            kick_members: true,
            ban_members: false,
        },
    );

    let engine = engine_with(gateway.clone()).await;
    engine
        .handle_override_reaction(
            CommunityId(1),
            UserId(20),
            UserId(21),
            OverrideSignal::Kick,
            &policy(7),
        )
        .await
        .unwrap();

    let kicked = gateway.kicked();
    assert_eq!(kicked.len(), 1);
    assert_eq!(kicked[0].1, UserId(21));
    assert!(kicked[0].2.contains("moderator_mary"));

    let modlog = gateway.modlog();
    assert_eq!(modlog.len(), 1);
    assert!(modlog[0].2.contains("kicked"));
    assert!(modlog[0].2.contains("pending_user"));
}

#[tokio::test]
async fn test_approve_by_reaction_grants_trust_role() {
    let gateway = Arc::new(FakeGateway::new());
    seed(&gateway);
    gateway.set_member_permissions(
        1,
        20,
        Permissions {
            manage_roles: true,
            kick_members: false,
            ban_members: false,
        },
    );

    let engine = engine_with(gateway.clone()).await;
    engine
        .handle_override_reaction(
            CommunityId(1),
            UserId(20),
            UserId(21),
            OverrideSignal::Approve,
            &policy(7),
        )
        .await
        .unwrap();

    let grants = gateway.role_grants();
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].1, UserId(21));
    assert_eq!(grants[0].2, RoleId(7));

    let modlog = gateway.modlog();
    assert_eq!(modlog.len(), 1);
    assert!(modlog[0].2.contains("manually verified"));
    assert!(modlog[0].2.contains("moderator_mary"));
}

#[tokio::test]
async fn test_ban_failure_posts_a_note_instead_of_failing() {
    let gateway = Arc::new(FakeGateway::new());
    seed(&gateway);
    gateway.set_member_permissions(
        1,
        20,
        Permissions {
            manage_roles: false,
            kick_members: false,
            ban_members: true,
        },
    );
    // The moderator may ban, but the deployment itself cannot.
    gateway.set_self_permissions(
        1,
        Permissions {
            manage_roles: true,
            kick_members: true,
            ban_members: false,
        },
    );

    let engine = engine_with(gateway.clone()).await;
    engine
        .handle_override_reaction(
            CommunityId(1),
            UserId(20),
            UserId(21),
            OverrideSignal::Ban,
            &policy(7),
        )
        .await
        .unwrap();

    assert!(gateway.banned().is_empty());
    let modlog = gateway.modlog();
    assert_eq!(modlog.len(), 1);
    assert!(modlog[0].2.contains("Attempted to ban"));
}

#[tokio::test]
async fn test_unresolvable_target_drops_the_signal() {
    let gateway = Arc::new(FakeGateway::new());
    seed(&gateway);
    gateway.set_member_permissions(
        1,
        20,
        Permissions {
            manage_roles: true,
            kick_members: true,
            ban_members: true,
        },
    );

    let engine = engine_with(gateway.clone()).await;
    engine
        .handle_override_reaction(
            CommunityId(1),
            UserId(20),
            UserId(404),
            OverrideSignal::Kick,
            &policy(7),
        )
        .await
        .unwrap();

    assert!(gateway.kicked().is_empty());
    assert!(gateway.modlog().is_empty());
}

#[tokio::test]
async fn test_self_reaction_is_ignored() {
    let gateway = Arc::new(FakeGateway::new());
    seed(&gateway);
    // UserId(1) is the deployment's own account in the fake.

    let engine = engine_with(gateway.clone()).await;
    engine
        .handle_override_reaction(
            CommunityId(1),
            UserId(1),
            UserId(21),
            OverrideSignal::Kick,
            &policy(7),
        )
        .await
        .unwrap();

    assert!(gateway.kicked().is_empty());
}

#[tokio::test]
async fn test_repeated_reactions_each_fire() {
    let gateway = Arc::new(FakeGateway::new());
    seed(&gateway);
    gateway.set_member_permissions(
        1,
        20,
        Permissions {
            manage_roles: true,
            kick_members: true,
            ban_members: true,
        },
    );

    let engine = engine_with(gateway.clone()).await;
    // Approve, then approve again: no single-fire guard.
    for _ in 0..2 {
        engine
            .handle_override_reaction(
                CommunityId(1),
                UserId(20),
                UserId(21),
                OverrideSignal::Approve,
                &policy(7),
            )
            .await
            .unwrap();
    }

    // The second grant is a no-op (role already held) but both
    // reactions produced audit notes.
    assert_eq!(gateway.modlog().len(), 2);
}

#[tokio::test]
async fn test_ban_notice_reaches_shared_communities_only() {
    let gateway = Arc::new(FakeGateway::new());
    gateway.add_community(1, "shared", 200);
    gateway.add_community(2, "not-shared", 200);
    gateway.add_member(make_member(1, 30, "wanderer"));

    let engine = engine_with(gateway.clone()).await;
    engine
        .report_ban(&BanNotice {
            user: UserId(30),
            username: "wanderer".to_string(),
            reason: Some("raiding".to_string()),
        })
        .await
        .unwrap();

    let modlog = gateway.modlog();
    assert_eq!(modlog.len(), 1);
    assert_eq!(modlog[0].1, CommunityId(1));
    assert!(modlog[0].2.contains("raiding"));
}
