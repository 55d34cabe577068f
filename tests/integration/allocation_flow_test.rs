//! Team allocation end-to-end scenarios
//!
//! Exercises the join and switch engines together over the in-memory store:
//! first-fit fill order across sequential joins, and team destruction when
//! a sole member switches away.

use std::sync::Arc;

use uuid::Uuid;

use kudos_leagues::{
    JoinEngine, League, LeagueType, MemoryStore, MembershipStore, Panel, PanelRef, SwitchEngine,
    SwitchTarget,
};

async fn seed_group_league(store: &MemoryStore, panel_names: &[&str]) -> (League, Vec<Panel>) {
    let mut league =
        League::new("Spring Steps".to_string(), LeagueType::Corporate, Some(2), None).unwrap();

    let mut panels = Vec::new();
    for name in panel_names {
        let panel = Panel::new(name.to_string());
        league.panel.push(PanelRef { panel_id: panel.id });
        store.insert_panel(&panel).await.unwrap();
        panels.push(panel);
    }

    store.insert_league(&league).await.unwrap();
    (league, panels)
}

#[tokio::test]
async fn test_sequential_joins_fill_first_team_before_creating_second() {
    let store = MemoryStore::new();
    let (league, panels) = seed_group_league(&store, &["Engineering"]).await;
    let panel = &panels[0];
    let join = JoinEngine::new(Arc::new(store.clone()));

    let users: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
    for user in &users {
        join.join_group_league(*user, league.id, Some(panel.id), true)
            .await
            .unwrap();
    }

    let panel = store.panel(panel.id).await.unwrap().unwrap();
    let team_ids = panel.team_ids();
    assert_eq!(team_ids.len(), 2, "three joins into teamSize=2 make two teams");

    let team1 = store.team(team_ids[0]).await.unwrap().unwrap();
    let team2 = store.team(team_ids[1]).await.unwrap().unwrap();

    // First-fit: the first team fills to capacity before the second exists
    assert_eq!(team1.name, "Team 1 - Engineering");
    assert_eq!(team1.member_count, 2);
    assert!(team1.members.contains(users[0]));
    assert!(team1.members.contains(users[1]));

    assert_eq!(team2.name, "Team 2 - Engineering");
    assert_eq!(team2.member_count, 1);
    assert!(team2.members.contains(users[2]));

    // Every join also recorded league-level membership
    let league = store.league(league.id).await.unwrap().unwrap();
    for user in &users {
        assert!(league.members.is_active(*user));
    }
}

#[tokio::test]
async fn test_switching_away_as_sole_member_destroys_team_and_creates_new_one() {
    let store = MemoryStore::new();
    let (league, panels) = seed_group_league(&store, &["Engineering", "Sales"]).await;
    let join = JoinEngine::new(Arc::new(store.clone()));
    let switch = SwitchEngine::new(Arc::new(store.clone()));

    let user = Uuid::new_v4();
    join.join_group_league(user, league.id, Some(panels[0].id), true)
        .await
        .unwrap();

    let old_team_id = store
        .panel(panels[0].id)
        .await
        .unwrap()
        .unwrap()
        .team_ids()[0];

    let new_team = switch
        .switch_team(user, league.id, SwitchTarget::Panel(panels[1].id))
        .await
        .unwrap();

    // Original team destroyed: record gone, panel reference pulled
    assert!(store.team(old_team_id).await.unwrap().is_none());
    let old_panel = store.panel(panels[0].id).await.unwrap().unwrap();
    assert!(old_panel.team.is_empty());
    assert!(old_panel.members.is_empty());

    // A fresh team exists in the target panel with the user as sole member
    assert_eq!(new_team.panel.id, panels[1].id);
    assert_eq!(new_team.name, "Team 1 - Sales");
    assert_eq!(new_team.member_count, 1);
    assert!(new_team.members.contains(user));

    // League membership survived the move
    let league = store.league(league.id).await.unwrap().unwrap();
    assert!(league.members.is_active(user));
}

#[tokio::test]
async fn test_switching_out_of_shared_team_leaves_it_alive() {
    let store = MemoryStore::new();
    let (league, panels) = seed_group_league(&store, &["Engineering", "Sales"]).await;
    let join = JoinEngine::new(Arc::new(store.clone()));
    let switch = SwitchEngine::new(Arc::new(store.clone()));

    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    join.join_group_league(a, league.id, Some(panels[0].id), true)
        .await
        .unwrap();
    join.join_group_league(b, league.id, Some(panels[0].id), true)
        .await
        .unwrap();

    let shared_team_id = store
        .panel(panels[0].id)
        .await
        .unwrap()
        .unwrap()
        .team_ids()[0];

    switch
        .switch_team(a, league.id, SwitchTarget::Panel(panels[1].id))
        .await
        .unwrap();

    // The shared team survives with the remaining member
    let team = store.team(shared_team_id).await.unwrap().unwrap();
    assert_eq!(team.member_count, 1);
    assert!(team.members.contains(b));
    assert!(!team.members.contains(a));
}
