//! Team allocator
//!
//! Places a user into a team within a panel, enforcing the league's team
//! size. Assignment is first-fit in the panel's team order, never balanced:
//! a new team is only created when no existing team has a spare slot.

use uuid::Uuid;

use kudos_common::{Error, Result};

use crate::domain::entities::{League, MemberEntry, Panel, Team, TeamPanelRef, TeamRef};
use crate::store::MembershipStore;

/// Find a team with spare capacity in the panel, or create one, and add the
/// user to it. Returns the team as stored after the member was added.
pub async fn get_or_create_team(
    store: &dyn MembershipStore,
    league: &League,
    panel_id: Uuid,
    user_id: Uuid,
    active: bool,
    activated: bool,
) -> Result<Team> {
    let panel = store
        .panel(panel_id)
        .await?
        .filter(|p| !p.deleted)
        .ok_or_else(|| Error::NotFound("Panel not found".to_string()))?;

    let team_size = league.team_size.unwrap_or(1);
    let teams = live_teams_in_panel_order(store, &panel).await?;

    let team_id = match teams.iter().find(|team| team.has_capacity(team_size)) {
        Some(team) => team.id,
        None => {
            let name = format!("Team {} - {}", teams.len() + 1, panel.name);
            let team = Team::new(
                name,
                TeamPanelRef {
                    id: panel.id,
                    name: panel.name.clone(),
                },
                league.moderators.clone(),
            );
            store.insert_team(&team).await?;
            store
                .push_panel_team(panel.id, TeamRef { team_id: team.id })
                .await?;
            team.id
        }
    };

    let entry = MemberEntry::new(user_id, active, activated);
    store.add_team_member(team_id, entry.clone()).await?;
    store.upsert_panel_member(panel.id, entry).await?;

    store
        .team(team_id)
        .await?
        .ok_or_else(|| Error::NotFound("Team not found".to_string()))
}

/// Remove the user from the team. A team emptied by its last member is
/// destroyed outright (and unlinked from its panel) rather than kept around;
/// a team with remaining members just has its count decremented.
pub async fn leave_team(store: &dyn MembershipStore, team: &Team, user_id: Uuid) -> Result<()> {
    store.pull_panel_member(team.panel.id, user_id).await?;

    if team.members.len() <= 1 {
        store.pull_panel_team(team.panel.id, team.id).await?;
        store.delete_team(team.id).await?;
    } else {
        store.remove_team_member(team.id, user_id).await?;
    }

    Ok(())
}

/// Non-deleted teams of a panel, in the panel's team list order. The store
/// does not guarantee fetch order, so reorder by the panel's references.
pub(crate) async fn live_teams_in_panel_order(
    store: &dyn MembershipStore,
    panel: &Panel,
) -> Result<Vec<Team>> {
    let fetched = store.teams(&panel.team_ids()).await?;
    let mut by_id: std::collections::HashMap<Uuid, Team> =
        fetched.into_iter().map(|t| (t.id, t)).collect();

    Ok(panel
        .team
        .iter()
        .filter_map(|r| by_id.remove(&r.team_id))
        .filter(|t| !t.deleted)
        .collect())
}
