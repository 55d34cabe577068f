//! Role and eligibility checks
//!
//! Pure predicates over already-fetched documents; callers translate a
//! `false`/`None` into Forbidden or NotFound at the boundary.

use uuid::Uuid;

use kudos_common::Result;

use crate::domain::entities::{Company, League, LeagueType, User};
use crate::store::MembershipStore;

/// Whether the user counts as a member of the league for read access.
///
/// True for league members and moderators, for admins on public leagues,
/// and for moderators of a company that owns the league.
pub fn is_league_member(league: &League, user: &User, moderated_companies: &[Company]) -> bool {
    if league.members.contains(user.id) || league.moderators.contains(user.id) {
        return true;
    }

    if league.league_type == LeagueType::Public && user.is_admin() {
        return true;
    }

    moderated_companies
        .iter()
        .any(|company| company.owns_league(league.id))
}

/// Whether the user may moderate the league (invite, remove, edit).
pub fn is_league_moderator(league: &League, user: &User, moderated_companies: &[Company]) -> bool {
    if league.moderators.contains(user.id) {
        return true;
    }

    if league.league_type == LeagueType::Public && user.is_admin() {
        return true;
    }

    moderated_companies
        .iter()
        .any(|company| company.owns_league(league.id))
}

/// Reverse lookup from a team to the league that (indirectly) owns it,
/// through the panel's `team` references and the league's `panel` references.
pub async fn get_team_league(
    store: &dyn MembershipStore,
    team_id: Uuid,
) -> Result<Option<League>> {
    let Some(panel) = store.panel_containing_team(team_id).await? else {
        return Ok(None);
    };

    store.league_containing_panel(panel.id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{LeagueRef, MemberEntry, ROLE_ADMIN};

    fn league(league_type: LeagueType) -> League {
        League::new("Steps".to_string(), league_type, Some(2), None).unwrap()
    }

    #[test]
    fn test_member_entry_grants_membership() {
        let user = User::new(Uuid::new_v4());
        let mut league = league(LeagueType::Private);
        league.members.upsert(MemberEntry::new(user.id, true, true));

        assert!(is_league_member(&league, &user, &[]));
    }

    #[test]
    fn test_moderator_entry_grants_membership_and_moderation() {
        let user = User::new(Uuid::new_v4());
        let mut league = league(LeagueType::Private);
        league
            .moderators
            .upsert(MemberEntry::new(user.id, true, true));

        assert!(is_league_member(&league, &user, &[]));
        assert!(is_league_moderator(&league, &user, &[]));
    }

    #[test]
    fn test_stranger_is_neither() {
        let user = User::new(Uuid::new_v4());
        let league = league(LeagueType::Private);

        assert!(!is_league_member(&league, &user, &[]));
        assert!(!is_league_moderator(&league, &user, &[]));
    }

    #[test]
    fn test_admin_counts_only_on_public_leagues() {
        let mut user = User::new(Uuid::new_v4());
        user.roles.push(ROLE_ADMIN.to_string());

        assert!(is_league_member(&league(LeagueType::Public), &user, &[]));
        assert!(is_league_moderator(&league(LeagueType::Public), &user, &[]));
        assert!(!is_league_member(&league(LeagueType::Private), &user, &[]));
        assert!(!is_league_moderator(
            &league(LeagueType::Corporate),
            &user,
            &[]
        ));
    }

    #[test]
    fn test_owning_company_moderator_counts() {
        let user = User::new(Uuid::new_v4());
        let league = league(LeagueType::Corporate);

        let mut company = Company::new("Acme".to_string()).unwrap();
        company.leagues.push(LeagueRef {
            league_id: league.id,
        });

        assert!(is_league_member(&league, &user, &[company.clone()]));
        assert!(is_league_moderator(&league, &user, &[company]));
    }

    #[test]
    fn test_unrelated_company_does_not_count() {
        let user = User::new(Uuid::new_v4());
        let league = league(LeagueType::Corporate);
        let company = Company::new("Other".to_string()).unwrap();

        assert!(!is_league_moderator(&league, &user, &[company]));
    }

    mod team_league_lookup {
        use super::*;
        use crate::domain::entities::{MemberList, Panel, PanelRef, Team, TeamPanelRef, TeamRef};
        use crate::store::MemoryStore;

        #[tokio::test]
        async fn test_resolves_league_through_panel() {
            let store = MemoryStore::new();

            let mut league = league(LeagueType::Corporate);
            let mut panel = Panel::new("Sales".to_string());
            let team = Team::new(
                "Team 1 - Sales".to_string(),
                TeamPanelRef {
                    id: panel.id,
                    name: panel.name.clone(),
                },
                MemberList::new(),
            );
            panel.team.push(TeamRef { team_id: team.id });
            league.panel.push(PanelRef { panel_id: panel.id });

            store.insert_league(&league).await.unwrap();
            store.insert_panel(&panel).await.unwrap();
            store.insert_team(&team).await.unwrap();

            let found = get_team_league(&store, team.id).await.unwrap().unwrap();
            assert_eq!(found.id, league.id);
        }

        #[tokio::test]
        async fn test_unknown_team_resolves_to_none() {
            let store = MemoryStore::new();
            let found = get_team_league(&store, Uuid::new_v4()).await.unwrap();
            assert!(found.is_none());
        }
    }
}
