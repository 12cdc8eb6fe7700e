//! Derived, read-only view over a member snapshot.
//!
//! Away wins over eaten: an away member is listed as away even if the
//! store still has `has_eaten` set from before they left.

use serde::Serialize;

use crate::error::ValidationError;
use crate::remote::{validate_members, Member};

/// What a member may do and whether they count, given their flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Eligibility {
    pub can_mark_eaten: bool,
    pub counts_toward_ranking: bool,
}

impl Eligibility {
    pub fn of(member: &Member) -> Self {
        Self {
            can_mark_eaten: !member.is_away && !member.has_eaten,
            counts_toward_ranking: !member.is_away,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankEntry {
    pub rank: usize,
    pub member_id: String,
    pub display_name: String,
    pub missed_meal_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MembershipView {
    pub eaten: Vec<Member>,
    /// Present and not fed yet. After food is reported finished these are
    /// the members who missed the meal.
    pub waiting: Vec<Member>,
    pub away: Vec<Member>,
    /// Non-away members, most missed meals first; ties keep list order.
    pub ranking: Vec<RankEntry>,
}

impl MembershipView {
    /// # Errors
    /// Returns an error when the snapshot has empty or duplicate ids.
    pub fn from_members(members: &[Member]) -> Result<Self, ValidationError> {
        validate_members(members)?;

        let mut view = MembershipView::default();
        for member in members {
            if member.is_away {
                view.away.push(member.clone());
            } else if member.has_eaten {
                view.eaten.push(member.clone());
            } else {
                view.waiting.push(member.clone());
            }
        }

        let mut ranked: Vec<&Member> = members
            .iter()
            .filter(|m| Eligibility::of(m).counts_toward_ranking)
            .collect();
        // sort_by is stable
        ranked.sort_by(|a, b| b.missed_meal_count.cmp(&a.missed_meal_count));
        view.ranking = ranked
            .into_iter()
            .enumerate()
            .map(|(i, m)| RankEntry {
                rank: i + 1,
                member_id: m.id.clone(),
                display_name: m.display_name.clone(),
                missed_meal_count: m.missed_meal_count,
            })
            .collect();

        Ok(view)
    }
}
