use chrono::Utc;

use crate::game::errors::LifeVerseError;
use crate::game::types::{Clan, GameState};

pub fn join_clan(state: &mut GameState, clan_id: &str, name: &str) -> Result<(), LifeVerseError> {
    if let Some(current) = &state.clan {
        return Err(LifeVerseError::InvalidState(format!(
            "already a member of {}",
            current.name
        )));
    }
    if clan_id.trim().is_empty() {
        return Err(LifeVerseError::InvalidInput("clan id is empty".to_string()));
    }
    state.clan = Some(Clan {
        id: clan_id.to_string(),
        name: name.to_string(),
        members: vec![state.user.id.clone()],
        joined_at: Utc::now(),
    });
    Ok(())
}

/// Leave the current clan, returning it. `None` when not in a clan.
pub fn leave_clan(state: &mut GameState) -> Option<Clan> {
    state.clan.take()
}
