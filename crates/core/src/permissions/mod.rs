//! Permission system for room operations
//!
//! Host-ness is self-asserted by each tab, so these checks only gate what
//! an honest tab offers and does; they do not protect against a tab that
//! lies about being host.

use crate::models::Participant;

/// Actions that can be performed in a room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomAction {
    StartGame,
    KickMember,
    RollDice,
    Leave,
    CopyInvite,
}

/// Permission matrix for room participants
pub struct PermissionMatrix;

impl PermissionMatrix {
    /// Check if a participant with the given host flag may perform an action
    pub fn can_perform(is_host: bool, action: RoomAction) -> bool {
        match action {
            RoomAction::StartGame | RoomAction::KickMember => is_host,
            RoomAction::RollDice | RoomAction::Leave | RoomAction::CopyInvite => true,
        }
    }

    /// Check if `actor` may kick `target`. The host is never kickable.
    pub fn can_kick(actor: &Participant, target: &Participant) -> bool {
        Self::can_perform(actor.is_host, RoomAction::KickMember)
            && !target.is_host
            && actor.client_id != target.client_id
    }
}
