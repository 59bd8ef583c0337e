//! Participant and roster models

use serde::{Deserialize, Serialize};

use super::ClientId;

/// Who a tab claims to be when it enters a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub client_id: ClientId,
    pub name: String,
}

impl Identity {
    pub fn new(client_id: ClientId, name: impl Into<String>) -> Self {
        Self {
            client_id,
            name: name.into(),
        }
    }
}

/// A session bound to a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub client_id: ClientId,
    pub name: String,
    /// Self-asserted; nothing verifies it
    pub is_host: bool,
}

impl Participant {
    pub fn new(identity: Identity, is_host: bool) -> Self {
        Self {
            client_id: identity.client_id,
            name: identity.name,
            is_host,
        }
    }

    /// First letter of the name, for avatar badges
    pub fn initial(&self) -> char {
        self.name.chars().next().unwrap_or('?')
    }
}

/// Ordered participant list of one room, unique by client id.
///
/// Decoding keeps the first entry for each client id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Participant>", into = "Vec<Participant>")]
pub struct Roster(Vec<Participant>);

impl Roster {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.0.iter()
    }

    pub fn participants(&self) -> &[Participant] {
        &self.0
    }

    pub fn find(&self, client_id: &ClientId) -> Option<&Participant> {
        self.0.iter().find(|p| &p.client_id == client_id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Participant> {
        self.0.iter().find(|p| p.name == name)
    }

    pub fn contains(&self, client_id: &ClientId) -> bool {
        self.find(client_id).is_some()
    }

    pub fn host(&self) -> Option<&Participant> {
        self.0.iter().find(|p| p.is_host)
    }

    /// Append unless the client id or the name is already present.
    /// Returns true when an entry was added.
    pub fn admit(&mut self, participant: Participant) -> bool {
        let exists = self
            .0
            .iter()
            .any(|p| p.client_id == participant.client_id || p.name == participant.name);
        if exists {
            return false;
        }
        self.0.push(participant);
        true
    }

    /// Remove the entry with this client id. Returns the removed entry.
    pub fn remove(&mut self, client_id: &ClientId) -> Option<Participant> {
        let idx = self.0.iter().position(|p| &p.client_id == client_id)?;
        Some(self.0.remove(idx))
    }
}

impl From<Vec<Participant>> for Roster {
    fn from(participants: Vec<Participant>) -> Self {
        let mut roster = Self::new();
        for p in participants {
            if !roster.contains(&p.client_id) {
                roster.0.push(p);
            }
        }
        roster
    }
}

impl From<Roster> for Vec<Participant> {
    fn from(roster: Roster) -> Self {
        roster.0
    }
}

impl<'a> IntoIterator for &'a Roster {
    type Item = &'a Participant;
    type IntoIter = std::slice::Iter<'a, Participant>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
