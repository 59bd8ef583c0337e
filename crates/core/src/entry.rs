//! Ways into a room: the create form, the join form and shared links
//!
//! Link format: `<origin>/Room?roomId=<room-id>`

use std::str::FromStr;

use rand::Rng;
use url::form_urlencoded;

use crate::error::{Error, Result};
use crate::models::RoomId;
use crate::room::DEFAULT_CAPACITY;

/// Random characters after `Guest-` in a generated name
const GUEST_SUFFIX_LEN: usize = 4;

/// Path of the room page in a link
const ROOM_PATH: &str = "/Room";

/// Query parameter carrying the room id
const ROOM_PARAM: &str = "roomId";

/// Host form: opens a fresh room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoomRequest {
    pub host_name: String,
    /// Shown on the banner only; nothing checks it
    pub password: Option<String>,
    pub slot_count: Option<usize>,
    pub room_id: RoomId,
}

impl CreateRoomRequest {
    /// Request for a room with a newly generated id
    pub fn new(host_name: impl Into<String>) -> Self {
        Self {
            host_name: host_name.into(),
            password: None,
            slot_count: None,
            room_id: RoomId::generate(),
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_slots(mut self, slots: usize) -> Self {
        self.slot_count = Some(slots);
        self
    }
}

/// Guest form: enters an existing room by id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinRoomRequest {
    pub host_name: String,
    pub your_name: String,
    pub password: Option<String>,
    /// As typed or taken from a link; may be empty
    pub room_id: String,
}

impl JoinRoomRequest {
    pub fn new(room_id: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            ..Self::default()
        }
    }

    /// Join request prefilled from a shared link
    pub fn from_link(link: &str) -> Result<Self> {
        let room = DirectLink::parse(link)?;
        Ok(Self::new(room.as_str()))
    }
}

/// Either entry form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryRequest {
    Create(CreateRoomRequest),
    Join(JoinRoomRequest),
}

/// Who enters which room, and as what
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntry {
    pub room_id: RoomId,
    pub name: String,
    pub is_host: bool,
    pub banner: RoomBanner,
}

impl EntryRequest {
    pub fn is_join(&self) -> bool {
        matches!(self, EntryRequest::Join(_))
    }

    /// Work out the display name, host flag and room.
    ///
    /// An empty room id is [`Error::MissingRoom`]: the caller should send
    /// the user back to the entry forms.
    pub fn resolve(&self) -> Result<ResolvedEntry> {
        self.resolve_with(&mut rand::thread_rng())
    }

    pub fn resolve_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<ResolvedEntry> {
        match self {
            EntryRequest::Create(req) => Ok(ResolvedEntry {
                room_id: req.room_id.clone(),
                name: display_name("", &req.host_name, rng),
                is_host: true,
                banner: RoomBanner {
                    host_name: non_empty(&req.host_name),
                    password: req.password.clone(),
                    slots: req.slot_count.unwrap_or(DEFAULT_CAPACITY),
                },
            }),
            EntryRequest::Join(req) => Ok(ResolvedEntry {
                room_id: RoomId::parse(&req.room_id)?,
                name: display_name(&req.your_name, &req.host_name, rng),
                is_host: false,
                banner: RoomBanner {
                    host_name: non_empty(&req.host_name),
                    password: req.password.clone(),
                    slots: DEFAULT_CAPACITY,
                },
            }),
        }
    }
}

fn display_name<R: Rng + ?Sized>(your_name: &str, host_name: &str, rng: &mut R) -> String {
    [your_name, host_name]
        .into_iter()
        .map(str::trim)
        .find(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| guest_name(rng))
}

fn guest_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let suffix: String = RoomId::generate_with(rng)
        .as_str()
        .chars()
        .take(GUEST_SUFFIX_LEN)
        .collect();
    format!("Guest-{suffix}")
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Room header text. The password is decorative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomBanner {
    pub host_name: Option<String>,
    pub password: Option<String>,
    pub slots: usize,
}

impl Default for RoomBanner {
    fn default() -> Self {
        Self {
            host_name: None,
            password: None,
            slots: DEFAULT_CAPACITY,
        }
    }
}

impl std::fmt::Display for RoomBanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Host: {} · Password: {} · Slots: {}",
            self.host_name.as_deref().unwrap_or("-"),
            self.password.as_deref().unwrap_or("-"),
            self.slots
        )
    }
}

/// A pasted URL or bare query string pointing at a room
pub struct DirectLink;

impl DirectLink {
    /// Extract the `roomId` query parameter
    pub fn parse(url_or_query: &str) -> Result<RoomId> {
        let query = match url_or_query.split_once('?') {
            Some((_, query)) => query,
            None => url_or_query,
        };
        let query = query.split('#').next().unwrap_or_default();

        let value = form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == ROOM_PARAM)
            .map(|(_, value)| value)
            .ok_or(Error::MissingRoom)?;
        RoomId::parse(&value)
    }
}

/// Shareable link to a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteLink {
    /// Scheme and host, without a trailing slash
    pub origin: String,
    pub room_id: RoomId,
}

impl InviteLink {
    pub fn new(origin: &str, room_id: RoomId) -> Self {
        Self {
            origin: origin.trim_end_matches('/').to_string(),
            room_id,
        }
    }

    pub fn to_url(&self) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair(ROOM_PARAM, self.room_id.as_str())
            .finish();
        format!("{}{}?{}", self.origin, ROOM_PATH, query)
    }

    pub fn parse(s: &str) -> Result<Self> {
        let (origin, rest) = s
            .split_once(ROOM_PATH)
            .ok_or_else(|| Error::InvalidLink(format!("missing {ROOM_PATH} in '{s}'")))?;
        if origin.is_empty() {
            return Err(Error::InvalidLink(format!("missing origin in '{s}'")));
        }
        if !rest.starts_with('?') {
            return Err(Error::InvalidLink(format!("missing query in '{s}'")));
        }
        let room_id = DirectLink::parse(rest)?;
        Ok(Self::new(origin, room_id))
    }
}

impl std::fmt::Display for InviteLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_url())
    }
}

impl FromStr for InviteLink {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_create_resolves_as_host() {
        let req = CreateRoomRequest::new("Ana").with_password("pw").with_slots(3);
        let entry = EntryRequest::Create(req.clone()).resolve().unwrap();

        assert_eq!(entry.room_id, req.room_id);
        assert_eq!(entry.name, "Ana");
        assert!(entry.is_host);
        assert_eq!(entry.banner.slots, 3);
        assert_eq!(entry.banner.to_string(), "Host: Ana · Password: pw · Slots: 3");
    }

    #[test]
    fn test_join_name_precedence() {
        let mut req = JoinRoomRequest::new("abc123");
        req.host_name = "Ana".into();
        req.your_name = "Ben".into();
        let entry = EntryRequest::Join(req.clone()).resolve().unwrap();
        assert_eq!(entry.name, "Ben");
        assert!(!entry.is_host);

        req.your_name = "  ".into();
        assert_eq!(EntryRequest::Join(req).resolve().unwrap().name, "Ana");
    }

    #[test]
    fn test_guest_name_when_nothing_given() {
        let mut rng = StdRng::seed_from_u64(3);
        let entry = EntryRequest::Join(JoinRoomRequest::new("abc123"))
            .resolve_with(&mut rng)
            .unwrap();

        let suffix = entry.name.strip_prefix("Guest-").unwrap();
        assert_eq!(suffix.len(), GUEST_SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(entry.banner, RoomBanner::default());
    }

    #[test]
    fn test_join_without_room_is_missing() {
        assert!(matches!(
            EntryRequest::Join(JoinRoomRequest::new(" ")).resolve(),
            Err(Error::MissingRoom)
        ));
    }

    #[test]
    fn test_direct_link_forms() {
        let id = |s: &str| DirectLink::parse(s).unwrap().to_string();
        assert_eq!(id("https://play.example/Room?roomId=abc123"), "abc123");
        assert_eq!(id("?foo=1&roomId=xyz#top"), "xyz");
        assert_eq!(id("roomId=k9"), "k9");
        assert_eq!(id("/Room?roomId=a%20b"), "a b");
        assert_eq!(id("/Room?roomId=a+b&roomId=zz"), "a b");

        assert!(matches!(
            DirectLink::parse("https://play.example/Room"),
            Err(Error::MissingRoom)
        ));
        assert!(matches!(
            DirectLink::parse("/Room?roomId="),
            Err(Error::MissingRoom)
        ));
    }

    #[test]
    fn test_invite_link_format() {
        let link = InviteLink::new("https://play.example/", RoomId::parse("abc123").unwrap());
        assert_eq!(link.to_url(), "https://play.example/Room?roomId=abc123");

        let parsed: InviteLink = link.to_url().parse().unwrap();
        assert_eq!(parsed, link);
    }

    #[test]
    fn test_invite_link_invalid() {
        assert!(InviteLink::parse("https://play.example/Lobby?roomId=a").is_err());
        assert!(InviteLink::parse("/Room?roomId=a").is_err());
        assert!(InviteLink::parse("https://play.example/Room").is_err());
    }

    #[test]
    fn test_join_from_link() {
        let req = JoinRoomRequest::from_link("tilehunt://local/Room?roomId=r42").unwrap();
        assert_eq!(req.room_id, "r42");
    }
}
