//! Command execution against the room this tab is showing

use tilehunt_core::{
    CreateRoomRequest, EntryRequest, Error, JoinRoomRequest, KickOutcome, RoomAction, RoomId,
    RoomSession, StartOutcome, StorageBackend, Tab,
};

use crate::commands::{Command, HELP};
use crate::render;

/// Clipboard writer; returns false when nothing was copied
pub type CopyFn = fn(&str) -> bool;

pub struct Shell<'t, B: StorageBackend> {
    tab: &'t Tab<B>,
    capacity: usize,
    origin: String,
    copy: CopyFn,
    current: Option<RoomSession<'t, B>>,
    /// Observer revision last shown to the user
    shown: u64,
}

impl<'t, B> Shell<'t, B>
where
    B: StorageBackend + Clone + Send + Sync + 'static,
{
    pub fn new(tab: &'t Tab<B>, capacity: usize, origin: String, copy: CopyFn) -> Self {
        Self {
            tab,
            capacity,
            origin,
            copy,
            current: None,
            shown: 0,
        }
    }

    pub fn room_id(&self) -> Option<&RoomId> {
        self.current.as_ref().map(RoomSession::room_id)
    }

    /// Run one command and return the lines to print
    pub fn execute(&mut self, command: Command) -> Vec<String> {
        let lines = match command {
            Command::Create {
                host_name,
                slots,
                password,
            } => {
                let mut request = CreateRoomRequest::new(host_name);
                request.slot_count = slots;
                request.password = password;
                self.enter(EntryRequest::Create(request))
            }
            Command::Join {
                room_id,
                host_name,
                your_name,
                password,
            } => self.enter(EntryRequest::Join(JoinRoomRequest {
                host_name,
                your_name,
                password,
                room_id,
            })),
            Command::Link(url) => match JoinRoomRequest::from_link(&url) {
                Ok(request) => self.enter(EntryRequest::Join(request)),
                Err(e) => vec![entry_error(&e)],
            },
            Command::Help => HELP.lines().map(str::to_string).collect(),
            Command::Quit => {
                self.current = None;
                Vec::new()
            }
            Command::Leave => match self.current.take() {
                Some(session) => {
                    let room = session.room_id().clone();
                    session.leave();
                    vec![format!("Left room {room}")]
                }
                None => vec![not_in_room()],
            },
            other => match &self.current {
                Some(session) => self.in_room(session, other),
                None => vec![not_in_room()],
            },
        };
        self.mark_shown();
        lines
    }

    /// Lines to print after notifications arrived, if anything changed
    pub fn refresh(&mut self) -> Vec<String> {
        let Some(session) = &self.current else {
            return Vec::new();
        };
        if session.revision() == self.shown {
            return Vec::new();
        }
        let mut lines = self.who(session);
        if !session.roster().contains(&session.me().client_id) {
            lines.push("You are no longer in this room's roster".to_string());
        }
        lines.extend(render::board(&session.board()));
        self.mark_shown();
        lines
    }

    fn enter(&mut self, request: EntryRequest) -> Vec<String> {
        // unmounting the old room leaves it
        self.current = None;
        match self.tab.enter(&request, self.capacity) {
            Ok(session) => {
                let mut lines = self.who(&session);
                lines.extend(render::board(&session.board()));
                self.current = Some(session);
                lines
            }
            Err(e) => vec![entry_error(&e)],
        }
    }

    fn in_room(&self, session: &RoomSession<'t, B>, command: Command) -> Vec<String> {
        match command {
            Command::Start => match session.start() {
                Ok(StartOutcome::Started(_)) => {
                    let mut lines = vec!["Game started".to_string()];
                    lines.extend(render::board(&session.board()));
                    lines
                }
                Ok(StartOutcome::AlreadyStarted(_)) => vec!["Game already started".to_string()],
                Ok(StartOutcome::Unauthorized) => {
                    vec!["Only the host can start the game".to_string()]
                }
                Err(e) => vec![e.to_string()],
            },
            Command::Roll => match session.roll() {
                Ok(roll) => {
                    let mut lines = vec![format!(
                        "{} rolled {}: {} -> {}",
                        roll.player.name,
                        roll.dice,
                        roll.from,
                        roll.to()
                    )];
                    lines.extend(render::board(&session.board()));
                    lines
                }
                Err(e) => vec![e.to_string()],
            },
            Command::Kick(target) => {
                let line = match session.kick(&target) {
                    KickOutcome::Kicked => format!("Removed {target}"),
                    KickOutcome::NotFound => format!("No one called {target} here"),
                    KickOutcome::Unauthorized => "Only the host can kick".to_string(),
                    KickOutcome::TargetIsHost => "The host cannot be kicked".to_string(),
                };
                vec![line]
            }
            Command::Who => self.who(session),
            Command::Board => render::board(&session.board()),
            Command::Invite => {
                let link = session.invite_link(&self.origin).to_url();
                if (self.copy)(&link) {
                    vec![format!("Copied invite link: {link}")]
                } else {
                    vec![format!("Invite link: {link}")]
                }
            }
            _ => Vec::new(),
        }
    }

    fn who(&self, session: &RoomSession<'t, B>) -> Vec<String> {
        let mut lines = vec![render::header(session.room_id(), session.banner())];
        lines.extend(render::roster(
            &session.roster(),
            &session.me().client_id,
            session.can(RoomAction::KickMember),
        ));
        lines
    }

    fn mark_shown(&mut self) {
        if let Some(session) = &self.current {
            self.shown = session.revision();
        }
    }
}

fn not_in_room() -> String {
    "Not in a room (try 'create' or 'join')".to_string()
}

fn entry_error(e: &Error) -> String {
    match e {
        Error::MissingRoom => "No room id given; back to the entry forms".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tilehunt_core::{ChangeBus, ClientId, SqliteBackend, StoragePoller, DEFAULT_CAPACITY};

    fn no_clipboard(_: &str) -> bool {
        false
    }

    fn open(path: &std::path::Path, id: &str) -> (Tab<SqliteBackend>, StoragePoller) {
        let bus = ChangeBus::new();
        let backend = SqliteBackend::open(path).unwrap();
        let poller = StoragePoller::new(backend.clone(), bus.clone());
        (Tab::new(ClientId::new(id), backend, bus), poller)
    }

    fn shell(tab: &Tab<SqliteBackend>) -> Shell<'_, SqliteBackend> {
        Shell::new(tab, DEFAULT_CAPACITY, "tilehunt://local".into(), no_clipboard)
    }

    fn parse(line: &str) -> Command {
        Command::parse(line).unwrap().unwrap()
    }

    #[test]
    fn test_commands_need_a_room() {
        let dir = TempDir::new().unwrap();
        let (tab, _) = open(&dir.path().join("t.db"), "a");
        let mut shell = shell(&tab);

        assert_eq!(shell.execute(parse("roll")), vec![not_in_room()]);
        assert_eq!(
            shell.execute(parse("link tilehunt://local/Room")),
            vec!["No room id given; back to the entry forms".to_string()]
        );
    }

    #[test]
    fn test_two_terminals_play() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.db");
        let (host_tab, mut host_poller) = open(&path, "a");
        let (guest_tab, _) = open(&path, "b");
        let mut host = shell(&host_tab);
        let mut guest = shell(&guest_tab);

        host.execute(parse("create Ana 4 pw"));
        let room = host.room_id().unwrap().clone();
        let invite = host.execute(parse("invite"));
        assert_eq!(
            invite,
            vec![format!("Invite link: tilehunt://local/Room?roomId={room}")]
        );

        guest.execute(parse(&format!("link tilehunt://local/Room?roomId={room}")));
        assert_eq!(guest.room_id(), Some(&room));

        assert!(host.refresh().is_empty());
        host_poller.poll();
        let lines = host.refresh();
        assert!(lines.iter().any(|l| l.starts_with("[G] Guest-")));
        assert!(host.refresh().is_empty());

        assert_eq!(
            guest.execute(parse("start")),
            vec!["Only the host can start the game".to_string()]
        );
        assert_eq!(host.execute(parse("start"))[0], "Game started");
    }
}
