//! Line commands typed into a tab

use thiserror::Error;

/// Placeholder for a blank form field
const BLANK: &str = "-";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command '{0}' (try 'help')")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Create {
        host_name: String,
        slots: Option<usize>,
        password: Option<String>,
    },
    Join {
        room_id: String,
        host_name: String,
        your_name: String,
        password: Option<String>,
    },
    Link(String),
    Start,
    Roll,
    Kick(String),
    Leave,
    Who,
    Board,
    Invite,
    Help,
    Quit,
}

pub const HELP: &str = "\
create <host> [slots] [password]     open a new room as host
join <room> <host> <name> [password] enter a room ('-' leaves a field blank)
link <url>                           enter the room a shared link points at
start                                place everyone on the board (host)
roll                                 roll for whoever's turn it is
kick <name>                          remove a guest (host)
leave                                leave the room
who                                  list the room roster
board                                show the board
invite                               copy the room link
quit                                 leave and exit";

impl Command {
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let command = match name.to_lowercase().as_str() {
            "create" => {
                let host_name = field(args.first().copied())
                    .ok_or(CommandError::Usage("create <host> [slots] [password]"))?;
                let slots = match args.get(1) {
                    Some(raw) => Some(
                        raw.parse::<usize>()
                            .map_err(|_| CommandError::Usage("create <host> [slots] [password]"))?,
                    ),
                    None => None,
                };
                Command::Create {
                    host_name,
                    slots,
                    password: field(args.get(2).copied()),
                }
            }
            "join" => {
                let [room_id, host_name, your_name, rest @ ..] = args.as_slice() else {
                    return Err(CommandError::Usage("join <room> <host> <name> [password]"));
                };
                Command::Join {
                    room_id: room_id.to_string(),
                    host_name: field(Some(*host_name)).unwrap_or_default(),
                    your_name: field(Some(*your_name)).unwrap_or_default(),
                    password: field(rest.first().copied()),
                }
            }
            "link" => match args.as_slice() {
                [url] => Command::Link(url.to_string()),
                _ => return Err(CommandError::Usage("link <url>")),
            },
            "kick" => {
                if args.is_empty() {
                    return Err(CommandError::Usage("kick <name>"));
                }
                Command::Kick(args.join(" "))
            }
            "start" => Command::Start,
            "roll" => Command::Roll,
            "leave" => Command::Leave,
            "who" => Command::Who,
            "board" => Command::Board,
            "invite" => Command::Invite,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}

fn field(raw: Option<&str>) -> Option<String> {
    raw.filter(|v| *v != BLANK).map(str::to_string)
}
