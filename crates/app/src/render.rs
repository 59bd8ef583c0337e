//! Text rendering of the room page

use tilehunt_core::{BoardView, ClientId, Roster, RoomBanner, RoomId};

/// Tiles per board row
const ROW_LEN: usize = 4;

pub fn header(room: &RoomId, banner: &RoomBanner) -> String {
    format!("Room: {room}\n{banner}")
}

/// One line per participant; kick hints only for a host and only on guests
pub fn roster(roster: &Roster, me: &ClientId, can_kick: bool) -> Vec<String> {
    if roster.is_empty() {
        return vec!["(nobody here)".to_string()];
    }
    roster
        .iter()
        .map(|p| {
            let mut line = format!("[{}] {}", p.initial(), p.name);
            if p.is_host {
                line.push_str(" (host)");
            }
            if &p.client_id == me {
                line.push_str(" (you)");
            }
            if can_kick && !p.is_host {
                line.push_str(&format!("  - kick {}", p.name));
            }
            line
        })
        .collect()
}

pub fn board(view: &BoardView) -> Vec<String> {
    let mut lines: Vec<String> = view
        .tiles
        .chunks(ROW_LEN)
        .map(|row| {
            row.iter()
                .map(|tile| {
                    let mark = if tile.is_hidden { "*" } else { " " };
                    format!("{mark}{:>2} {:<12}", tile.number, tile.occupants.join(","))
                })
                .collect::<Vec<_>>()
                .join("|")
        })
        .collect();

    let status = match (&view.winner, &view.turn_name) {
        (Some(winner), _) => format!("{winner} found the hidden tile!"),
        (None, Some(turn)) => format!("{turn}'s turn ({} players)", view.player_count),
        (None, None) if view.started => "No players on the board".to_string(),
        (None, None) => format!(
            "Waiting for the host to start ({} players)",
            view.player_count
        ),
    };
    lines.push(status);
    lines
}
