//! Scenarios with several tabs sharing one store

use tilehunt_core::{
    ChangeBus, ClientId, CreateRoomRequest, EntryRequest, Error, GameStatus, Identity,
    JoinRoomRequest, KeyedStore, KickOutcome, MemoryBackend, MemoryProfile, Participant, RoomId,
    RoomManager, ScriptedDice, SqliteBackend, StartOutcome, StoragePoller, Tab, DEFAULT_CAPACITY,
};

fn room() -> RoomId {
    RoomId::parse("abc123").unwrap()
}

fn memory_tab(
    profile: &MemoryProfile,
    id: &str,
    dice: ScriptedDice,
) -> Tab<MemoryBackend, ScriptedDice> {
    let bus = ChangeBus::new();
    let backend = profile.open_context(&bus);
    Tab::with_dice(ClientId::new(id), backend, bus, dice)
}

fn create(host: &str) -> EntryRequest {
    let mut req = CreateRoomRequest::new(host);
    req.room_id = room();
    EntryRequest::Create(req)
}

fn join(name: &str) -> EntryRequest {
    let mut req = JoinRoomRequest::new(room().as_str());
    req.your_name = name.to_string();
    EntryRequest::Join(req)
}

#[test]
fn test_two_tabs_share_a_roster() {
    let profile = MemoryProfile::new();
    let a = memory_tab(&profile, "a", ScriptedDice::default());
    let b = memory_tab(&profile, "b", ScriptedDice::default());

    let host = a.enter(&create("Ana"), DEFAULT_CAPACITY).unwrap();
    assert_eq!(host.roster().len(), 1);

    let guest = b.enter(&join("Ben"), DEFAULT_CAPACITY).unwrap();
    // host saw the guest arrive through a native notification
    assert_eq!(host.roster().len(), 2);
    assert_eq!(guest.roster().host().unwrap().name, "Ana");
}

fn rooms_on(profile: &MemoryProfile) -> (RoomManager<MemoryBackend>, KeyedStore<MemoryBackend>) {
    let bus = ChangeBus::new();
    let store = KeyedStore::new(profile.open_context(&bus));
    (RoomManager::new(store.clone(), bus), store)
}

#[test]
fn test_joins_from_two_contexts_keep_both() {
    let profile = MemoryProfile::new();
    let (first, _) = rooms_on(&profile);
    let (second, _) = rooms_on(&profile);

    first.join(&room(), Identity::new(ClientId::new("a"), "Ana"), true);
    second.join(&room(), Identity::new(ClientId::new("b"), "Ben"), false);

    assert_eq!(first.roster(&room()).len(), 2);
    assert_eq!(second.roster(&room()).len(), 2);
}

#[test]
fn test_interleaved_roster_writes_last_writer_wins() {
    let profile = MemoryProfile::new();
    let (rooms, _) = rooms_on(&profile);
    let (_, ben_store) = rooms_on(&profile);
    let (_, cy_store) = rooms_on(&profile);
    rooms.join(&room(), Identity::new(ClientId::new("a"), "Ana"), true);
    let observer = rooms.observe(&room());

    // both contexts read before either writes
    let mut ben_view = ben_store.roster(&room());
    let mut cy_view = cy_store.roster(&room());
    ben_view.admit(Participant::new(Identity::new(ClientId::new("b"), "Ben"), false));
    cy_view.admit(Participant::new(Identity::new(ClientId::new("c"), "Cy"), false));
    ben_store.put_roster(&room(), &ben_view);
    cy_store.put_roster(&room(), &cy_view);

    let roster = rooms.roster(&room());
    assert_eq!(roster, cy_view);
    assert!(!roster.contains(&ClientId::new("b")));
    assert_eq!(observer.get(), cy_view);
}

#[test]
fn test_interleaved_rolls_last_writer_wins() {
    let profile = MemoryProfile::new();
    // hidden 16, Ana on 1, Ben on 5
    let a = memory_tab(&profile, "a", ScriptedDice::new([16, 1, 5], [1]));
    let b = memory_tab(&profile, "b", ScriptedDice::default());
    let host = a.enter(&create("Ana"), DEFAULT_CAPACITY).unwrap();
    let _guest = b.enter(&join("Ben"), DEFAULT_CAPACITY).unwrap();
    host.start().unwrap();

    let (_, one) = rooms_on(&profile);
    let (_, two) = rooms_on(&profile);
    let mut early = one.session(&room()).unwrap();
    let mut late = two.session(&room()).unwrap();
    early.players[0].pos = 2;
    early.turn_count += 1;
    late.players[0].pos = 4;
    late.turn_count += 1;
    one.put_session(&room(), &early);
    two.put_session(&room(), &late);

    let seen = host.session().unwrap();
    assert_eq!(seen, late);
    assert_eq!(seen.turn_count, 1);
}

#[test]
fn test_start_is_idempotent_across_tabs() {
    let profile = MemoryProfile::new();
    let a = memory_tab(&profile, "a", ScriptedDice::new([5, 1, 2], [1]));
    let a2 = memory_tab(&profile, "a", ScriptedDice::new([9, 10, 11], [1]));
    let b = memory_tab(&profile, "b", ScriptedDice::default());

    let host = a.enter(&create("Ana"), DEFAULT_CAPACITY).unwrap();
    let _guest = b.enter(&join("Ben"), DEFAULT_CAPACITY).unwrap();
    // same host identity open in a second tab
    let host_again = a2.enter(&create("Ana"), DEFAULT_CAPACITY).unwrap();

    let StartOutcome::Started(first) = host.start().unwrap() else {
        panic!("first start should create the session");
    };
    assert_eq!(
        host_again.start().unwrap(),
        StartOutcome::AlreadyStarted(first.clone())
    );
    assert_eq!(host_again.session(), Some(first));
}

#[test]
fn test_tabs_agree_on_turn_order() {
    let profile = MemoryProfile::new();
    // hidden 16, Ana on 1, Ben on 5, every roll a 1
    let a = memory_tab(&profile, "a", ScriptedDice::new([16, 1, 5], [1]));
    let b = memory_tab(&profile, "b", ScriptedDice::new(std::iter::empty(), [1]));

    let host = a.enter(&create("Ana"), DEFAULT_CAPACITY).unwrap();
    let guest = b.enter(&join("Ben"), DEFAULT_CAPACITY).unwrap();
    host.start().unwrap();

    assert_eq!(guest.board().turn_name.as_deref(), Some("Ana"));
    assert_eq!(host.roll().unwrap().player.name, "Ana");
    assert_eq!(host.board().turn_name.as_deref(), Some("Ben"));
    assert_eq!(guest.board().turn_name.as_deref(), Some("Ben"));

    // guest rolls from its own tab; both see the result
    let roll = guest.roll_own().unwrap();
    assert_eq!(roll.to(), 6);
    assert_eq!(host.board().tile(6).unwrap().occupants, vec!["Ben"]);
    assert!(matches!(guest.roll_own(), Err(Error::NotYourTurn { .. })));
}

#[test]
fn test_win_is_terminal_everywhere() {
    let profile = MemoryProfile::new();
    let a = memory_tab(&profile, "a", ScriptedDice::new([7, 3, 11], [4]));
    let b = memory_tab(&profile, "b", ScriptedDice::new(std::iter::empty(), [2]));

    let host = a.enter(&create("Ana"), DEFAULT_CAPACITY).unwrap();
    let guest = b.enter(&join("Ben"), DEFAULT_CAPACITY).unwrap();
    host.start().unwrap();
    assert!(host.roll().unwrap().is_win());

    assert!(matches!(guest.status(), GameStatus::Won { name, .. } if name == "Ana"));
    let frozen = guest.session();
    assert!(matches!(guest.roll(), Err(Error::GameOver { .. })));
    assert_eq!(host.session(), frozen);
}

#[test]
fn test_non_host_kick_changes_nothing() {
    let profile = MemoryProfile::new();
    let a = memory_tab(&profile, "a", ScriptedDice::default());
    let b = memory_tab(&profile, "b", ScriptedDice::default());
    let c = memory_tab(&profile, "c", ScriptedDice::default());

    let host = a.enter(&create("Ana"), DEFAULT_CAPACITY).unwrap();
    let ben = b.enter(&join("Ben"), DEFAULT_CAPACITY).unwrap();
    let _cy = c.enter(&join("Cy"), DEFAULT_CAPACITY).unwrap();

    let before = profile.raw("room_abc123_participants");
    assert_eq!(ben.kick("Cy"), KickOutcome::Unauthorized);
    assert_eq!(profile.raw("room_abc123_participants"), before);

    assert_eq!(host.kick("Cy"), KickOutcome::Kicked);
    assert_eq!(ben.roster().len(), 2);
}

#[test]
fn test_malformed_records_read_as_absent() {
    let profile = MemoryProfile::new();
    profile.inject_raw("room_abc123_participants", "{not json");
    profile.inject_raw("room_abc123_game", "[1,2,3]");
    let a = memory_tab(&profile, "a", ScriptedDice::default());

    let host = a.enter(&create("Ana"), DEFAULT_CAPACITY).unwrap();
    assert_eq!(host.roster().len(), 1);
    assert_eq!(host.status(), GameStatus::NotStarted);
}

#[test]
fn test_roster_with_repeated_client_keeps_first() {
    let profile = MemoryProfile::new();
    profile.inject_raw(
        "room_abc123_participants",
        r#"[{"clientId":"x","name":"X","isHost":true},
            {"clientId":"x","name":"X2","isHost":false}]"#,
    );
    let (rooms, _) = rooms_on(&profile);

    let roster = rooms.join(&room(), Identity::new(ClientId::new("b"), "Ben"), false);
    assert_eq!(roster.len(), 2);
    assert_eq!(roster.participants()[0].name, "X");
    assert_eq!(rooms.leave(&room(), &ClientId::new("x")).len(), 1);
}

#[test]
fn test_session_off_the_board_cannot_be_rolled() {
    let profile = MemoryProfile::new();
    profile.inject_raw(
        "room_abc123_game",
        r#"{"hiddenTile":0,"players":[{"clientId":"a","name":"A","pos":3}],"startedAt":0}"#,
    );
    let a = memory_tab(&profile, "a", ScriptedDice::new([7, 3], [1]));

    let host = a.enter(&create("Ana"), DEFAULT_CAPACITY).unwrap();
    assert_eq!(host.status(), GameStatus::NotStarted);
    assert!(matches!(host.roll(), Err(Error::GameNotReady)));
    // a host start replaces the unusable record
    assert!(matches!(host.start().unwrap(), StartOutcome::Started(_)));
    assert_eq!(host.session().unwrap().hidden_tile, 7);
}

#[test]
fn test_full_room_turns_guest_away() {
    let profile = MemoryProfile::new();
    let tabs: Vec<_> = ["a", "b", "c", "d", "e"]
        .iter()
        .map(|id| memory_tab(&profile, id, ScriptedDice::default()))
        .collect();

    let mut sessions = vec![tabs[0].enter(&create("P0"), DEFAULT_CAPACITY).unwrap()];
    for (i, tab) in tabs.iter().enumerate().take(4).skip(1) {
        sessions.push(tab.enter(&join(&format!("P{i}")), DEFAULT_CAPACITY).unwrap());
    }
    assert!(matches!(
        tabs[4].enter(&join("P4"), DEFAULT_CAPACITY),
        Err(Error::RoomFull { capacity: 4 })
    ));
    assert_eq!(sessions[0].roster().len(), 4);
}

#[test]
fn test_sqlite_tabs_sync_through_poller() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("tilehunt.db");

    let bus_a = ChangeBus::new();
    let store_a = SqliteBackend::open(&path).unwrap();
    let mut poller_a = StoragePoller::new(store_a.clone(), bus_a.clone());
    let a = Tab::with_dice(
        ClientId::new("a"),
        store_a,
        bus_a,
        ScriptedDice::new([7, 3, 11], [4]),
    );

    let bus_b = ChangeBus::new();
    let store_b = SqliteBackend::open(&path).unwrap();
    let mut poller_b = StoragePoller::new(store_b.clone(), bus_b.clone());
    let b = Tab::with_dice(ClientId::new("b"), store_b, bus_b, ScriptedDice::default());

    let host = a.enter(&create("Ana"), DEFAULT_CAPACITY).unwrap();
    let guest = b.enter(&join("Ben"), DEFAULT_CAPACITY).unwrap();
    assert_eq!(guest.roster().len(), 2);

    // host's observer is stale until its poller runs
    assert_eq!(host.roster().len(), 1);
    assert_eq!(poller_a.poll(), 1);
    assert_eq!(host.roster().len(), 2);

    host.start().unwrap();
    assert!(!guest.status().is_started());
    poller_b.poll();
    assert!(guest.status().is_started());

    drop(guest);
    poller_a.poll();
    assert_eq!(host.roster().len(), 1);
}
