//! End-to-end: two sessions synchronized over the in-process relay.

use rand::rngs::StdRng;
use rand::SeedableRng;
use shakmaty::{Color, Square};

use chess_sandbox_core::{GameStatus, MoveMessage, RuleMode, Session, MOVE_KIND};
use chess_sandbox_core::sync::Transport;
use chess_sandbox_relay::RelayHub;

#[test]
fn test_host_and_join_share_moves() {
    let hub = RelayHub::new();
    let mut rng = StdRng::seed_from_u64(11);

    let mut host = Session::new();
    let mut guest = Session::new();

    let room = host.host_room(Some(&hub), &mut rng).unwrap();
    guest.join_room(Some(&hub), &room).unwrap();
    assert_eq!(host.local_color(), Some(Color::White));
    assert_eq!(guest.local_color(), Some(Color::Black));
    assert_eq!(hub.peer_count(&room), 2);

    host.try_move(Square::E2, Square::E4, None).unwrap();
    assert_eq!(guest.pump(), 1);
    assert_eq!(guest.position(), host.position());
    assert_eq!(guest.turn(), Color::Black);

    guest.try_move(Square::E7, Square::E5, None).unwrap();
    assert_eq!(host.pump(), 1);
    assert_eq!(host.position(), guest.position());
    assert_eq!(host.turn(), Color::White);
}

#[test]
fn test_duplicate_delivery_is_idempotent() {
    let hub = RelayHub::new();
    let mut rng = StdRng::seed_from_u64(12);

    let mut host = Session::new();
    let mut guest = Session::new();
    let room = host.host_room(Some(&hub), &mut rng).unwrap();
    guest.join_room(Some(&hub), &room).unwrap();

    host.try_move(Square::G1, Square::F3, None).unwrap();
    assert_eq!(guest.pump(), 1);
    let after_once = guest.position().to_string();

    // A flaky transport redelivers the same message.
    let replayer = hub.open_channel(&room).unwrap();
    let msg = MoveMessage {
        from: Square::G1,
        to: Square::F3,
        description: "g1f3".to_string(),
        resulting_position: after_once.clone(),
    };
    let payload = serde_json::to_value(&msg).unwrap();
    replayer.send(MOVE_KIND, payload.clone());
    replayer.send(MOVE_KIND, payload);

    assert_eq!(guest.pump(), 2);
    assert_eq!(guest.position(), after_once);
}

#[test]
fn test_corrupt_message_is_dropped() {
    let hub = RelayHub::new();
    let mut rng = StdRng::seed_from_u64(13);

    let mut host = Session::new();
    let mut guest = Session::new();
    let room = host.host_room(Some(&hub), &mut rng).unwrap();
    guest.join_room(Some(&hub), &room).unwrap();
    let before = guest.position().to_string();

    let saboteur = hub.open_channel(&room).unwrap();
    saboteur.send(MOVE_KIND, serde_json::json!({"from": "e2"}));
    saboteur.send(
        MOVE_KIND,
        serde_json::json!({
            "from": "e2",
            "to": "e4",
            "description": "e2e4",
            "resultingPosition": "8/8/8 nonsense",
        }),
    );

    assert_eq!(guest.pump(), 0);
    assert_eq!(guest.position(), before);
}

#[test]
fn test_freeform_position_replaces_wholesale() {
    let hub = RelayHub::new();
    let mut rng = StdRng::seed_from_u64(14);

    let mut host = Session::new();
    let mut guest = Session::new();
    let room = host.host_room(Some(&hub), &mut rng).unwrap();
    guest.join_room(Some(&hub), &room).unwrap();

    // Host commits an illegal setup as freeform and teleports a piece.
    host.enter_edit();
    host.commit_edit(
        RuleMode::Freeform,
        Color::White,
        chess_sandbox_core::CastlingRights::none(),
    )
    .unwrap();
    host.try_move(Square::A1, Square::A8, None).unwrap();

    assert_eq!(guest.pump(), 1);
    assert_eq!(guest.mode(), RuleMode::Freeform);
    assert_eq!(guest.position(), host.position());
}

#[test]
fn test_bot_match_stays_consistent() {
    let hub = RelayHub::new();
    let mut rng = StdRng::seed_from_u64(15);

    let mut host = Session::new();
    let mut guest = Session::new();
    let room = host.host_room(Some(&hub), &mut rng).unwrap();
    guest.join_room(Some(&hub), &room).unwrap();

    // Bots alternate sides for a while; both peers must agree throughout.
    for _ in 0..20 {
        let mover = if host.turn() == Color::White {
            &mut host
        } else {
            &mut guest
        };
        let status = mover.bot_move(&mut rng).unwrap();
        host.pump();
        guest.pump();
        assert_eq!(host.position(), guest.position());
        match status {
            Some(GameStatus::Ongoing) => {}
            _ => break,
        }
    }
}
