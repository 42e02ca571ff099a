//! Bot-vs-bot match between two local sessions synchronized over the relay.
//!
//! Run with `cargo run -p chess-sandbox-relay --example local_match`.

use rand::rngs::StdRng;
use rand::SeedableRng;
use shakmaty::Color;

use chess_sandbox_core::{summarize_position, GameStatus, Session};
use chess_sandbox_relay::RelayHub;

fn main() {
    tracing_subscriber::fmt::init();

    let hub = RelayHub::new();
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);

    let mut host = Session::new();
    let mut guest = Session::new();

    let room = host.host_room(Some(&hub), &mut rng).expect("relay is available");
    guest.join_room(Some(&hub), &room).expect("room exists");
    println!("Room {} open, host plays white", room);

    for ply in 1..=120 {
        let mover = if host.turn() == Color::White {
            &mut host
        } else {
            &mut guest
        };
        let status = match mover.bot_move(&mut rng).expect("position stays playable") {
            Some(status) => status,
            None => break,
        };

        host.pump();
        guest.pump();
        assert_eq!(host.position(), guest.position(), "peers diverged");

        if let Some(note) = host.status() {
            println!("ply {}: {}", ply, note);
        }
        match status {
            GameStatus::Ongoing => {}
            GameStatus::Checkmate => {
                println!("checkmate after {} plies", ply);
                break;
            }
            GameStatus::Stalemate => {
                println!("stalemate after {} plies", ply);
                break;
            }
        }
    }

    let summary = summarize_position(host.position()).expect("final position loads");
    println!(
        "final position: {} pieces, {} legal moves for {}",
        summary.piece_count, summary.legal_move_count, summary.side_to_move
    );
    println!("{}", host.position());
}
