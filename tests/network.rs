//! Protocol behavior across several tiles, one packet at a time.

mod common;

use common::Mesh;
use hexir::config::TileConfig;
use hexir::error::DatagramError;
use hexir::sleep::SleepState;

fn fast_sleep() -> TileConfig {
    let mut config = TileConfig::new();
    config.sleep_timeout_ms = 10_000;
    config
}

#[test]
fn datagram_delivered_exactly_once_over_a_lossy_link() {
    let mut mesh = Mesh::new(2, TileConfig::new());
    mesh.connect((0, 0), (1, 3));
    mesh.lose_every(3);

    let mut received = Vec::new();
    for round in 0..10u8 {
        assert_eq!(mesh.tiles[0].send_datagram(0, &[round, round]), Ok(()));
        mesh.run(2_000, |index, tile| {
            if index == 1 && tile.is_datagram_ready(3) {
                received.push(tile.datagram(3).to_vec());
                tile.consume_datagram(3);
            }
        });
        assert!(!mesh.tiles[0].is_datagram_pending(0), "round {round}");
    }

    let expected: Vec<Vec<u8>> = (0..10).map(|round| vec![round, round]).collect();
    assert_eq!(received, expected);
}

#[test]
fn unread_datagram_holds_back_the_next_one() {
    let mut mesh = Mesh::new(2, TileConfig::new());
    mesh.connect((0, 2), (1, 5));

    assert_eq!(mesh.tiles[0].send_datagram(2, &[1]), Ok(()));
    mesh.run(50, |_, _| {});
    assert!(mesh.tiles[1].is_datagram_ready(5));
    assert!(!mesh.tiles[0].is_datagram_pending(2));

    assert_eq!(mesh.tiles[0].send_datagram(2, &[2]), Ok(()));
    assert_eq!(
        mesh.tiles[0].send_datagram(2, &[3]),
        Err(DatagramError::Pending)
    );
    mesh.run(1_000, |_, _| {});
    // nobody read the first one, so the second is neither stored nor acked
    assert_eq!(mesh.tiles[1].datagram(5), &[1]);
    assert!(mesh.tiles[0].is_datagram_pending(2));

    mesh.tiles[1].consume_datagram(5);
    mesh.run(50, |_, _| {});
    assert_eq!(mesh.tiles[1].datagram(5), &[2]);
    assert!(!mesh.tiles[0].is_datagram_pending(2));
}

#[test]
fn given_up_datagram_frees_the_face() {
    let mut mesh = Mesh::new(2, TileConfig::new());
    assert_eq!(mesh.tiles[0].send_datagram(1, &[9]), Ok(()));
    mesh.run(500, |_, _| {});
    // no neighbor, no ack
    assert!(mesh.tiles[0].is_datagram_pending(1));
    mesh.tiles[0].reset_pending_datagram(1);
    assert_eq!(mesh.tiles[0].send_datagram(1, &[10]), Ok(()));
}

#[test]
fn sleep_spreads_to_every_tile_and_wake_spreads_back() {
    let mut mesh = Mesh::chain(6, TileConfig::new());
    mesh.run(200, |_, _| {});
    mesh.tiles[2].enter_sleep();
    mesh.run(500, |_, _| {});
    assert!(mesh.tiles.iter().all(|tile| tile.sleep_state() == SleepState::Asleep));

    mesh.run(5_000, |_, _| {});
    assert!(mesh.tiles.iter().all(|tile| tile.sleep_state() == SleepState::Asleep));

    mesh.fingers[5].press();
    mesh.run(500, |_, _| {});
    assert!(mesh.tiles.iter().all(|tile| tile.sleep_state() == SleepState::Active));
    assert!(mesh.tiles.iter_mut().all(|tile| tile.has_woken()));
}

#[test]
fn idle_network_falls_asleep_together() {
    let mut mesh = Mesh::chain(3, fast_sleep());
    mesh.run(9_000, |_, _| {});
    assert!(mesh.tiles.iter().all(|tile| tile.sleep_state() == SleepState::Active));
    mesh.run(2_000, |_, _| {});
    assert!(mesh.tiles.iter().all(|tile| tile.sleep_state() == SleepState::Asleep));
}

#[test]
fn button_press_keeps_the_whole_network_awake() {
    let mut mesh = Mesh::chain(4, fast_sleep());
    for _ in 0..4 {
        mesh.run(6_000, |_, _| {});
        mesh.fingers[0].press();
    }
    // 24 s in, well past the timeout, and the far end is still awake
    mesh.run(100, |_, _| {});
    assert!(mesh.now() > 24_000);
    assert!(mesh.tiles.iter().all(|tile| tile.sleep_state() == SleepState::Active));

    // without presses everything goes to sleep
    mesh.run(11_000, |_, _| {});
    assert!(mesh.tiles.iter().all(|tile| tile.sleep_state() == SleepState::Asleep));
}

#[test]
fn sleeping_tile_time_is_hidden_from_the_app() {
    let mut mesh = Mesh::new(1, TileConfig::new());
    mesh.run(100, |_, _| {});
    let before = mesh.tiles[0].millis();
    mesh.tiles[0].enter_sleep();
    mesh.run(60_000, |_, _| {});
    mesh.fingers[0].press();
    mesh.run(100, |_, _| {});
    assert_eq!(mesh.tiles[0].sleep_state(), SleepState::Active);
    assert!(mesh.tiles[0].millis() - before < 200);
}
