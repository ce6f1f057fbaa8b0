//! Simulated tiles for the integration tests.
//!
//! Two levels of simulation:
//!
//! - [`Air`] carries flashes between [`Eye`] transceivers in simulated
//!   nanoseconds, so whole [`IrPort`]s and tiles built on them can talk. Every
//!   tile has its own tick length, so clocks can drift apart, and every link
//!   has its own delay between a flash and its arrival.
//! - [`Mesh`] moves whole packets between tiles instantly, for tests about
//!   the protocol above the port.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use hexir::config::{PortConfig, TileConfig};
use hexir::consts::{FACE_COUNT, IR_TICK_US};
use hexir::error::SendError;
use hexir::link::PacketLink;
use hexir::packet::Packet;
use hexir::peripherals::{Button, ButtonState, FaceDisplay, RGB8};
use hexir::port::IrPort;
use hexir::tile::Tile;
use hexir::time::{Clock, Millis};
use hexir::transceiver::{FaceMask, IrTransceiver, face_bit};

/// A face on a tile: `(tile, face)`.
pub type Spot = (usize, usize);

/// Light needs at least this long to cross between two faces.
const FLIGHT_NS: u64 = 1_000;

#[derive(Debug, Clone, Copy)]
struct Peer {
    spot: Spot,
    phase_us: u32,
}

/// The light between tiles.
#[derive(Debug, Default)]
pub struct Air {
    now_ns: u64,
    /// Per tile and face, arrival times of flashes nobody has sampled yet.
    arriving: Vec<[Vec<u64>; FACE_COUNT]>,
    peers: Vec<[Option<Peer>; FACE_COUNT]>,
    /// Per tile and face, flashes sent towards it so far, lost ones included.
    sent: Vec<[u32; FACE_COUNT]>,
    /// Flashes that never arrive, by spot and running count.
    lost: Vec<(Spot, u32)>,
}

impl Air {
    /// Creates the air around `tiles` unconnected tiles.
    pub fn new(tiles: usize) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            now_ns: 0,
            arriving: (0..tiles).map(|_| Default::default()).collect(),
            peers: vec![[None; FACE_COUNT]; tiles],
            sent: vec![[0; FACE_COUNT]; tiles],
            lost: Vec::new(),
        }))
    }

    /// Puts `a` and `b` face to face. Flashes arrive `phase_us` after they
    /// were sent, in both directions.
    pub fn connect(&mut self, a: Spot, b: Spot, phase_us: u32) {
        self.peers[a.0][a.1] = Some(Peer { spot: b, phase_us });
        self.peers[b.0][b.1] = Some(Peer { spot: a, phase_us });
    }

    /// Pulls `a` away from its neighbor.
    pub fn disconnect(&mut self, a: Spot) {
        if let Some(peer) = self.peers[a.0][a.1].take() {
            self.peers[peer.spot.0][peer.spot.1] = None;
        }
    }

    /// Simulated time in nanoseconds.
    pub fn now_ns(&self) -> u64 {
        self.now_ns
    }

    /// The `nth` flash (counting from 0) sent towards `spot` from now on
    /// never arrives.
    pub fn lose_flash(&mut self, spot: Spot, nth: u32) {
        let sent = self.sent[spot.0][spot.1];
        self.lost.push((spot, sent + nth));
    }

    /// `true` if light reached `spot` since it last looked.
    fn take_light(&mut self, spot: Spot) -> bool {
        let now = self.now_ns;
        let arriving = &mut self.arriving[spot.0][spot.1];
        let before = arriving.len();
        arriving.retain(|&at| at > now);
        arriving.len() != before
    }

    fn flash(&mut self, from: Spot) {
        let Some(peer) = self.peers[from.0][from.1] else {
            return;
        };
        let to = peer.spot;
        let index = self.sent[to.0][to.1];
        self.sent[to.0][to.1] += 1;
        if let Some(at) = self.lost.iter().position(|&lost| lost == (to, index)) {
            let _ = self.lost.swap_remove(at);
            return;
        }
        let at = self.now_ns + FLIGHT_NS + u64::from(peer.phase_us) * 1_000;
        self.arriving[to.0][to.1].push(at);
    }
}

/// The six face LEDs of one simulated tile.
#[derive(Debug, Clone)]
pub struct Eye {
    air: Rc<RefCell<Air>>,
    tile: usize,
}

impl Eye {
    /// LEDs of tile `tile`.
    pub fn new(air: &Rc<RefCell<Air>>, tile: usize) -> Self {
        Self {
            air: Rc::clone(air),
            tile,
        }
    }
}

impl IrTransceiver for Eye {
    fn sample(&mut self) -> FaceMask {
        let mut air = self.air.borrow_mut();
        (0..FACE_COUNT)
            .filter(|&face| air.take_light((self.tile, face)))
            .fold(0, |mask, face| mask | face_bit(face))
    }

    fn flash(&mut self, faces: FaceMask) {
        let mut air = self.air.borrow_mut();
        for face in (0..FACE_COUNT).filter(|&face| faces & face_bit(face) != 0) {
            air.flash((self.tile, face));
        }
    }
}

/// One timer interrupt per tile, each running at its own rate.
#[derive(Debug, Clone)]
pub struct Clocks {
    tick_ns: Vec<u64>,
    next_ns: Vec<u64>,
}

impl Clocks {
    /// `count` clocks ticking every [`IR_TICK_US`], all in step.
    pub fn new(count: usize) -> Self {
        Self {
            tick_ns: vec![u64::from(IR_TICK_US) * 1_000; count],
            next_ns: vec![0; count],
        }
    }

    /// Makes `tile`'s ticks `permille` thousandths longer (negative: shorter).
    pub fn skew(&mut self, tile: usize, permille: i32) {
        let nominal = i64::from(IR_TICK_US) * 1_000;
        self.tick_ns[tile] = (nominal * (1_000 + i64::from(permille)) / 1_000) as u64;
    }

    /// The tile whose interrupt fires next, and when. Ties go to the lower index.
    fn next(&self) -> (usize, u64) {
        self.next_ns
            .iter()
            .copied()
            .enumerate()
            .min_by_key(|&(tile, at)| (at, tile))
            .unwrap_or((0, u64::MAX))
    }

    /// Moves `tile` on to its next tick.
    fn advance(&mut self, tile: usize) {
        self.next_ns[tile] += self.tick_ns[tile];
    }
}

/// Bare ports on shared air.
#[derive(Debug)]
pub struct Bench {
    pub air: Rc<RefCell<Air>>,
    pub ports: Vec<IrPort<Eye>>,
    pub clocks: Clocks,
}

impl Bench {
    /// `count` unconnected ports.
    pub fn new(count: usize, config: PortConfig) -> Self {
        let air = Air::new(count);
        let ports = (0..count)
            .map(|tile| IrPort::new(Eye::new(&air, tile), config))
            .collect();
        Self {
            air,
            ports,
            clocks: Clocks::new(count),
        }
    }

    /// Simulated milliseconds since the start.
    pub fn elapsed_ms(&self) -> u64 {
        self.air.borrow().now_ns() / 1_000_000
    }

    /// Fires the next timer interrupt, on whichever port it belongs to.
    pub fn step(&mut self) {
        let (port, at) = self.clocks.next();
        self.air.borrow_mut().now_ns = at;
        self.ports[port].tick();
        self.clocks.advance(port);
    }

    /// Steps until `done` holds, for at most `limit_ms`. Returns the
    /// milliseconds taken.
    pub fn run_until(
        &mut self,
        limit_ms: u32,
        mut done: impl FnMut(&mut Self) -> bool,
    ) -> Option<u64> {
        let start = self.air.borrow().now_ns();
        let end = start + u64::from(limit_ms) * 1_000_000;
        while self.air.borrow().now_ns() < end {
            if done(self) {
                return Some((self.air.borrow().now_ns() - start) / 1_000_000);
            }
            self.step();
        }
        None
    }

    /// Steps for `ms` milliseconds.
    pub fn run(&mut self, ms: u32) {
        let _ = self.run_until(ms, |_| false);
    }
}

/// Back buffer and screen of one tile.
#[derive(Debug, Default)]
pub struct Screen {
    back: [RGB8; FACE_COUNT],
    pub shown: [RGB8; FACE_COUNT],
}

impl FaceDisplay for Screen {
    fn pixels(&self) -> [RGB8; FACE_COUNT] {
        self.back
    }

    fn set_pixels(&mut self, pixels: &[RGB8; FACE_COUNT]) {
        self.back = *pixels;
    }

    fn commit(&mut self) {
        self.shown = self.back;
    }
}

/// A button pressed from the outside.
#[derive(Debug, Default, Clone)]
pub struct Finger {
    next: Rc<Cell<ButtonState>>,
}

impl Finger {
    /// A single short press, seen on the next loop iteration.
    pub fn press(&self) {
        self.next.set(ButtonState {
            pressed: true,
            ..ButtonState::default()
        });
    }

    /// Six seconds of holding, seen on the next loop iteration.
    pub fn hold(&self) {
        self.next.set(ButtonState {
            down: true,
            long_pressed: true,
            hold_6s: true,
            ..ButtonState::default()
        });
    }
}

impl Button for Finger {
    fn snapshot(&mut self) -> ButtonState {
        self.next.take()
    }
}

/// Tiles talking over simulated light.
pub type LitTile = Tile<IrPort<Eye>, Screen, Finger>;

/// Loop iterations run every this many of a tile's own ticks (about 1 ms).
const TICKS_PER_LOOP: u32 = 8;

/// A cluster of tiles over [`Air`], each running on its own clock.
#[derive(Debug)]
pub struct Cluster {
    pub air: Rc<RefCell<Air>>,
    pub tiles: Vec<LitTile>,
    pub fingers: Vec<Finger>,
    pub clocks: Clocks,
    ticks: Vec<u32>,
}

impl Cluster {
    /// `count` unconnected tiles.
    pub fn new(count: usize, config: TileConfig) -> Self {
        let air = Air::new(count);
        let fingers: Vec<Finger> = (0..count).map(|_| Finger::default()).collect();
        let tiles = (0..count)
            .map(|tile| {
                let port = IrPort::new(Eye::new(&air, tile), PortConfig::new());
                Tile::new(port, Screen::default(), fingers[tile].clone(), config)
            })
            .collect();
        Self {
            air,
            tiles,
            fingers,
            clocks: Clocks::new(count),
            ticks: vec![0; count],
        }
    }

    /// Puts tiles `a` and `b` face to face.
    pub fn connect(&mut self, a: Spot, b: Spot, phase_us: u32) {
        self.air.borrow_mut().connect(a, b, phase_us);
    }

    /// Tiles `0..count` in a line, face 0 of each touching face 3 of the next.
    pub fn chain(count: usize, config: TileConfig) -> Self {
        let mut cluster = Self::new(count, config);
        for tile in 1..count {
            cluster.connect((tile - 1, 0), (tile, 3), 100 * tile as u32);
        }
        cluster
    }

    /// Makes `tile`'s clock run `permille` thousandths slow (negative: fast).
    pub fn skew(&mut self, tile: usize, permille: i32) {
        self.clocks.skew(tile, permille);
    }

    /// Simulated milliseconds since the start.
    pub fn elapsed_ms(&self) -> u64 {
        self.air.borrow().now_ns() / 1_000_000
    }

    /// Runs for `ms` milliseconds. Every tile ticks on its own clock and
    /// runs its loop, with `app`, every [`TICKS_PER_LOOP`] of its ticks.
    pub fn run(&mut self, ms: u32, mut app: impl FnMut(usize, &mut LitTile)) {
        let end = self.air.borrow().now_ns() + u64::from(ms) * 1_000_000;
        loop {
            let (index, at) = self.clocks.next();
            if at >= end {
                break;
            }
            self.air.borrow_mut().now_ns = at;
            let tile = &mut self.tiles[index];
            tile.link_mut().tick();
            self.clocks.advance(index);

            self.ticks[index] += 1;
            if self.ticks[index] % TICKS_PER_LOOP == 0 {
                let _ = tile.run_once(|tile| app(index, tile));
            }
        }
        self.air.borrow_mut().now_ns = end;
    }

    /// Runs until `done` holds, at most `limit_ms`. Returns the milliseconds taken.
    pub fn run_until(
        &mut self,
        limit_ms: u32,
        mut done: impl FnMut(&mut Self) -> bool,
    ) -> Option<u64> {
        let start = self.elapsed_ms();
        while self.elapsed_ms() - start < u64::from(limit_ms) {
            if done(self) {
                return Some(self.elapsed_ms() - start);
            }
            self.run(1, |_, _| {});
        }
        None
    }
}

/// Packets in flight between tiles on a [`Mesh`].
#[derive(Debug, Default)]
pub struct MeshState {
    now: Millis,
    inbox: Vec<[Option<Packet>; FACE_COUNT]>,
    activity: Vec<u8>,
    peers: Vec<[Option<Spot>; FACE_COUNT]>,
    /// Every `n`-th packet is lost.
    lose_every: Option<u32>,
    sent: u32,
    /// Packets delivered, per receiving spot.
    pub delivered: Vec<(Spot, Vec<u8>)>,
}

impl MeshState {
    fn deliver(&mut self, from: Spot, payload: &[u8]) {
        let Some(to) = self.peers[from.0][from.1] else {
            return;
        };
        self.sent += 1;
        if let Some(n) = self.lose_every {
            if self.sent % n == 0 {
                return;
            }
        }
        self.activity[to.0] |= face_bit(to.1);
        let slot = &mut self.inbox[to.0][to.1];
        if slot.is_none() {
            *slot = Packet::from_slice(payload).ok();
            self.delivered.push((to, payload.to_vec()));
        }
    }
}

/// One tile's view of a [`Mesh`].
#[derive(Debug, Clone)]
pub struct MeshLink {
    state: Rc<RefCell<MeshState>>,
    tile: usize,
}

impl PacketLink for MeshLink {
    fn take_packet(&mut self, face: usize) -> Option<Packet> {
        self.state.borrow_mut().inbox[self.tile][face].take()
    }

    fn take_activity(&mut self, face: usize) -> bool {
        let mut state = self.state.borrow_mut();
        let seen = state.activity[self.tile] & face_bit(face) != 0;
        state.activity[self.tile] &= !face_bit(face);
        seen
    }

    fn send_packet(&mut self, face: usize, payload: &[u8]) -> Result<(), SendError> {
        if payload.is_empty() {
            return Err(SendError::Empty);
        }
        self.state.borrow_mut().deliver((self.tile, face), payload);
        Ok(())
    }

    fn discard_packets(&mut self) {
        let mut state = self.state.borrow_mut();
        state.inbox[self.tile] = Default::default();
        state.activity[self.tile] = 0;
    }
}

impl Clock for MeshLink {
    fn millis(&self) -> Millis {
        self.state.borrow().now
    }
}

/// Tiles exchanging whole packets.
pub type MeshTile = Tile<MeshLink, Screen, Finger>;

/// Tiles exchanging whole packets instantly, one loop iteration per millisecond.
#[derive(Debug)]
pub struct Mesh {
    pub state: Rc<RefCell<MeshState>>,
    pub tiles: Vec<MeshTile>,
    pub fingers: Vec<Finger>,
}

impl Mesh {
    /// `count` unconnected tiles.
    pub fn new(count: usize, config: TileConfig) -> Self {
        let state = Rc::new(RefCell::new(MeshState {
            inbox: (0..count).map(|_| Default::default()).collect(),
            activity: vec![0; count],
            peers: vec![[None; FACE_COUNT]; count],
            ..MeshState::default()
        }));
        let fingers: Vec<Finger> = (0..count).map(|_| Finger::default()).collect();
        let tiles = (0..count)
            .map(|tile| {
                let link = MeshLink {
                    state: Rc::clone(&state),
                    tile,
                };
                Tile::new(link, Screen::default(), fingers[tile].clone(), config)
            })
            .collect();
        Self {
            state,
            tiles,
            fingers,
        }
    }

    /// Tiles `0..count` in a line, face 0 of each touching face 3 of the next.
    pub fn chain(count: usize, config: TileConfig) -> Self {
        let mesh = Self::new(count, config);
        for tile in 1..count {
            mesh.connect((tile - 1, 0), (tile, 3));
        }
        mesh
    }

    /// Puts `a` and `b` face to face.
    pub fn connect(&self, a: Spot, b: Spot) {
        let mut state = self.state.borrow_mut();
        state.peers[a.0][a.1] = Some(b);
        state.peers[b.0][b.1] = Some(a);
    }

    /// Loses every `n`-th packet sent from now on.
    pub fn lose_every(&self, n: u32) {
        self.state.borrow_mut().lose_every = Some(n);
    }

    /// Current mesh time.
    pub fn now(&self) -> Millis {
        self.state.borrow().now
    }

    /// Runs every tile loop once per millisecond for `ms` milliseconds.
    pub fn run(&mut self, ms: u32, mut app: impl FnMut(usize, &mut MeshTile)) {
        for _ in 0..ms {
            self.state.borrow_mut().now += 1;
            for (index, tile) in self.tiles.iter_mut().enumerate() {
                let _ = tile.run_once(|tile| app(index, tile));
            }
        }
    }
}
