//! Synthetic road networks for the inspector.
//!
//! Two small maps with different shapes:
//! a town street grid with a river bridge, and a winding mountain pass.

use rn_core::{MapId, NodeId, Position};
use rn_spatial::{NetworkBuilder, NetworkData, NodeFlags};

/// Street spacing of the town grid.
pub const BLOCK: f32 = 200.0;

/// Side length (in intersections) of the town grid.
pub const TOWN_SIDE: usize = 6;

/// Build a `TOWN_SIDE × TOWN_SIDE` street grid centred on the origin.
///
/// The river runs between columns 2 and 3; only row 1 has a bridge, so
/// crossing anywhere else means a detour.
pub fn build_town(map_id: MapId) -> NetworkData {
    let mut b = NetworkBuilder::with_capacity(TOWN_SIDE * TOWN_SIDE, 2 * TOWN_SIDE * TOWN_SIDE);
    let origin = -BLOCK * (TOWN_SIDE as f32 - 1.0) / 2.0;

    let mut ids = Vec::with_capacity(TOWN_SIDE * TOWN_SIDE);
    for row in 0..TOWN_SIDE {
        for col in 0..TOWN_SIDE {
            let mut flags = NodeFlags::TOWN;
            let border = row == 0 || col == 0 || row == TOWN_SIDE - 1 || col == TOWN_SIDE - 1;
            flags |= if border { NodeFlags::ENDPOINT } else { NodeFlags::JUNCTION };
            let pos = Position::new(origin + col as f32 * BLOCK, origin + row as f32 * BLOCK, 0.0);
            ids.push(b.add_node(pos, flags));
        }
    }
    let at = |row: usize, col: usize| ids[row * TOWN_SIDE + col];

    for row in 0..TOWN_SIDE {
        for col in 0..TOWN_SIDE {
            if col + 1 < TOWN_SIDE && (col != 2 || row == 1) {
                b.add_road(at(row, col), at(row, col + 1), []);
            }
            if row + 1 < TOWN_SIDE {
                b.add_road(at(row, col), at(row + 1, col), []);
            }
        }
    }
    b.build(map_id)
}

/// Endpoints of the mountain pass: `(valley, summit)`.
pub fn build_pass(map_id: MapId) -> (NetworkData, [NodeId; 2]) {
    let mut b = NetworkBuilder::new();

    let valley = b.add_node(Position::new(-2_000.0, -1_500.0, 40.0), NodeFlags::ENDPOINT);
    let bend   = b.add_node(Position::new(-1_200.0, -600.0, 180.0), NodeFlags::empty());
    let bridge = b.add_node(Position::new(-400.0, -500.0, 260.0), NodeFlags::BRIDGE);
    let summit = b.add_node(Position::new(600.0, 400.0, 520.0), NodeFlags::ENDPOINT);
    let hut    = b.add_node(Position::new(200.0, 900.0, 480.0), NodeFlags::ENDPOINT);

    // Switchbacks up from the valley.
    let switchbacks: Vec<Position> = (1..8)
        .map(|i| {
            let t = i as f32 / 8.0;
            let swing = if i % 2 == 0 { 150.0 } else { -150.0 };
            Position::new(-2_000.0 + 800.0 * t + swing, -1_500.0 + 900.0 * t, 40.0 + 140.0 * t)
        })
        .collect();
    b.add_road(valley, bend, switchbacks);
    b.add_road(bend, bridge, [Position::new(-800.0, -450.0, 230.0)]);
    b.add_road(bridge, summit, [Position::new(0.0, -200.0, 330.0), Position::new(300.0, 100.0, 450.0)]);
    b.add_road(summit, hut, []);

    (b.build(map_id), [valley, summit])
}
