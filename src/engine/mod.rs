//! The two geometry engines and the seam the render loop drives them
//! through.

pub mod branching;
pub mod triangle;

use std::time::Duration;

use crossterm::style::Color;

use crate::canvas::Canvas;
use crate::command::Command;

/// One frame-advancing geometry generator.
///
/// The render worker owns the engine. Commands are handed over only
/// between frames; `advance_frame` then runs with settled parameters and
/// paints into the persistent canvas.
pub trait Engine: Send {
    fn name(&self) -> &'static str;

    /// Apply one staged command. Must never touch the canvas; anything
    /// visual is deferred to the next `advance_frame`.
    fn handle_command(&mut self, cmd: Command);

    /// Paint one frame into the canvas and step the internal state.
    fn advance_frame(&mut self, canvas: &mut Canvas);

    /// Current sleep between frames (the anti-speed).
    fn frame_interval(&self) -> Duration;
}

const fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color::Rgb { r, g, b }
}

/// Paint colors the branching animation cycles through. Index 0 is the
/// initial color; `change-color` and rainbow mode advance round-robin.
pub const BRANCH_PALETTE: [Color; 11] = [
    rgb(0xe1, 0xe1, 0xe1),
    rgb(0xff, 0xff, 0xff),
    rgb(0xf7, 0x13, 0x00),
    rgb(0xea, 0xe0, 0x00),
    rgb(0x00, 0x6a, 0x28),
    rgb(0xff, 0x65, 0xa3),
    rgb(0x00, 0x00, 0x00),
    rgb(0x00, 0x9d, 0x0e),
    rgb(0x8f, 0xbb, 0xff),
    rgb(0xd5, 0x92, 0x00),
    rgb(0x41, 0x00, 0xff),
];

pub const BRANCH_BACKGROUND: Color = rgb(0x00, 0x66, 0xff);

/// Colors assigned to triangles as they are created, round-robin.
pub const TRIANGLE_PALETTE: [Color; 8] = [
    rgb(0xe1, 0xe1, 0xe1),
    rgb(0x00, 0x00, 0x00),
    rgb(0x63, 0x5e, 0xa7),
    rgb(0xf7, 0x8e, 0x00),
    rgb(0xff, 0x18, 0x00),
    rgb(0xea, 0xe0, 0x00),
    rgb(0xff, 0x5a, 0x88),
    rgb(0x33, 0x82, 0x3a),
];

pub const TRIANGLE_BACKGROUND: Color = rgb(0x1e, 0x90, 0xff);

/// Background cycle for seizure mode, doubled entries slowing the strobe.
pub const SEIZURE_BACKGROUNDS: [Color; 6] = [
    rgb(0xff, 0xff, 0x00),
    rgb(0xff, 0xff, 0x00),
    rgb(0xff, 0x69, 0xb4),
    rgb(0xff, 0x69, 0xb4),
    rgb(0x6b, 0x8e, 0x23),
    rgb(0x6b, 0x8e, 0x23),
];

/// Anti-speed phase tables: sleep per frame in milliseconds. `faster`
/// walks toward index 0, `slower` toward the end; both clamp.
pub const BRANCH_INTERVALS_MS: [u64; 8] = [7, 50, 95, 140, 205, 270, 400, 1000];
pub const BRANCH_DEFAULT_INTERVAL: usize = 3;

pub const TRIANGLE_INTERVALS_MS: [u64; 8] = [1, 9, 19, 29, 50, 90, 200, 500];
pub const TRIANGLE_DEFAULT_INTERVAL: usize = 2;

/// Resolve an optional user seed: explicit for reproducibility,
/// otherwise the UNIX clock.
pub(crate) fn seed_or_clock(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    })
}
