use std::f64::consts::PI;
use std::mem;
use std::time::Duration;

use rand::prelude::*;

use crate::canvas::Canvas;
use crate::command::Command;
use crate::config::BranchingOptions;
use crate::input::PointerFilter;

use super::{
    seed_or_clock, Engine, BRANCH_BACKGROUND, BRANCH_INTERVALS_MS, BRANCH_PALETTE,
};

/// Pointer smoothing constant for this animation.
const CENTER_SMOOTHING: f64 = 13.1;

/// A start point of the live generation, with the two directions its
/// children will head in. Directions are in half-turn units (multiples
/// of pi). A point lives for exactly one frame.
#[derive(Debug, Clone, Copy)]
pub struct BranchPoint {
    pub x: f64,
    pub y: f64,
    pub dir1: f64,
    pub dir2: f64,
}

/// Lines stemming out from a movable center, each spawning two more at a
/// semi-random angle. Generations double every frame until the iteration
/// cap re-seeds the growth from the center, on top of the old drawing.
pub struct BranchingEngine {
    rng: StdRng,
    start_points: Vec<BranchPoint>,
    next_points: Vec<BranchPoint>,
    iterations: u32,
    max_iterations: u32,
    line_length: f64,
    interval_index: usize,
    color_index: usize,
    rainbow: bool,
    center: PointerFilter,
    first_frame: bool,
    keep_center: bool,
}

impl BranchingEngine {
    pub fn new(options: BranchingOptions) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed_or_clock(options.seed)),
            start_points: Vec::new(),
            next_points: Vec::new(),
            iterations: 1,
            max_iterations: options.max_iterations,
            line_length: options.line_length,
            interval_index: options.interval_index.min(BRANCH_INTERVALS_MS.len() - 1),
            color_index: 0,
            rainbow: false,
            center: PointerFilter::new(CENTER_SMOOTHING),
            first_frame: true,
            keep_center: false,
        }
    }

    fn advance_color(&mut self) {
        self.color_index = (self.color_index + 1) % BRANCH_PALETTE.len();
    }

    /// Restart growth from the center without touching the canvas.
    fn clear_iterations(&mut self) {
        self.iterations = 1;
        self.start_points.clear();
        self.next_points.clear();
    }
}

/// A child direction: the parent direction nudged along the circumference
/// by a random amount that shrinks as the generations move outward.
fn perturb_direction(rng: &mut StdRng, dir: f64, iterations: u32) -> f64 {
    let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
    dir + rng.gen::<f64>() / (5 + iterations) as f64 * sign
}

impl Engine for BranchingEngine {
    fn name(&self) -> &'static str {
        "branching"
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Pointer { x, y } => self.center.approach(x, y),
            Command::CycleColor => {
                self.rainbow = false;
                self.advance_color();
            }
            Command::ToggleRainbow => self.rainbow = !self.rainbow,
            Command::Faster => self.interval_index = self.interval_index.saturating_sub(1),
            Command::Slower => {
                self.interval_index = (self.interval_index + 1).min(BRANCH_INTERVALS_MS.len() - 1)
            }
            Command::GrowIterationCap => self.max_iterations = (self.max_iterations + 1).min(12),
            Command::ShrinkIterationCap => {
                self.max_iterations = self.max_iterations.saturating_sub(1).max(3)
            }
            Command::LengthenLines => self.line_length = (self.line_length + 9.0).min(370.0),
            Command::ShortenLines => {
                self.line_length -= 9.0;
                if self.line_length < 15.0 {
                    self.line_length = 10.0;
                }
            }
            Command::Reset => {
                // A requested reset clears the canvas but keeps the
                // pointer-moved center.
                self.first_frame = true;
                self.keep_center = true;
            }
            _ => {}
        }
    }

    fn advance_frame(&mut self, canvas: &mut Canvas) {
        if self.first_frame {
            if !self.keep_center {
                self.center
                    .snap(canvas.dot_width() / 2.0, canvas.dot_height() / 2.0);
            }
            self.clear_iterations();
            canvas.fill(BRANCH_BACKGROUND);
            self.first_frame = false;
            self.keep_center = false;
        }

        if self.rainbow {
            self.advance_color();
        }

        if self.iterations > self.max_iterations {
            self.clear_iterations();
        }

        if self.start_points.is_empty() {
            let (cx, cy) = self.center.position();
            let dir1 = self.rng.gen::<f64>() * 2.0;
            let dir2 = self.rng.gen::<f64>() * 2.0;
            self.start_points.push(BranchPoint {
                x: cx,
                y: cy,
                dir1,
                dir2,
            });
        }

        let (cx, cy) = self.center.position();
        let reach = self.line_length * self.iterations as f64 * 1.55;
        let color = BRANCH_PALETTE[self.color_index];

        for i in 0..self.start_points.len() {
            let p = self.start_points[i];
            for dir in [p.dir1, p.dir2] {
                // Children sit on a circle around the global center, not
                // around their parent; the line still starts at the parent.
                let end_x = cx + reach * (PI * dir).sin();
                let end_y = cy + reach * (PI * dir).cos();
                canvas.line(p.x, p.y, end_x, end_y, color);

                let dir1 = perturb_direction(&mut self.rng, dir, self.iterations);
                let dir2 = perturb_direction(&mut self.rng, dir, self.iterations);
                self.next_points.push(BranchPoint {
                    x: end_x,
                    y: end_y,
                    dir1,
                    dir2,
                });
            }
        }

        mem::swap(&mut self.start_points, &mut self.next_points);
        self.next_points.clear();
        self.iterations += 1;

        debug_assert!(!self.start_points.is_empty(), "live generation emptied");
    }

    fn frame_interval(&self) -> Duration {
        Duration::from_millis(BRANCH_INTERVALS_MS[self.interval_index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::style::Color;

    fn engine(cap: u32) -> BranchingEngine {
        BranchingEngine::new(BranchingOptions {
            seed: Some(7),
            max_iterations: cap,
            ..BranchingOptions::default()
        })
    }

    fn canvas() -> Canvas {
        Canvas::new(40, 20)
    }

    #[test]
    fn generation_doubles_each_frame_until_the_cap() {
        let mut e = engine(4);
        let mut c = canvas();
        let expected = [2, 4, 8, 16];
        for &count in &expected {
            e.advance_frame(&mut c);
            assert_eq!(e.start_points.len(), count);
        }
    }

    #[test]
    fn counter_resets_only_past_the_cap() {
        let mut e = engine(4);
        let mut c = canvas();
        for _ in 0..4 {
            e.advance_frame(&mut c);
        }
        // counter == cap + 1 now; the next frame re-seeds from the center.
        assert_eq!(e.iterations, 5);
        e.advance_frame(&mut c);
        assert_eq!(e.start_points.len(), 2);
        assert_eq!(e.iterations, 2);
    }

    #[test]
    fn counter_at_the_cap_does_not_reset() {
        let mut e = engine(4);
        let mut c = canvas();
        for _ in 0..3 {
            e.advance_frame(&mut c);
        }
        assert_eq!(e.iterations, 4);
        e.advance_frame(&mut c);
        assert_eq!(e.start_points.len(), 16, "frame at counter == cap still doubles");
    }

    #[test]
    fn endpoint_distance_is_length_times_counter_times_ratio() {
        let mut e = engine(12);
        let mut c = canvas();
        for frame in 1u32..=3 {
            e.advance_frame(&mut c);
            let (cx, cy) = e.center.position();
            let expected = e.line_length * frame as f64 * 1.55;
            for p in &e.start_points {
                let dist = ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt();
                assert!(
                    (dist - expected).abs() < 1e-9,
                    "frame {frame}: distance {dist} != {expected}"
                );
            }
        }
    }

    #[test]
    fn direction_perturbation_is_bounded() {
        let mut rng = StdRng::seed_from_u64(3);
        for i in 1u32..=20 {
            let bound = 1.0 / (5 + i) as f64;
            for _ in 0..200 {
                let dir = rng.gen::<f64>() * 2.0;
                let new = perturb_direction(&mut rng, dir, i);
                assert!((new - dir).abs() <= bound);
            }
        }
    }

    #[test]
    fn internal_reset_keeps_the_canvas_external_reset_clears_it() {
        let mut e = engine(4);
        let mut c = canvas();
        for _ in 0..4 {
            e.advance_frame(&mut c);
        }
        let marker = Color::Rgb { r: 9, g: 9, b: 9 };
        c.fill(marker);
        e.advance_frame(&mut c); // cap reset: regrowth over the old buffer
        assert_eq!(c.cell(0, 0).bg, marker);

        e.handle_command(Command::Reset);
        e.advance_frame(&mut c);
        assert_eq!(c.cell(0, 0).bg, BRANCH_BACKGROUND);
    }

    #[test]
    fn external_reset_keeps_the_smoothed_center() {
        let mut e = engine(4);
        let mut c = canvas();
        e.advance_frame(&mut c);
        e.handle_command(Command::Pointer { x: 10.0, y: 10.0 });
        let moved = e.center.position();
        e.handle_command(Command::Reset);
        e.advance_frame(&mut c);
        assert_eq!(e.center.position(), moved);
    }

    #[test]
    fn rainbow_advances_palette_every_frame_and_color_command_disables_it() {
        let mut e = engine(12);
        let mut c = canvas();
        e.handle_command(Command::ToggleRainbow);
        e.advance_frame(&mut c);
        e.advance_frame(&mut c);
        assert_eq!(e.color_index, 2);

        e.handle_command(Command::CycleColor);
        assert!(!e.rainbow);
        assert_eq!(e.color_index, 3);
        e.advance_frame(&mut c);
        assert_eq!(e.color_index, 3, "explicit color holds without rainbow");
    }

    #[test]
    fn rainbow_toggles_back_off() {
        let mut e = engine(12);
        e.handle_command(Command::ToggleRainbow);
        e.handle_command(Command::ToggleRainbow);
        assert!(!e.rainbow);
    }

    #[test]
    fn faster_clamps_at_the_smallest_phase() {
        let mut e = engine(4);
        for _ in 0..20 {
            e.handle_command(Command::Faster);
        }
        assert_eq!(e.interval_index, 0);
        assert_eq!(e.frame_interval(), Duration::from_millis(BRANCH_INTERVALS_MS[0]));
        assert!(e.frame_interval() > Duration::ZERO);
        for _ in 0..20 {
            e.handle_command(Command::Slower);
        }
        assert_eq!(e.interval_index, BRANCH_INTERVALS_MS.len() - 1);
    }

    #[test]
    fn iteration_cap_and_line_length_clamp() {
        let mut e = engine(4);
        for _ in 0..20 {
            e.handle_command(Command::GrowIterationCap);
        }
        assert_eq!(e.max_iterations, 12);
        for _ in 0..20 {
            e.handle_command(Command::ShrinkIterationCap);
        }
        assert_eq!(e.max_iterations, 3);
        for _ in 0..50 {
            e.handle_command(Command::LengthenLines);
        }
        assert_eq!(e.line_length, 370.0);
        for _ in 0..50 {
            e.handle_command(Command::ShortenLines);
        }
        assert_eq!(e.line_length, 10.0);
    }

    #[test]
    fn triangle_commands_are_ignored() {
        let mut e = engine(4);
        let before = e.frame_interval();
        e.handle_command(Command::ToggleSeizure);
        e.handle_command(Command::SpinUp);
        e.handle_command(Command::ToggleShapeFamily);
        assert_eq!(e.frame_interval(), before);
    }
}
