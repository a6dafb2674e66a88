use std::collections::VecDeque;
use std::f64::consts::PI;
use std::time::Duration;

use crossterm::style::Color;
use rand::prelude::*;

use crate::canvas::Canvas;
use crate::command::Command;
use crate::config::{TriangleFamily, TriangleOptions};
use crate::input::PointerFilter;

use super::{
    seed_or_clock, Engine, SEIZURE_BACKGROUNDS, TRIANGLE_BACKGROUND, TRIANGLE_DEFAULT_INTERVAL,
    TRIANGLE_INTERVALS_MS, TRIANGLE_PALETTE,
};

/// Pointer smoothing constant for this animation.
const CENTER_SMOOTHING: f64 = 10.1;

const BASE_RADIUS: f64 = 1.0;
const GROW_RATIO: f64 = 1.04;
const SHRINK_RATIO: f64 = 0.95;

/// Spin divisors: actual per-frame rotation is `iterations / spin`, so a
/// lower entry spins faster. Walking past the last entry disables spin.
const SPIN_PHASES: [f64; 6] = [2.0, 5.0, 11.0, 29.0, 41.0, 57.0];
const DEFAULT_SPIN_PHASE: usize = 3;

/// The two opposite equilateral orientations, as fractions of pi.
const EQUILATERAL_RATIOS: [f64; 2] = [2.0 / 3.0, 1.0 / 3.0];

/// Corner phases for right triangles: east, west, south, north.
const RIGHT_RATIOS: [f64; 4] = [0.5, 1.0, 1.5, 2.0];

/// Equilateral corner bases, as fractions of pi.
const EQUILATERAL_CORNERS: [f64; 3] = [2.0 / 3.0, 4.0 / 3.0, 2.0];

#[derive(Debug, Clone, Copy)]
pub struct EquilateralTriangle {
    pub radius: f64,
    pub color: Color,
    /// Which of the two orientations this triangle was created on.
    pub flipped: bool,
    pub pi_ratio: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct RightTriangle {
    pub radius: f64,
    pub color: Color,
    /// Three corner phases, drawn round-robin from `RIGHT_RATIOS`.
    pub ratios: [f64; 3],
}

/// Triangles-within-triangles around a movable center.
///
/// Each frame every triangle of the active family is drawn on a circle of
/// twice its radius and then scaled; the sequence is maintained at both
/// ends (spawn at one, prune at the other) so the nesting runs forever
/// without the collection growing.
pub struct TriangleEngine {
    rng: StdRng,

    equilaterals: VecDeque<EquilateralTriangle>,
    rights: VecDeque<RightTriangle>,
    color_index: usize,
    seizure_index: usize,
    eq_flip: bool,
    right_ratio_index: usize,

    center: PointerFilter,
    canvas_w: f64,
    canvas_h: f64,

    iterations: u32,
    spin_index: usize,
    spin: f64,
    no_spin: bool,
    reset_no_spin: bool,
    pending_spin: Option<f64>,
    accumulated_angle: f64,

    interval_index: usize,

    erase: bool,
    fill: bool,
    crazy: bool,
    seizure: bool,
    reverse: bool,
    equilateral: bool,

    first_frame: bool,
    reset_requested: bool,
    canvas_reset_requested: bool,
    family_toggle_requested: bool,
    background_flush: bool,
    /// (erase, fill, interval index) captured when seizure mode turns on,
    /// restored when it turns off.
    saved_modes: Option<(bool, bool, usize)>,
}

impl TriangleEngine {
    pub fn new(options: TriangleOptions) -> Self {
        let mut engine = Self {
            rng: StdRng::seed_from_u64(seed_or_clock(options.seed)),
            equilaterals: VecDeque::new(),
            rights: VecDeque::new(),
            color_index: 0,
            seizure_index: 0,
            eq_flip: false,
            right_ratio_index: 0,
            center: PointerFilter::new(CENTER_SMOOTHING),
            canvas_w: 0.0,
            canvas_h: 0.0,
            iterations: 1,
            spin_index: DEFAULT_SPIN_PHASE,
            spin: SPIN_PHASES[DEFAULT_SPIN_PHASE],
            no_spin: false,
            reset_no_spin: false,
            pending_spin: None,
            accumulated_angle: 1.0,
            interval_index: options.interval_index.min(TRIANGLE_INTERVALS_MS.len() - 1),
            erase: true,
            fill: !options.outline,
            crazy: false,
            seizure: false,
            reverse: false,
            equilateral: options.family == TriangleFamily::Equilateral,
            first_frame: true,
            reset_requested: false,
            canvas_reset_requested: false,
            family_toggle_requested: false,
            background_flush: false,
            saved_modes: None,
        };
        let right = engine.new_right(BASE_RADIUS);
        engine.rights.push_back(right);
        let eq = engine.new_equilateral(BASE_RADIUS);
        engine.equilaterals.push_back(eq);
        engine
    }

    fn take_color(&mut self) -> Color {
        let color = TRIANGLE_PALETTE[self.color_index];
        self.color_index = (self.color_index + 1) % TRIANGLE_PALETTE.len();
        color
    }

    /// Flip to the opposite orientation and return its phase.
    fn next_equilateral_ratio(&mut self) -> f64 {
        self.eq_flip = !self.eq_flip;
        if self.eq_flip {
            EQUILATERAL_RATIOS[0]
        } else {
            EQUILATERAL_RATIOS[1]
        }
    }

    fn next_right_ratio(&mut self) -> f64 {
        let ratio = RIGHT_RATIOS[self.right_ratio_index];
        self.right_ratio_index = (self.right_ratio_index + 1) % RIGHT_RATIOS.len();
        ratio
    }

    fn new_equilateral(&mut self, radius: f64) -> EquilateralTriangle {
        let flipped = self.eq_flip;
        let pi_ratio = self.next_equilateral_ratio();
        let color = self.take_color();
        EquilateralTriangle {
            radius,
            color,
            flipped,
            pi_ratio,
        }
    }

    fn new_right(&mut self, radius: f64) -> RightTriangle {
        let color = self.take_color();
        let ratios = [
            self.next_right_ratio(),
            self.next_right_ratio(),
            self.next_right_ratio(),
        ];
        RightTriangle {
            radius,
            color,
            ratios,
        }
    }

    /// Per-frame rotation at the current rate.
    fn spin_step(&self) -> f64 {
        if self.no_spin {
            0.0
        } else {
            self.iterations as f64 / self.spin
        }
    }

    /// Fold the current rotation into the accumulated angle so a new spin
    /// rate continues from the same orientation. Runs at most once per
    /// frame, right after the first triangle has been painted.
    fn apply_spin_change(&mut self) {
        if let Some(new_spin) = self.pending_spin.take() {
            if !self.reset_no_spin {
                self.accumulated_angle += self.iterations as f64 / self.spin;
            }
            self.iterations = 0;
            self.spin = new_spin;
            self.reset_no_spin = false;
        }
    }

    /// Erase the buffer and reseed the active family, per direction.
    fn reset_canvas(&mut self, canvas: &mut Canvas) {
        canvas.fill(TRIANGLE_BACKGROUND);
        if self.equilateral {
            if !self.reverse {
                self.equilaterals.clear();
                let t = self.new_equilateral(BASE_RADIUS);
                self.equilaterals.push_back(t);
            } else {
                // Entering reverse keeps the old nest and adds one giant
                // background-colored triangle to shrink down through it.
                let t = self.new_equilateral(self.canvas_h * 4.0);
                self.equilaterals.push_back(t);
                if let Some(front) = self.equilaterals.front_mut() {
                    front.color = TRIANGLE_BACKGROUND;
                }
            }
        } else {
            self.rights.clear();
            let radius = if self.reverse {
                self.canvas_h * 4.0
            } else {
                BASE_RADIUS
            };
            let mut t = self.new_right(radius);
            if self.reverse {
                t.color = TRIANGLE_BACKGROUND;
            }
            self.rights.push_back(t);
        }
    }

    fn reset_conditions(&mut self, canvas: &mut Canvas) {
        if self.reverse {
            self.reset_canvas(canvas);
        } else if self.equilateral {
            // Continue the orientation alternation from the newest
            // triangle rather than the stale ticker.
            if let Some(back) = self.equilaterals.back() {
                self.eq_flip = !back.flipped;
            }
        }
        self.reset_requested = false;
        self.iterations = 1;
        self.first_frame = true;
    }

    fn pass_equilaterals(&mut self, canvas: &mut Canvas, filled: bool) {
        let grow = !self.reverse;
        for i in 0..self.equilaterals.len() {
            let t = self.equilaterals[i];
            self.draw_equilateral(canvas, t.radius, PI * t.pi_ratio, t.color, filled);
            self.equilaterals[i].radius *= if grow { GROW_RATIO } else { SHRINK_RATIO };
        }

        if grow {
            if let Some(radius) = self
                .equilaterals
                .back()
                .filter(|back| back.radius >= 2.0)
                .map(|back| back.radius / 2.0)
            {
                let t = self.new_equilateral(radius);
                self.equilaterals.push_back(t);
            }
            let prune = self.equilaterals.front().map_or(false, |front| {
                front.radius > self.canvas_w * 5.0 && front.radius > self.canvas_h * 4.0
            });
            if prune {
                self.equilaterals.pop_front();
            }
        } else {
            if let Some(radius) = self
                .equilaterals
                .front()
                .filter(|front| {
                    front.radius < self.canvas_w * 3.0 && front.radius < self.canvas_h * 3.0
                })
                .map(|front| front.radius * 2.0)
            {
                let t = self.new_equilateral(radius);
                self.equilaterals.push_front(t);
            }
            if self
                .equilaterals
                .back()
                .map_or(false, |back| back.radius <= 1.0)
            {
                self.equilaterals.pop_back();
            }
        }

        debug_assert!(!self.equilaterals.is_empty(), "equilateral sequence emptied");
    }

    fn pass_rights(&mut self, canvas: &mut Canvas, filled: bool) {
        let grow = !self.reverse;
        for i in 0..self.rights.len() {
            let t = self.rights[i];
            self.draw_right(canvas, &t, filled);
            self.rights[i].radius *= if grow { GROW_RATIO } else { SHRINK_RATIO };
        }

        if grow {
            if let Some(radius) = self
                .rights
                .back()
                .filter(|back| back.radius >= 2.0)
                .map(|back| back.radius / 1.5)
            {
                let t = self.new_right(radius);
                self.rights.push_back(t);
            }
            let prune = self
                .rights
                .front()
                .map_or(false, |front| front.radius > (self.canvas_w + self.canvas_h) * 4.0);
            if prune {
                self.rights.pop_front();
            }
        } else {
            if self
                .rights
                .front()
                .map_or(false, |front| {
                    front.radius < self.canvas_w * 3.0 && front.radius < self.canvas_h * 3.0
                })
            {
                let t = self.new_right(self.canvas_h * 3.0);
                self.rights.push_front(t);
            }
            if self.rights.back().map_or(false, |back| back.radius <= 1.0) {
                self.rights.pop_back();
            }
        }

        debug_assert!(!self.rights.is_empty(), "right-triangle sequence emptied");
    }

    fn draw_equilateral(
        &mut self,
        canvas: &mut Canvas,
        radius: f64,
        orientation: f64,
        color: Color,
        filled: bool,
    ) {
        let diameter = radius * 2.0;
        let (cx, cy) = self.center.position();
        let new_angle = self.spin_step();

        let mut pts = [(0.0, 0.0); 3];
        for (k, base) in EQUILATERAL_CORNERS.iter().enumerate() {
            let angle = PI * base + self.accumulated_angle + new_angle + orientation;
            pts[k] = (cx + diameter * angle.sin(), cy + diameter * angle.cos());
        }

        if self.crazy {
            // Deliberately non-fractal offsets kept for the look of them.
            pts[0].0 += diameter * (PI * (1.0 / 3.0)).sin();
            pts[0].1 += diameter * (PI * (1.0 / 3.1)).cos();
            pts[1].0 += diameter * (PI * (4.3 / 3.0)).sin();
            pts[1].1 += diameter * (PI * (4.0 / self.iterations as f64)).cos();
            pts[2].0 += diameter * (PI * 2.1).sin();
            pts[2].1 += diameter * (PI * 1.9).cos();
        }

        self.apply_spin_change();

        let color = if self.seizure { self.take_color() } else { color };
        canvas.triangle(pts, color, filled);
    }

    fn draw_right(&mut self, canvas: &mut Canvas, triangle: &RightTriangle, filled: bool) {
        let diameter = triangle.radius * 2.0;
        let (cx, cy) = self.center.position();
        let new_angle = self.spin_step();
        let [r1, r2, r3] = triangle.ratios;
        let acc = self.accumulated_angle;

        let pts = if !self.crazy {
            let corner = |ratio: f64| {
                let angle = PI * ratio - acc - new_angle;
                (cx + diameter * angle.sin(), cy + diameter * angle.cos())
            };
            [corner(r1), corner(r2), corner(r3)]
        } else {
            // Deliberately non-fractal formulas. The divisors below include
            // the raw iteration counter (may be zero after a spin change)
            // and a freshly drawn unbounded integer (may be zero); the
            // resulting non-finite corners are parked off-canvas by the
            // rasterizer.
            let iter = self.iterations as f64;
            let x1 = cx + diameter * (PI * (r1 + new_angle)).sin();
            let y1 = cy
                + diameter
                    * (PI * (r1 / 1.1) - (new_angle - 1.0) / self.rng.gen::<i32>() as f64).cos();
            let x2 = cx + diameter * (PI * (r2 / iter) - acc + new_angle).sin();
            let y2 = cy + diameter * (PI * (r2 / (new_angle + 1.0))).cos();
            let new_angle = 0.25;
            let x3 = cx + diameter * (PI * r3 - new_angle / self.rng.gen::<i32>() as f64).sin();
            let y3 = cy + diameter * (PI * (r3 / iter - acc - new_angle)).cos();
            [(x1, y1), (x2, y2), (x3, y3)]
        };

        self.apply_spin_change();

        let color = if self.seizure {
            self.take_color()
        } else {
            triangle.color
        };
        canvas.triangle(pts, color, filled);
    }
}

impl Engine for TriangleEngine {
    fn name(&self) -> &'static str {
        "triangle"
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Pointer { x, y } => self.center.approach(x, y),
            Command::ToggleFill => self.fill = !self.fill,
            Command::TogglePersist => self.erase = !self.erase,
            Command::ToggleReverse => {
                if self.reverse {
                    self.reverse = false;
                } else {
                    if self.equilateral {
                        self.reset_requested = true;
                    }
                    self.reverse = true;
                }
            }
            Command::Reset => self.canvas_reset_requested = true,
            Command::ToggleSeizure => {
                if self.seizure {
                    self.seizure = false;
                    let (erase, fill, interval) = self
                        .saved_modes
                        .take()
                        .unwrap_or((false, false, self.interval_index));
                    self.erase = erase;
                    self.fill = fill;
                    self.interval_index = interval;
                    self.background_flush = true;
                } else {
                    self.saved_modes = Some((self.erase, self.fill, self.interval_index));
                    self.seizure = true;
                    self.erase = true;
                    self.interval_index = TRIANGLE_DEFAULT_INTERVAL;
                }
            }
            Command::SpinUp => {
                if self.spin_index > 0 {
                    self.spin_index -= 1;
                    self.pending_spin = Some(SPIN_PHASES[self.spin_index]);
                }
                if self.no_spin {
                    self.no_spin = false;
                    self.reset_no_spin = true;
                }
            }
            Command::SpinDown => {
                if !self.no_spin {
                    self.spin_index += 1;
                    if self.spin_index >= SPIN_PHASES.len() {
                        self.spin_index = SPIN_PHASES.len() - 1;
                        self.no_spin = true;
                    }
                    self.pending_spin = Some(SPIN_PHASES[self.spin_index]);
                }
            }
            Command::ToggleCrazy => self.crazy = !self.crazy,
            Command::ToggleShapeFamily => {
                self.reset_requested = true;
                self.family_toggle_requested = true;
            }
            Command::Faster => self.interval_index = self.interval_index.saturating_sub(1),
            Command::Slower => {
                self.interval_index =
                    (self.interval_index + 1).min(TRIANGLE_INTERVALS_MS.len() - 1)
            }
            _ => {}
        }
    }

    fn advance_frame(&mut self, canvas: &mut Canvas) {
        // Staged requests resolve here and only here.
        if self.canvas_reset_requested {
            self.canvas_reset_requested = false;
            self.reset_canvas(canvas);
        }
        if self.reset_requested {
            self.reset_conditions(canvas);
        }
        if self.background_flush {
            self.background_flush = false;
            canvas.fill(TRIANGLE_BACKGROUND);
        }
        if self.first_frame {
            self.canvas_w = canvas.dot_width();
            self.canvas_h = canvas.dot_height();
            self.center
                .snap(self.canvas_w / 2.0, self.canvas_h / 2.0);
            self.first_frame = false;
            self.erase = true;
        }

        if self.erase && !self.seizure {
            canvas.fill(TRIANGLE_BACKGROUND);
        }
        if self.seizure {
            canvas.fill(SEIZURE_BACKGROUNDS[self.seizure_index]);
            self.seizure_index = (self.seizure_index + 1) % SEIZURE_BACKGROUNDS.len();
        }

        // Seizure frames are stroked regardless of the stored fill flag.
        let filled = self.fill && !self.seizure;

        if self.equilateral {
            self.pass_equilaterals(canvas, filled);
        } else {
            self.pass_rights(canvas, filled);
        }

        self.iterations += 1;

        if self.family_toggle_requested {
            self.family_toggle_requested = false;
            self.reset_conditions(canvas);
            self.equilateral = !self.equilateral;
            self.reset_requested = true;
        }
    }

    fn frame_interval(&self) -> Duration {
        Duration::from_millis(TRIANGLE_INTERVALS_MS[self.interval_index])
    }
}
