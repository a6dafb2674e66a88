/// Which animation a session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Animation {
    Branching,
    Triangle,
}

/// Which triangle family the tessellation starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TriangleFamily {
    #[default]
    Equilateral,
    Right,
}

/// Options for the branching-line animation.
#[derive(Debug, Clone)]
pub struct BranchingOptions {
    pub seed: Option<u64>,
    /// Generations before the fractal re-seeds from the center (3..=12).
    pub max_iterations: u32,
    /// Base line length in dots.
    pub line_length: f64,
    /// Index into the branching anti-speed phase table.
    pub interval_index: usize,
}

impl Default for BranchingOptions {
    fn default() -> Self {
        Self {
            seed: None,
            max_iterations: 4,
            line_length: 70.0,
            interval_index: crate::engine::BRANCH_DEFAULT_INTERVAL,
        }
    }
}

/// Options for the triangle-tessellation animation.
#[derive(Debug, Clone)]
pub struct TriangleOptions {
    pub seed: Option<u64>,
    pub family: TriangleFamily,
    /// Start with outlined triangles instead of filled ones.
    pub outline: bool,
    /// Index into the triangle anti-speed phase table.
    pub interval_index: usize,
}

impl Default for TriangleOptions {
    fn default() -> Self {
        Self {
            seed: None,
            family: TriangleFamily::Equilateral,
            outline: false,
            interval_index: crate::engine::TRIANGLE_DEFAULT_INTERVAL,
        }
    }
}
