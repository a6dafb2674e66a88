use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        disable_raw_mode, enable_raw_mode, size, Clear, ClearType, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};

use crate::canvas::Canvas;
use crate::error::RenderError;

/// Geometry of a successfully acquired frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    pub cols: u16,
    pub rows: u16,
}

/// The host surface as the render loop sees it: acquire a frame, publish
/// the canvas onto it. Acquisition fails with `SurfaceUnavailable` once
/// the host has torn the surface down; the loop then stops cleanly.
pub trait Surface: Send + 'static {
    fn acquire(&mut self) -> Result<FrameGeometry, RenderError>;
    fn publish(&mut self, canvas: &Canvas) -> Result<(), RenderError>;
}

struct SurfaceShared {
    alive: AtomicBool,
}

/// Terminal session owned by the main thread. Construction enters raw
/// mode, the alternate screen and mouse capture; dropping restores the
/// terminal and marks the surface gone for the render worker.
pub struct Screen {
    shared: Arc<SurfaceShared>,
}

impl Screen {
    pub fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        execute!(
            io::stdout(),
            EnterAlternateScreen,
            Hide,
            EnableMouseCapture,
            Clear(ClearType::All)
        )?;
        Ok(Self {
            shared: Arc::new(SurfaceShared {
                alive: AtomicBool::new(true),
            }),
        })
    }

    /// A surface handle for the render worker.
    pub fn surface(&self) -> TerminalSurface {
        TerminalSurface {
            shared: self.shared.clone(),
        }
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        self.shared.alive.store(false, Ordering::Release);
        let _ = execute!(io::stdout(), DisableMouseCapture, Show, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

/// The render worker's end of the terminal.
pub struct TerminalSurface {
    shared: Arc<SurfaceShared>,
}

impl Surface for TerminalSurface {
    fn acquire(&mut self) -> Result<FrameGeometry, RenderError> {
        if !self.shared.alive.load(Ordering::Acquire) {
            return Err(RenderError::SurfaceUnavailable);
        }
        let (cols, rows) = size().map_err(|_| RenderError::SurfaceUnavailable)?;
        if cols == 0 || rows == 0 {
            return Err(RenderError::SurfaceUnavailable);
        }
        Ok(FrameGeometry { cols, rows })
    }

    fn publish(&mut self, canvas: &Canvas) -> Result<(), RenderError> {
        if !self.shared.alive.load(Ordering::Acquire) {
            return Err(RenderError::SurfaceUnavailable);
        }

        let mut out = io::stdout().lock();
        let (cols, rows) = canvas.size();
        let mut last_fg: Option<Color> = None;
        let mut last_bg: Option<Color> = None;

        for row in 0..rows {
            queue!(out, MoveTo(0, row))?;
            for col in 0..cols {
                let cell = canvas.cell(col, row);
                if last_fg != Some(cell.fg) {
                    queue!(out, SetForegroundColor(cell.fg))?;
                    last_fg = Some(cell.fg);
                }
                if last_bg != Some(cell.bg) {
                    queue!(out, SetBackgroundColor(cell.bg))?;
                    last_bg = Some(cell.bg);
                }
                queue!(out, Print(cell.glyph()))?;
            }
        }
        queue!(out, ResetColor)?;
        out.flush()?;
        Ok(())
    }
}
