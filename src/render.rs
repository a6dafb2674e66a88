use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::canvas::Canvas;
use crate::command::Command;
use crate::engine::Engine;
use crate::screen::{FrameGeometry, Surface};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Stopped,
    Running,
}

/// The dedicated render worker plus its handle-side state machine.
///
/// One worker per animation view. Per tick the worker acquires a frame,
/// applies every command staged since the previous frame, advances the
/// engine, publishes the canvas and sleeps for the engine's interval.
/// All engine and canvas state is exclusively owned by the worker.
pub struct RenderLoop {
    state: LoopState,
    running: Arc<AtomicBool>,
    waker: Sender<Command>,
    worker: Option<JoinHandle<()>>,
}

impl RenderLoop {
    /// Transition Stopped -> Running by spawning the worker.
    pub fn start<S: Surface>(
        engine: Box<dyn Engine>,
        surface: S,
        commands: Receiver<Command>,
        waker: Sender<Command>,
    ) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let worker = thread::Builder::new()
            .name("render-loop".into())
            .spawn(move || {
                let mut engine = engine;
                let mut surface = surface;
                run_loop(engine.as_mut(), &mut surface, &commands, &flag);
            })
            .expect("failed to spawn the render worker");
        Self {
            state: LoopState::Running,
            running,
            waker,
            worker: Some(worker),
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Whether the worker is still ticking. The worker clears the flag
    /// itself when it stops on surface loss.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Transition Running -> Stopped and wait for the worker to observe
    /// it. The worker always finishes the frame it is painting first, so
    /// a half-drawn buffer is never published.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        let _ = self.waker.send(Command::Stop);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("render worker panicked");
            }
        }
        self.state = LoopState::Stopped;
    }
}

impl Drop for RenderLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop(
    engine: &mut dyn Engine,
    surface: &mut dyn Surface,
    commands: &Receiver<Command>,
    running: &AtomicBool,
) {
    info!(engine = engine.name(), "render loop started");
    let mut canvas: Option<Canvas> = None;
    // Commands received while sleeping; they belong to the next frame
    // boundary, ahead of whatever is still queued in the channel.
    let mut pending: Vec<Command> = Vec::new();

    while running.load(Ordering::Acquire) {
        let frame = match surface.acquire() {
            Ok(frame) => frame,
            Err(err) => {
                info!(%err, "surface gone, stopping render loop");
                break;
            }
        };
        let canvas = prepare_canvas(&mut canvas, frame, engine);

        // The frame boundary: the only point where staged mutations apply.
        let mut stop = false;
        for cmd in pending.drain(..).chain(commands.try_iter()) {
            match cmd {
                Command::Stop => stop = true,
                cmd => engine.handle_command(cmd),
            }
        }
        if stop || !running.load(Ordering::Acquire) {
            break;
        }

        engine.advance_frame(canvas);
        if let Err(err) = surface.publish(canvas) {
            info!(%err, "publish failed, stopping render loop");
            break;
        }

        // Anti-speed sleep. A command arriving mid-sleep is stashed, not
        // applied; Stop and a closed channel end the nap early.
        let deadline = Instant::now() + engine.frame_interval();
        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            match commands.recv_timeout(deadline - now) {
                Ok(Command::Stop) => {
                    stop = true;
                    break;
                }
                Ok(cmd) => pending.push(cmd),
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    stop = true;
                    break;
                }
            }
        }
        if stop {
            break;
        }
    }

    running.store(false, Ordering::Release);
    info!("render loop stopped");
}

fn prepare_canvas<'a>(
    slot: &'a mut Option<Canvas>,
    frame: FrameGeometry,
    engine: &mut dyn Engine,
) -> &'a mut Canvas {
    match slot {
        None => slot.insert(Canvas::new(frame.cols, frame.rows)),
        Some(canvas) => {
            if canvas.size() != (frame.cols, frame.rows) {
                debug!(cols = frame.cols, rows = frame.rows, "surface resized");
                canvas.resize(frame.cols, frame.rows);
                engine.handle_command(Command::Reset);
            }
            canvas
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use std::sync::mpsc;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use std::time::Duration;

    struct StubEngine {
        frames: Arc<AtomicUsize>,
        seen: Arc<Mutex<Vec<Command>>>,
    }

    impl Engine for StubEngine {
        fn name(&self) -> &'static str {
            "stub"
        }
        fn handle_command(&mut self, cmd: Command) {
            self.seen.lock().unwrap().push(cmd);
        }
        fn advance_frame(&mut self, _canvas: &mut Canvas) {
            self.frames.fetch_add(1, Ordering::SeqCst);
        }
        fn frame_interval(&self) -> Duration {
            Duration::from_millis(1)
        }
    }

    struct StubSurface {
        published: usize,
        fail_after: usize,
    }

    impl Surface for StubSurface {
        fn acquire(&mut self) -> Result<FrameGeometry, RenderError> {
            if self.published >= self.fail_after {
                Err(RenderError::SurfaceUnavailable)
            } else {
                Ok(FrameGeometry { cols: 8, rows: 8 })
            }
        }
        fn publish(&mut self, _canvas: &Canvas) -> Result<(), RenderError> {
            self.published += 1;
            Ok(())
        }
    }

    fn harness(fail_after: usize) -> (RenderLoop, Sender<Command>, Arc<AtomicUsize>, Arc<Mutex<Vec<Command>>>) {
        let frames = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let engine = Box::new(StubEngine {
            frames: frames.clone(),
            seen: seen.clone(),
        });
        let surface = StubSurface {
            published: 0,
            fail_after,
        };
        let (tx, rx) = mpsc::channel();
        let render_loop = RenderLoop::start(engine, surface, rx, tx.clone());
        (render_loop, tx, frames, seen)
    }

    fn wait_until_stopped(render_loop: &RenderLoop) {
        for _ in 0..500 {
            if !render_loop.is_running() {
                return;
            }
            thread::sleep(Duration::from_millis(2));
        }
        panic!("render loop did not stop in time");
    }

    #[test]
    fn surface_loss_stops_the_loop_after_the_exact_frame_count() {
        let (mut render_loop, _tx, frames, _seen) = harness(3);
        wait_until_stopped(&render_loop);
        assert_eq!(frames.load(Ordering::SeqCst), 3);
        render_loop.stop();
        assert_eq!(render_loop.state(), LoopState::Stopped);
    }

    #[test]
    fn stop_joins_and_no_frames_run_afterwards() {
        let (mut render_loop, _tx, frames, _seen) = harness(usize::MAX);
        thread::sleep(Duration::from_millis(20));
        render_loop.stop();
        assert!(!render_loop.is_running());
        let after_stop = frames.load(Ordering::SeqCst);
        assert!(after_stop > 0);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(frames.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn commands_reach_the_engine_between_frames() {
        let (mut render_loop, tx, _frames, seen) = harness(usize::MAX);
        tx.send(Command::ToggleFill).unwrap();
        tx.send(Command::Faster).unwrap();
        thread::sleep(Duration::from_millis(30));
        render_loop.stop();
        let seen = seen.lock().unwrap();
        assert!(seen.contains(&Command::ToggleFill));
        assert!(seen.contains(&Command::Faster));
        assert!(!seen.contains(&Command::Stop), "Stop is consumed by the loop");
    }

    #[test]
    fn stop_is_idempotent() {
        let (mut render_loop, _tx, _frames, _seen) = harness(usize::MAX);
        render_loop.stop();
        render_loop.stop();
        assert_eq!(render_loop.state(), LoopState::Stopped);
    }
}
