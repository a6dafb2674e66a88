use std::io;
use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind, MouseEventKind};

use crate::command::{map_key, Command, KeyAction};
use crate::config::Animation;
use crate::engine::Engine;
use crate::music::MusicController;
use crate::render::RenderLoop;
use crate::screen::Screen;

/// Run one animation until the user quits or the surface dies.
///
/// The main thread is the input/command side: it translates key presses
/// and mouse events into commands for the render worker and drives the
/// music collaborator directly. Everything visual happens on the worker.
pub fn run(
    animation: Animation,
    engine: Box<dyn Engine>,
    music_players: Vec<String>,
) -> io::Result<()> {
    let screen = Screen::new()?;
    let (tx, rx) = mpsc::channel();
    let mut render_loop = RenderLoop::start(engine, screen.surface(), rx, tx.clone());
    let mut music = MusicController::new(music_players);

    loop {
        if !render_loop.is_running() {
            break;
        }
        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                match map_key(animation, key.code) {
                    Some(KeyAction::Quit) => break,
                    Some(KeyAction::ToggleMusic) => music.toggle(),
                    Some(KeyAction::SkipTrack) => music.skip(),
                    Some(KeyAction::Engine(cmd)) => {
                        let _ = tx.send(cmd);
                    }
                    None => {}
                }
            }
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::Down(_) | MouseEventKind::Drag(_) => {
                    // Cell coordinates to dot coordinates, aimed at the
                    // center of the touched cell.
                    let _ = tx.send(Command::Pointer {
                        x: mouse.column as f64 * 2.0 + 1.0,
                        y: mouse.row as f64 * 4.0 + 2.0,
                    });
                }
                _ => {}
            },
            _ => {}
        }
    }

    render_loop.stop();
    music.stop();
    Ok(())
}
