use crossterm::event::KeyCode;

use crate::config::Animation;

/// Every mutation the menu/keyboard surface can request of an engine.
///
/// Commands are staged through the render loop's channel and applied only
/// at frame boundaries, never mid-frame. Commands an engine does not know
/// are ignored, so sending any command to either engine is harmless.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Pointer touch in canvas dot coordinates.
    Pointer { x: f64, y: f64 },
    CycleColor,
    ToggleRainbow,
    Faster,
    Slower,
    GrowIterationCap,
    ShrinkIterationCap,
    LengthenLines,
    ShortenLines,
    Reset,
    ToggleFill,
    TogglePersist,
    ToggleReverse,
    ToggleSeizure,
    SpinUp,
    SpinDown,
    ToggleCrazy,
    ToggleShapeFamily,
    /// Ask the render worker to exit after the current frame.
    Stop,
}

/// What a keypress means at the app layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyAction {
    Engine(Command),
    ToggleMusic,
    SkipTrack,
    Quit,
}

/// Keyboard bindings, per animation.
pub fn map_key(animation: Animation, code: KeyCode) -> Option<KeyAction> {
    use Command::*;
    use KeyAction::*;

    // Bindings shared by both animations.
    match code {
        KeyCode::Char('q') | KeyCode::Esc => return Some(Quit),
        KeyCode::Char('m') => return Some(ToggleMusic),
        KeyCode::Char('n') => return Some(SkipTrack),
        KeyCode::Char('r') => return Some(Engine(Reset)),
        KeyCode::Char('+') | KeyCode::Char('=') => return Some(Engine(Faster)),
        KeyCode::Char('-') | KeyCode::Char('_') => return Some(Engine(Slower)),
        _ => {}
    }

    match animation {
        Animation::Branching => match code {
            KeyCode::Char('c') => Some(Engine(CycleColor)),
            KeyCode::Char('b') => Some(Engine(ToggleRainbow)),
            KeyCode::Char('i') => Some(Engine(GrowIterationCap)),
            KeyCode::Char('u') => Some(Engine(ShrinkIterationCap)),
            KeyCode::Char('l') => Some(Engine(LengthenLines)),
            KeyCode::Char('h') => Some(Engine(ShortenLines)),
            _ => None,
        },
        Animation::Triangle => match code {
            KeyCode::Char('f') => Some(Engine(ToggleFill)),
            KeyCode::Char('p') => Some(Engine(TogglePersist)),
            KeyCode::Char('v') => Some(Engine(ToggleReverse)),
            KeyCode::Char('z') => Some(Engine(ToggleSeizure)),
            KeyCode::Char('x') => Some(Engine(ToggleCrazy)),
            KeyCode::Char('t') => Some(Engine(ToggleShapeFamily)),
            KeyCode::Char(']') => Some(Engine(SpinUp)),
            KeyCode::Char('[') => Some(Engine(SpinDown)),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quit_and_music_are_shared() {
        for animation in [Animation::Branching, Animation::Triangle] {
            assert_eq!(map_key(animation, KeyCode::Esc), Some(KeyAction::Quit));
            assert_eq!(
                map_key(animation, KeyCode::Char('q')),
                Some(KeyAction::Quit)
            );
            assert_eq!(
                map_key(animation, KeyCode::Char('m')),
                Some(KeyAction::ToggleMusic)
            );
            assert_eq!(
                map_key(animation, KeyCode::Char('n')),
                Some(KeyAction::SkipTrack)
            );
        }
    }

    #[test]
    fn speed_keys_map_to_phase_commands() {
        assert_eq!(
            map_key(Animation::Branching, KeyCode::Char('+')),
            Some(KeyAction::Engine(Command::Faster))
        );
        assert_eq!(
            map_key(Animation::Triangle, KeyCode::Char('-')),
            Some(KeyAction::Engine(Command::Slower))
        );
    }

    #[test]
    fn family_specific_keys_do_not_leak() {
        assert_eq!(map_key(Animation::Branching, KeyCode::Char('z')), None);
        assert_eq!(map_key(Animation::Triangle, KeyCode::Char('b')), None);
        assert_eq!(
            map_key(Animation::Triangle, KeyCode::Char('z')),
            Some(KeyAction::Engine(Command::ToggleSeizure))
        );
    }
}
