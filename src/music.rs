use mpris::{Player, PlayerFinder};
use tracing::{debug, info};

/// Narrow control surface over an external MPRIS media player.
///
/// The animation never depends on audio: every call here either reaches a
/// player or logs and does nothing. Connection is lazy and re-attempted
/// whenever a control call finds no player.
pub struct MusicController {
    player: Option<Player>,
    preferred: Vec<String>,
    playing: bool,
}

impl MusicController {
    pub fn new(preferred: Vec<String>) -> Self {
        Self {
            player: None,
            preferred,
            playing: false,
        }
    }

    /// Find a player: preferred names first, then the active one, then
    /// anything on the bus.
    fn connect(&mut self) -> bool {
        let finder = match PlayerFinder::new() {
            Ok(finder) => finder,
            Err(err) => {
                debug!(%err, "d-bus unavailable");
                return false;
            }
        };

        for name in &self.preferred {
            let wanted = name.to_lowercase();
            if let Ok(players) = finder.find_all() {
                for player in players {
                    if player.identity().to_lowercase().contains(&wanted) {
                        info!(identity = player.identity(), "music player connected");
                        self.player = Some(player);
                        return true;
                    }
                }
            }
        }

        if let Ok(player) = finder.find_active() {
            info!(identity = player.identity(), "music player connected");
            self.player = Some(player);
            return true;
        }

        if let Ok(players) = finder.find_all() {
            if let Some(player) = players.into_iter().next() {
                info!(identity = player.identity(), "music player connected");
                self.player = Some(player);
                return true;
            }
        }

        debug!("no mpris player found");
        false
    }

    fn with_player(&mut self, op: impl Fn(&Player) -> Result<(), mpris::DBusError>) {
        if self.player.is_none() && !self.connect() {
            return;
        }
        if let Some(player) = &self.player {
            if let Err(err) = op(player) {
                debug!(%err, "music control failed, dropping the player");
                self.player = None;
            }
        }
    }

    pub fn shuffle(&mut self) {
        self.with_player(|p| p.set_shuffle(true));
    }

    pub fn play(&mut self) {
        self.with_player(|p| p.play());
        self.playing = true;
    }

    pub fn stop(&mut self) {
        if self.playing {
            self.with_player(|p| p.stop());
        }
        self.playing = false;
    }

    pub fn skip(&mut self) {
        if self.playing {
            self.with_player(|p| p.next());
        }
    }

    /// Menu toggle: off -> shuffle then play, on -> stop.
    pub fn toggle(&mut self) {
        if self.playing {
            self.stop();
        } else {
            self.shuffle();
            self.play();
        }
    }
}
