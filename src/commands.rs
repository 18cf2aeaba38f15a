// Discrete key presses mapped to show commands.
// Visual: one tap of a key does one thing; holding it does not repeat.

use minifb::Key;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    ClearStrokes,
    Undo,
    NextPainter,
    /// Palette index.
    SetColour(usize),
    TogglePause,
    ToggleOverlay,
    CycleLayout,
    Screenshot,
    Quit,
}

/// Key name for each command, as written in the config file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeysConfig {
    pub clear: String,
    pub undo: String,
    pub next_painter: String,
    pub pause: String,
    pub overlay: String,
    pub layout: String,
    pub screenshot: String,
    pub quit: String,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            clear: "R".into(),
            undo: "Z".into(),
            next_painter: "Tab".into(),
            pause: "Space".into(),
            overlay: "G".into(),
            layout: "L".into(),
            screenshot: "P".into(),
            quit: "Escape".into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct KeyMap {
    bindings: Vec<(Key, Command)>,
}

impl KeyMap {
    /// Build from config. Digits 1-9 always pick palette entries 0-8;
    /// unknown names are skipped with a warning.
    pub fn new(keys: &KeysConfig) -> Self {
        let mut bindings = Vec::new();
        let digits = [
            Key::Key1, Key::Key2, Key::Key3, Key::Key4, Key::Key5,
            Key::Key6, Key::Key7, Key::Key8, Key::Key9,
        ];
        for (i, key) in digits.into_iter().enumerate() {
            bindings.push((key, Command::SetColour(i)));
        }

        let named = [
            (&keys.clear, Command::ClearStrokes),
            (&keys.undo, Command::Undo),
            (&keys.next_painter, Command::NextPainter),
            (&keys.pause, Command::TogglePause),
            (&keys.overlay, Command::ToggleOverlay),
            (&keys.layout, Command::CycleLayout),
            (&keys.screenshot, Command::Screenshot),
            (&keys.quit, Command::Quit),
        ];
        for (name, command) in named {
            match parse_key(name) {
                Some(key) => {
                    // a later binding for the same key wins
                    bindings.retain(|(k, _)| *k != key);
                    bindings.push((key, command));
                }
                None => warn!(key = %name, ?command, "unknown key name, binding skipped"),
            }
        }
        Self { bindings }
    }

    pub fn lookup(&self, key: Key) -> Option<Command> {
        self.bindings.iter().find(|(k, _)| *k == key).map(|(_, c)| *c)
    }

    /// Commands for this frame's key presses, in press order.
    pub fn dispatch(&self, keys: &[Key]) -> Vec<Command> {
        keys.iter().filter_map(|k| self.lookup(*k)).collect()
    }
}

/// Parse a key name ("A", "Space", "Tab", "F5", ...). Case-insensitive.
pub fn parse_key(name: &str) -> Option<Key> {
    let upper = name.trim().to_ascii_uppercase();
    let key = match upper.as_str() {
        "A" => Key::A, "B" => Key::B, "C" => Key::C, "D" => Key::D, "E" => Key::E,
        "F" => Key::F, "G" => Key::G, "H" => Key::H, "I" => Key::I, "J" => Key::J,
        "K" => Key::K, "L" => Key::L, "M" => Key::M, "N" => Key::N, "O" => Key::O,
        "P" => Key::P, "Q" => Key::Q, "R" => Key::R, "S" => Key::S, "T" => Key::T,
        "U" => Key::U, "V" => Key::V, "W" => Key::W, "X" => Key::X, "Y" => Key::Y,
        "Z" => Key::Z,
        "0" => Key::Key0,
        "F1" => Key::F1, "F2" => Key::F2, "F3" => Key::F3, "F4" => Key::F4,
        "F5" => Key::F5, "F6" => Key::F6, "F7" => Key::F7, "F8" => Key::F8,
        "F9" => Key::F9, "F10" => Key::F10, "F11" => Key::F11, "F12" => Key::F12,
        "SPACE" => Key::Space,
        "TAB" => Key::Tab,
        "ENTER" | "RETURN" => Key::Enter,
        "BACKSPACE" => Key::Backspace,
        "DELETE" => Key::Delete,
        "ESCAPE" | "ESC" => Key::Escape,
        "LEFT" => Key::Left,
        "RIGHT" => Key::Right,
        "UP" => Key::Up,
        "DOWN" => Key::Down,
        _ => return None,
    };
    Some(key)
}
