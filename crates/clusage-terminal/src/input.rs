//! Key decoding for raw terminal input
//!
//! [`decode`] turns the bytes of one key press into a [`KeyEvent`]. The
//! resolution order is fixed:
//!
//! 1. a descriptor supplied by the platform ([`KeyHint`]), if any
//! 2. the table of known escape sequences (CSI and SS3 arrows, Home/End,
//!    PageUp/PageDown, Delete, F1-F12) and the Return/Tab/Backspace bytes
//! 3. a control byte in `0x01..=0x1A`, read as Ctrl plus a letter
//! 4. a single printable character, shifted if it is an ASCII capital
//! 5. ESC followed by one character, read as Meta plus that character
//! 6. anything else is [`KeyName::Unknown`]
//!
//! A read from stdin may carry several key presses at once (fast typing or
//! a paste); [`split_sequences`] cuts such a chunk into single sequences
//! first.

use std::fmt;

const ESC: u8 = 0x1b;

/// The logical key of a [`KeyEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyName {
    Up,
    Down,
    Left,
    Right,
    Return,
    Escape,
    Tab,
    Backspace,
    Home,
    End,
    PageUp,
    PageDown,
    Delete,
    /// Function key F1 to F12
    F(u8),
    /// A printable character, or the letter of a Ctrl/Meta combination
    Char(char),
    Unknown,
}

impl fmt::Display for KeyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => f.write_str("up"),
            Self::Down => f.write_str("down"),
            Self::Left => f.write_str("left"),
            Self::Right => f.write_str("right"),
            Self::Return => f.write_str("return"),
            Self::Escape => f.write_str("escape"),
            Self::Tab => f.write_str("tab"),
            Self::Backspace => f.write_str("backspace"),
            Self::Home => f.write_str("home"),
            Self::End => f.write_str("end"),
            Self::PageUp => f.write_str("pageup"),
            Self::PageDown => f.write_str("pagedown"),
            Self::Delete => f.write_str("delete"),
            Self::F(n) => write!(f, "f{n}"),
            Self::Char(c) => write!(f, "{c}"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// A decoded key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub name: KeyName,
    /// The raw input the event was decoded from
    pub sequence: String,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
}

impl KeyEvent {
    /// An unmodified key, as the known-sequence table produces
    pub fn plain(name: KeyName) -> Self {
        Self {
            name,
            sequence: String::new(),
            ctrl: false,
            meta: false,
            shift: false,
        }
    }

    /// A printable character typed without Ctrl or Meta
    pub fn char(c: char) -> Self {
        Self {
            name: KeyName::Char(c),
            sequence: c.to_string(),
            ctrl: false,
            meta: false,
            shift: c.is_ascii_uppercase(),
        }
    }

    /// Ctrl plus a letter
    pub fn ctrl(c: char) -> Self {
        Self {
            name: KeyName::Char(c),
            sequence: String::new(),
            ctrl: true,
            meta: false,
            shift: false,
        }
    }

    /// True for the character `c` with neither Ctrl nor Meta held
    pub fn is_char(&self, c: char) -> bool {
        self.name == KeyName::Char(c) && !self.ctrl && !self.meta
    }
}

/// A key descriptor supplied by the platform alongside the raw bytes
///
/// When the platform already knows which key was pressed its answer wins
/// over table lookups. A hint without a name keeps the raw sequence as the
/// key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyHint {
    pub name: Option<KeyName>,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
}

impl From<crossterm::event::KeyEvent> for KeyHint {
    fn from(event: crossterm::event::KeyEvent) -> Self {
        use crossterm::event::{KeyCode, KeyModifiers};

        let name = match event.code {
            KeyCode::Up => Some(KeyName::Up),
            KeyCode::Down => Some(KeyName::Down),
            KeyCode::Left => Some(KeyName::Left),
            KeyCode::Right => Some(KeyName::Right),
            KeyCode::Enter => Some(KeyName::Return),
            KeyCode::Esc => Some(KeyName::Escape),
            KeyCode::Tab | KeyCode::BackTab => Some(KeyName::Tab),
            KeyCode::Backspace => Some(KeyName::Backspace),
            KeyCode::Home => Some(KeyName::Home),
            KeyCode::End => Some(KeyName::End),
            KeyCode::PageUp => Some(KeyName::PageUp),
            KeyCode::PageDown => Some(KeyName::PageDown),
            KeyCode::Delete => Some(KeyName::Delete),
            KeyCode::F(n) => Some(KeyName::F(n)),
            KeyCode::Char(c) => Some(KeyName::Char(c)),
            _ => None,
        };

        Self {
            name,
            ctrl: event.modifiers.contains(KeyModifiers::CONTROL),
            meta: event.modifiers.contains(KeyModifiers::ALT),
            shift: event.modifiers.contains(KeyModifiers::SHIFT)
                || event.code == KeyCode::BackTab,
        }
    }
}

fn known_sequence(sequence: &str) -> Option<KeyName> {
    let name = match sequence {
        "\x1b[A" | "\x1bOA" => KeyName::Up,
        "\x1b[B" | "\x1bOB" => KeyName::Down,
        "\x1b[C" | "\x1bOC" => KeyName::Right,
        "\x1b[D" | "\x1bOD" => KeyName::Left,
        "\r" | "\n" => KeyName::Return,
        "\x1b" => KeyName::Escape,
        "\t" => KeyName::Tab,
        "\x7f" | "\x08" => KeyName::Backspace,
        "\x1b[H" | "\x1bOH" => KeyName::Home,
        "\x1b[F" | "\x1bOF" => KeyName::End,
        "\x1b[5~" => KeyName::PageUp,
        "\x1b[6~" => KeyName::PageDown,
        "\x1b[3~" => KeyName::Delete,
        "\x1bOP" => KeyName::F(1),
        "\x1bOQ" => KeyName::F(2),
        "\x1bOR" => KeyName::F(3),
        "\x1bOS" => KeyName::F(4),
        "\x1b[15~" => KeyName::F(5),
        "\x1b[17~" => KeyName::F(6),
        "\x1b[18~" => KeyName::F(7),
        "\x1b[19~" => KeyName::F(8),
        "\x1b[20~" => KeyName::F(9),
        "\x1b[21~" => KeyName::F(10),
        "\x1b[23~" => KeyName::F(11),
        "\x1b[24~" => KeyName::F(12),
        _ => return None,
    };
    Some(name)
}

/// Decode the bytes of one key press
pub fn decode(raw: &[u8], hint: Option<&KeyHint>) -> KeyEvent {
    let sequence = String::from_utf8_lossy(raw).into_owned();

    if let Some(hint) = hint {
        let name = hint
            .name
            .or_else(|| single_char(&sequence).map(KeyName::Char))
            .unwrap_or(KeyName::Unknown);
        return KeyEvent {
            name,
            sequence,
            ctrl: hint.ctrl,
            meta: hint.meta,
            shift: hint.shift,
        };
    }

    if let Some(name) = known_sequence(&sequence) {
        return KeyEvent {
            sequence,
            ..KeyEvent::plain(name)
        };
    }

    if let &[byte @ 0x01..=0x1a] = raw {
        let letter = char::from(b'a' + (byte - 1));
        return KeyEvent {
            sequence,
            ..KeyEvent::ctrl(letter)
        };
    }

    if let Some(c) = single_char(&sequence)
        && !c.is_control()
    {
        return KeyEvent::char(c);
    }

    if let Some(rest) = sequence.strip_prefix('\x1b')
        && let Some(c) = single_char(rest)
        && !c.is_control()
    {
        return KeyEvent {
            name: KeyName::Char(c.to_lowercase().next().unwrap_or(c)),
            sequence,
            ctrl: false,
            meta: true,
            shift: c.is_ascii_uppercase(),
        };
    }

    KeyEvent {
        sequence,
        ..KeyEvent::plain(KeyName::Unknown)
    }
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

fn utf8_len(lead: u8) -> usize {
    match lead {
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf7 => 4,
        _ => 1,
    }
}

/// Split a chunk read from stdin into individual key sequences
///
/// CSI (`ESC [ … final`) and SS3 (`ESC O x`) sequences stay whole, as do
/// multi-byte UTF-8 characters. `ESC` followed by a plain character is kept
/// together as one Meta sequence; `ESC ESC` is two Escape presses.
pub fn split_sequences(bytes: &[u8]) -> Vec<&[u8]> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let len = if bytes[i] == ESC {
            match bytes.get(i + 1) {
                None | Some(&ESC) => 1,
                Some(b'[') => {
                    // Parameters run until a final byte in 0x40..=0x7e
                    let tail = &bytes[i + 2..];
                    match tail.iter().position(|b| (0x40..=0x7e).contains(b)) {
                        Some(end) => end + 3,
                        None => bytes.len() - i,
                    }
                }
                Some(b'O') => (bytes.len() - i).min(3),
                Some(&next) => (1 + utf8_len(next)).min(bytes.len() - i),
            }
        } else {
            utf8_len(bytes[i]).min(bytes.len() - i)
        };
        out.push(&bytes[i..i + len]);
        i += len;
    }
    out
}

/// Keys the shell treats as "leave this screen"
///
/// Unmodified `q`, Escape, Ctrl+C and Ctrl+D.
pub fn is_exit_key(event: &KeyEvent) -> bool {
    match event.name {
        KeyName::Escape => true,
        KeyName::Char('q') => !event.ctrl && !event.meta,
        KeyName::Char('c') | KeyName::Char('d') => event.ctrl,
        _ => false,
    }
}

/// Join `(key, description)` pairs into a footer line
///
/// ```
/// use clusage_terminal::input::format_key_help;
///
/// let help = format_key_help(&[("↑↓", "Scroll"), ("ESC/q", "Back")]);
/// assert_eq!(help, "↑↓ Scroll | ESC/q Back");
/// ```
pub fn format_key_help<K: AsRef<str>, D: AsRef<str>>(items: &[(K, D)]) -> String {
    items
        .iter()
        .map(|(key, desc)| format!("{} {}", key.as_ref(), desc.as_ref()))
        .collect::<Vec<_>>()
        .join(" | ")
}
