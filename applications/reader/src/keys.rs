//! Single-line keyboard commands read from stdin

/// Command typed by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    /// `p`
    TogglePlay,
    /// `s`
    Stop,
    /// `n`
    Next,
    /// `b`
    Previous,
    /// `g <N>` with a 1-based sentence number, stored 0-based
    Seek(usize),
    /// `r`
    Reset,
    /// `e`
    ToggleEta,
    /// `q`
    Quit,
}

impl KeyCommand {
    /// Parse one input line; `None` for anything unrecognised
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let key = parts.next()?;

        let command = match key {
            "p" => Self::TogglePlay,
            "s" => Self::Stop,
            "n" => Self::Next,
            "b" => Self::Previous,
            "r" => Self::Reset,
            "e" => Self::ToggleEta,
            "q" => Self::Quit,
            "g" => {
                let number: usize = parts.next()?.parse().ok()?;
                Self::Seek(number.checked_sub(1)?)
            }
            _ => return None,
        };

        // Trailing garbage makes the line ambiguous
        if parts.next().is_some() {
            return None;
        }
        Some(command)
    }
}

/// Help text printed at start
pub const HELP: &str = "keys: p play/pause  s stop  n next  b back  g <N> go to  r reset  e eta  q quit";
