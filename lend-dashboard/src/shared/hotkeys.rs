//! Timed hotkey mode: arm, then type a row number to focus it or `q` to flip lend/borrow
//!
//! The router holds no clock; callers pass `now` so behaviour is deterministic.

use std::time::{Duration, Instant};

/// Default time hotkey mode stays armed
pub const DEFAULT_HOTKEY_WINDOW: Duration = Duration::from_secs(5);

/// Key presses the router understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyInput {
    /// Ctrl+K / Super+K
    Arm,
    Digit(u8),
    /// `q` while armed
    ToggleMode,
    /// Enter, resolves a partially typed row number
    Confirm,
    Other,
}

/// Outcome of a key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotkeyAction {
    None,
    Armed,
    /// Focus the row of this symbol
    Focus(String),
    ToggleMode,
}

#[derive(Debug, Clone)]
pub struct HotkeyRouter {
    window: Duration,
    armed_until: Option<Instant>,
    digits: String,
}

impl Default for HotkeyRouter {
    fn default() -> Self {
        Self::new(DEFAULT_HOTKEY_WINDOW)
    }
}

impl HotkeyRouter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            armed_until: None,
            digits: String::new(),
        }
    }

    /// Whether hotkey mode is active at `now`; badges are shown while true
    pub fn is_armed(&self, now: Instant) -> bool {
        self.armed_until.is_some_and(|deadline| now < deadline)
    }

    /// Digits typed so far in the current hotkey session
    pub fn pending(&self) -> &str {
        &self.digits
    }

    /// Drop an expired hotkey session, returning true if one expired
    pub fn expire(&mut self, now: Instant) -> bool {
        if self.armed_until.is_some() && !self.is_armed(now) {
            self.disarm();
            return true;
        }
        false
    }

    fn disarm(&mut self) {
        self.armed_until = None;
        self.digits.clear();
    }

    /// Route one key press; `ranking` is the hotkey order of global pool symbols
    pub fn handle(&mut self, input: HotkeyInput, now: Instant, ranking: &[String]) -> HotkeyAction {
        self.expire(now);

        if input == HotkeyInput::Arm {
            self.armed_until = Some(now + self.window);
            self.digits.clear();
            return HotkeyAction::Armed;
        }

        if !self.is_armed(now) {
            return HotkeyAction::None;
        }

        match input {
            HotkeyInput::ToggleMode => {
                self.disarm();
                HotkeyAction::ToggleMode
            }
            HotkeyInput::Digit(digit) if digit <= 9 => {
                self.digits.push(char::from(b'0' + digit));
                self.resolve(ranking, false)
            }
            HotkeyInput::Confirm => self.resolve(ranking, true),
            _ => HotkeyAction::None,
        }
    }

    /// Focus once the typed number is a valid row and cannot grow into another valid row
    fn resolve(&mut self, ranking: &[String], confirmed: bool) -> HotkeyAction {
        let Ok(number) = self.digits.parse::<usize>() else {
            self.digits.clear();
            return HotkeyAction::None;
        };

        let rows = 1..=ranking.len();
        let valid = rows.contains(&number);
        let extendable = number.checked_mul(10).is_some_and(|next| rows.contains(&next));

        if valid && (confirmed || !extendable) {
            let symbol = ranking[number - 1].clone();
            self.disarm();
            return HotkeyAction::Focus(symbol);
        }

        if (!valid && !extendable) || confirmed {
            self.digits.clear();
        }
        HotkeyAction::None
    }
}
