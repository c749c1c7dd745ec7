//! Amount entry through the on-screen number pad.
//!
//! The buffer only ever holds ASCII digits and at most one `.`. Every key press
//! is accepted; intermediate values such as `"."` are legal until submission,
//! where [`AmountBuffer::amount`] decides whether there is anything to save.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Digit(u8),
    DecimalPoint,
    Backspace,
    Clear,
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown keypad key: {0}")]
pub struct UnknownKey(pub String);

impl FromStr for Key {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "." => Ok(Key::DecimalPoint),
            "backspace" => Ok(Key::Backspace),
            "clear" => Ok(Key::Clear),
            _ => match s.as_bytes() {
                [d @ b'0'..=b'9'] => Ok(Key::Digit(d - b'0')),
                _ => Err(UnknownKey(s.to_string())),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("No amount entered")]
    Empty,
    #[error("{0:?} is not a number")]
    Unparsable(String),
    #[error("Amount must be a finite, non-negative number")]
    OutOfRange,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AmountBuffer {
    text: String,
    max_digits: Option<usize>,
}

impl AmountBuffer {
    /// Buffer without a digit limit.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_digits(max_digits: usize) -> Self {
        Self {
            text: String::new(),
            max_digits: Some(max_digits),
        }
    }

    pub fn press(&mut self, key: Key) {
        match key {
            Key::Digit(d) => self.press_digit(d),
            Key::DecimalPoint => self.press_decimal_point(),
            Key::Backspace => self.press_backspace(),
            Key::Clear => self.reset(),
        }
    }

    /// Digits past the configured limit are dropped.
    pub fn press_digit(&mut self, digit: u8) {
        if digit > 9 {
            return;
        }
        if let Some(max) = self.max_digits {
            if self.digit_count() >= max {
                return;
            }
        }
        self.text.push(char::from(b'0' + digit));
    }

    pub fn press_decimal_point(&mut self) {
        if !self.text.contains('.') {
            self.text.push('.');
        }
    }

    pub fn press_backspace(&mut self) {
        self.text.pop();
    }

    pub fn reset(&mut self) {
        self.text.clear();
    }

    pub fn current_value(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn digit_count(&self) -> usize {
        self.text.chars().filter(char::is_ascii_digit).count()
    }

    pub fn is_submittable(&self) -> bool {
        self.amount().is_ok()
    }

    /// Parses the buffer. A trailing point (`"12."`) is accepted.
    pub fn amount(&self) -> Result<f64, ValidationError> {
        if self.text.is_empty() {
            return Err(ValidationError::Empty);
        }
        let value: f64 = self
            .text
            .parse()
            .map_err(|_| ValidationError::Unparsable(self.text.clone()))?;
        if !value.is_finite() || value < 0.0 {
            return Err(ValidationError::OutOfRange);
        }
        Ok(value)
    }
}
