//! OTP entry cells, the resend countdown, and the verification seam.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Number of OTP digits / input cells.
pub const OTP_LEN: usize = 6;

/// Result of a keystroke or paste on the OTP cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellOutcome {
    /// Cell that should hold focus afterwards.
    pub focus: usize,
    /// Whether the input completed the code and verification should start.
    pub auto_submit: bool,
}

/// Six single-character OTP input cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OtpInput {
    cells: [Option<char>; OTP_LEN],
    focus: usize,
}

impl OtpInput {
    /// Change handler for cell `index`.
    ///
    /// Multi-character values keep only their last character; a non-digit
    /// value is ignored; an empty value clears the cell. Filling a cell moves
    /// focus right. Filling the last cell while every cell is filled asks for
    /// auto-submit. Returns `None` if `index` is out of range.
    pub fn input(&mut self, index: usize, value: &str) -> Option<CellOutcome> {
        if index >= OTP_LEN {
            return None;
        }
        let ch = value.chars().last();
        match ch {
            Some(c) if !c.is_ascii_digit() => {
                return Some(CellOutcome {
                    focus: self.focus,
                    auto_submit: false,
                });
            }
            _ => {}
        }

        self.cells[index] = ch;
        if ch.is_some() && index < OTP_LEN - 1 {
            self.focus = index + 1;
        } else {
            self.focus = index;
        }

        let auto_submit = index == OTP_LEN - 1 && ch.is_some() && self.is_complete();
        Some(CellOutcome {
            focus: self.focus,
            auto_submit,
        })
    }

    /// Backspace on cell `index`. An empty cell hands focus to its left
    /// neighbour; a filled cell is cleared by the change handler instead.
    pub fn backspace(&mut self, index: usize) -> Option<usize> {
        if index >= OTP_LEN {
            return None;
        }
        if self.cells[index].is_none() && index > 0 {
            self.focus = index - 1;
        } else {
            self.focus = index;
        }
        Some(self.focus)
    }

    /// Paste handler: keep the first six digits of `text`, fill from the
    /// left and clear the remaining cells. Only a paste with exactly six
    /// digits asks for auto-submit.
    pub fn paste(&mut self, text: &str) -> CellOutcome {
        let digits: Vec<char> = text.chars().filter(char::is_ascii_digit).take(OTP_LEN).collect();
        self.cells = [None; OTP_LEN];
        for (cell, digit) in self.cells.iter_mut().zip(digits.iter()) {
            *cell = Some(*digit);
        }
        self.focus = digits.len().min(OTP_LEN - 1);
        CellOutcome {
            focus: self.focus,
            auto_submit: digits.len() == OTP_LEN,
        }
    }

    /// Clear every cell and focus the first one.
    pub fn clear(&mut self) {
        self.cells = [None; OTP_LEN];
        self.focus = 0;
    }

    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// The code typed so far (only filled cells).
    pub fn code(&self) -> String {
        self.cells.iter().flatten().collect()
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    /// Cell contents for display; empty cells are empty strings.
    pub fn cells(&self) -> Vec<String> {
        self.cells
            .iter()
            .map(|c| c.map(String::from).unwrap_or_default())
            .collect()
    }
}

/// Countdown gating the "resend OTP" action.
#[derive(Debug, Clone)]
pub struct ResendTimer {
    started_at: DateTime<Utc>,
    window: Duration,
}

impl ResendTimer {
    pub fn start(now: DateTime<Utc>, window: Duration) -> Self {
        Self {
            started_at: now,
            window,
        }
    }

    /// Whole seconds left on the countdown, rounded up.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> u64 {
        let elapsed = (now - self.started_at).to_std().unwrap_or_default();
        let left = self.window.saturating_sub(elapsed);
        left.as_secs() + u64::from(left.subsec_nanos() > 0)
    }

    pub fn can_resend(&self, now: DateTime<Utc>) -> bool {
        self.remaining_secs(now) == 0
    }

    pub fn restart(&mut self, now: DateTime<Utc>) {
        self.started_at = now;
    }
}

/// Checks an entered OTP.
#[async_trait]
pub trait OtpVerifier: Send + Sync {
    async fn verify(&self, phone: &str, code: &str) -> bool;
}

/// Test seam standing in for SMS verification: accepts one fixed code.
pub struct FixedCodeVerifier {
    code: String,
}

impl FixedCodeVerifier {
    /// The code shown on the OTP screen's testing hint.
    pub const TEST_CODE: &'static str = "123456";

    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

impl Default for FixedCodeVerifier {
    fn default() -> Self {
        Self::new(Self::TEST_CODE)
    }
}

#[async_trait]
impl OtpVerifier for FixedCodeVerifier {
    async fn verify(&self, _phone: &str, code: &str) -> bool {
        code == self.code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_code(input: &mut OtpInput, code: &str) -> CellOutcome {
        let mut last = None;
        for (i, c) in code.chars().enumerate() {
            last = input.input(i, &c.to_string());
        }
        last.unwrap()
    }

    #[test]
    fn typing_advances_focus() {
        let mut input = OtpInput::default();
        let outcome = input.input(0, "1").unwrap();
        assert_eq!(outcome.focus, 1);
        assert!(!outcome.auto_submit);
        let outcome = input.input(1, "2").unwrap();
        assert_eq!(outcome.focus, 2);
        assert_eq!(input.code(), "12");
    }

    #[test]
    fn filling_last_cell_auto_submits() {
        let mut input = OtpInput::default();
        let outcome = type_code(&mut input, "123456");
        assert!(outcome.auto_submit);
        assert_eq!(outcome.focus, 5);
        assert_eq!(input.code(), "123456");
    }

    #[test]
    fn last_cell_with_gap_does_not_submit() {
        let mut input = OtpInput::default();
        input.input(0, "1").unwrap();
        let outcome = input.input(5, "6").unwrap();
        assert!(!outcome.auto_submit);
        assert_eq!(input.code(), "16");
    }

    #[test]
    fn non_digit_is_ignored() {
        let mut input = OtpInput::default();
        input.input(0, "a").unwrap();
        assert_eq!(input.code(), "");
        assert_eq!(input.focus(), 0);
    }

    #[test]
    fn multi_char_keeps_last() {
        let mut input = OtpInput::default();
        input.input(0, "47").unwrap();
        assert_eq!(input.cells()[0], "7");
    }

    #[test]
    fn out_of_range_cell() {
        let mut input = OtpInput::default();
        assert!(input.input(6, "1").is_none());
        assert!(input.backspace(6).is_none());
    }

    #[test]
    fn backspace_on_empty_cell_retreats() {
        let mut input = OtpInput::default();
        input.input(0, "1").unwrap();
        assert_eq!(input.backspace(1), Some(0));
        // First cell never retreats further
        assert_eq!(input.backspace(0), Some(0));
    }

    #[test]
    fn backspace_on_filled_cell_stays() {
        let mut input = OtpInput::default();
        input.input(0, "1").unwrap();
        input.input(1, "2").unwrap();
        assert_eq!(input.backspace(1), Some(1));
        // Clearing goes through the change handler
        input.input(1, "").unwrap();
        assert_eq!(input.code(), "1");
    }

    #[test]
    fn paste_full_code_submits() {
        let mut input = OtpInput::default();
        let outcome = input.paste("12-34 56");
        assert!(outcome.auto_submit);
        assert_eq!(input.code(), "123456");
    }

    #[test]
    fn paste_short_code_does_not_submit() {
        let mut input = OtpInput::default();
        type_code(&mut input, "999999");
        let outcome = input.paste("1234");
        assert!(!outcome.auto_submit);
        assert_eq!(outcome.focus, 4);
        assert_eq!(input.cells(), vec!["1", "2", "3", "4", "", ""]);
    }

    #[test]
    fn paste_long_input_keeps_first_six() {
        let mut input = OtpInput::default();
        let outcome = input.paste("12345678");
        assert!(outcome.auto_submit);
        assert_eq!(input.code(), "123456");
    }

    #[test]
    fn clear_resets_cells_and_focus() {
        let mut input = OtpInput::default();
        type_code(&mut input, "123");
        input.clear();
        assert_eq!(input.code(), "");
        assert_eq!(input.focus(), 0);
    }

    #[test]
    fn resend_timer_counts_down() {
        let start = Utc::now();
        let timer = ResendTimer::start(start, Duration::from_secs(60));
        assert_eq!(timer.remaining_secs(start), 60);
        assert!(!timer.can_resend(start));
        let later = start + chrono::Duration::milliseconds(59_500);
        assert_eq!(timer.remaining_secs(later), 1);
        let done = start + chrono::Duration::seconds(60);
        assert_eq!(timer.remaining_secs(done), 0);
        assert!(timer.can_resend(done));
    }

    #[test]
    fn resend_timer_restart() {
        let start = Utc::now();
        let mut timer = ResendTimer::start(start, Duration::from_secs(60));
        let later = start + chrono::Duration::seconds(61);
        assert!(timer.can_resend(later));
        timer.restart(later);
        assert_eq!(timer.remaining_secs(later), 60);
    }

    #[tokio::test]
    async fn fixed_verifier_accepts_only_its_code() {
        let verifier = FixedCodeVerifier::default();
        assert!(verifier.verify("9876543210", "123456").await);
        assert!(!verifier.verify("9876543210", "111111").await);
        assert!(!verifier.verify("9876543210", "12345").await);
    }
}
