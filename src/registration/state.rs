//! Wizard step machine: tracks which screen the registrant is on.

use serde::{Deserialize, Serialize};

/// The steps of the registration wizard.
///
/// Progresses linearly: Phone → Otp → Form → Payment → Success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    #[default]
    Phone,
    Otp,
    Form,
    Payment,
    Success,
}

impl WizardStep {
    /// All steps in chain order.
    pub const ALL: [WizardStep; 5] = [
        WizardStep::Phone,
        WizardStep::Otp,
        WizardStep::Form,
        WizardStep::Payment,
        WizardStep::Success,
    ];

    /// Check if a forward transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: WizardStep) -> bool {
        use WizardStep::*;
        matches!(
            (self, target),
            (Phone, Otp) | (Otp, Form) | (Form, Payment) | (Payment, Success)
        )
    }

    /// Whether this step is terminal (registration is done).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Get the next step in the chain, if any.
    pub fn next(&self) -> Option<WizardStep> {
        use WizardStep::*;
        match self {
            Phone => Some(Otp),
            Otp => Some(Form),
            Form => Some(Payment),
            Payment => Some(Success),
            Success => None,
        }
    }

    /// Step reached by pressing "back". `None` on the first and terminal steps.
    pub fn previous(&self) -> Option<WizardStep> {
        use WizardStep::*;
        match self {
            Otp => Some(Phone),
            Form => Some(Otp),
            Payment => Some(Form),
            Phone | Success => None,
        }
    }

    /// Zero-based position in the chain (drives the progress indicator).
    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).unwrap_or(0)
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Phone => "phone",
            Self::Otp => "otp",
            Self::Form => "form",
            Self::Payment => "payment",
            Self::Success => "success",
        };
        write!(f, "{s}")
    }
}

/// Step pointer plus the epoch counter used to reject stale completions.
#[derive(Debug, Clone, Default)]
pub struct StepState {
    step: WizardStep,
    /// Bumped on every step change.
    epoch: u64,
}

impl StepState {
    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Advance to the next step. Errors on the terminal step.
    pub fn advance(&mut self) -> Result<WizardStep, String> {
        let next = self
            .step
            .next()
            .ok_or_else(|| "Already at terminal step".to_string())?;
        if !self.step.can_transition_to(next) {
            return Err(format!("Cannot transition from {} to {}", self.step, next));
        }
        self.step = next;
        self.epoch += 1;
        Ok(next)
    }

    /// Move one step left. Errors on the first and terminal steps.
    pub fn retreat(&mut self) -> Result<WizardStep, String> {
        let previous = self
            .step
            .previous()
            .ok_or_else(|| format!("No step before {}", self.step))?;
        self.step = previous;
        self.epoch += 1;
        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transitions() {
        use WizardStep::*;
        let transitions = [(Phone, Otp), (Otp, Form), (Form, Payment), (Payment, Success)];
        for (from, to) in transitions {
            assert!(from.can_transition_to(to), "{from} should transition to {to}");
        }
    }

    #[test]
    fn invalid_transitions() {
        use WizardStep::*;
        // Skip steps
        assert!(!Phone.can_transition_to(Form));
        assert!(!Otp.can_transition_to(Success));
        // Backward is not a forward transition
        assert!(!Form.can_transition_to(Otp));
        // Terminal
        assert!(!Success.can_transition_to(Phone));
        // Self-transition
        assert!(!Otp.can_transition_to(Otp));
    }

    #[test]
    fn previous_moves_exactly_one_left() {
        use WizardStep::*;
        assert_eq!(Otp.previous(), Some(Phone));
        assert_eq!(Form.previous(), Some(Otp));
        assert_eq!(Payment.previous(), Some(Form));
        assert_eq!(Phone.previous(), None);
        assert_eq!(Success.previous(), None);
    }

    #[test]
    fn next_walks_all_steps() {
        let mut current = WizardStep::Phone;
        for expected in &WizardStep::ALL[1..] {
            let next = current.next().unwrap();
            assert_eq!(next, *expected);
            current = next;
        }
        assert!(current.next().is_none());
        assert!(current.is_terminal());
    }

    #[test]
    fn display_matches_serde() {
        for step in WizardStep::ALL {
            let json = serde_json::to_string(&step).unwrap();
            assert_eq!(format!("\"{step}\""), json, "Display and serde should match for {step:?}");
        }
    }

    #[test]
    fn index_follows_chain_order() {
        for (i, step) in WizardStep::ALL.iter().enumerate() {
            assert_eq!(step.index(), i);
        }
    }

    #[test]
    fn state_bumps_epoch_on_every_move() {
        let mut state = StepState::default();
        assert_eq!(state.step(), WizardStep::Phone);
        assert_eq!(state.epoch(), 0);

        state.advance().unwrap();
        state.advance().unwrap();
        assert_eq!(state.step(), WizardStep::Form);
        assert_eq!(state.epoch(), 2);

        state.retreat().unwrap();
        assert_eq!(state.step(), WizardStep::Otp);
        assert_eq!(state.epoch(), 3);
    }

    #[test]
    fn state_advance_fails_at_terminal() {
        let mut state = StepState::default();
        for _ in 0..4 {
            state.advance().unwrap();
        }
        assert!(state.advance().is_err());
        assert!(state.retreat().is_err());
        assert_eq!(state.step(), WizardStep::Success);
    }

    #[test]
    fn retreat_fails_on_first_step() {
        let mut state = StepState::default();
        assert!(state.retreat().is_err());
        assert_eq!(state.epoch(), 0);
    }
}
