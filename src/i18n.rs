//! Display language and the bilingual message catalog used by the wizard.

use serde::{Deserialize, Serialize};

/// A supported display / competition language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    En,
    /// Kannada is the site default when no preference is stored.
    #[default]
    Kn,
}

impl Language {
    /// Parse a stored preference value. Anything but `en` / `kn` is rejected.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "en" => Some(Self::En),
            "kn" => Some(Self::Kn),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Kn => "kn",
        }
    }

    /// Human-readable language name as shown in summaries and emails.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Kn => "Kannada (ಕನ್ನಡ)",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user-facing text in both languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Text {
    pub en: &'static str,
    pub kn: &'static str,
}

impl Text {
    pub const fn new(en: &'static str, kn: &'static str) -> Self {
        Self { en, kn }
    }

    pub fn get(&self, language: Language) -> &'static str {
        match language {
            Language::En => self.en,
            Language::Kn => self.kn,
        }
    }
}

/// Inline wizard messages.
pub mod messages {
    use super::Text;

    pub const PHONE_INVALID: Text = Text::new(
        "Please enter a valid 10-digit phone number",
        "ದಯವಿಟ್ಟು ಮಾನ್ಯ 10-ಅಂಕಿಯ ಫೋನ್ ಸಂಖ್ಯೆಯನ್ನು ನಮೂದಿಸಿ",
    );
    pub const TERMS_REQUIRED: Text = Text::new(
        "Please accept the terms and conditions",
        "ದಯವಿಟ್ಟು ನಿಯಮಗಳು ಮತ್ತು ಷರತ್ತುಗಳನ್ನು ಒಪ್ಪಿಕೊಳ್ಳಿ",
    );
    pub const OTP_INCOMPLETE: Text = Text::new(
        "Please enter complete 6-digit OTP",
        "ದಯವಿಟ್ಟು ಸಂಪೂರ್ಣ 6-ಅಂಕಿಯ OTP ನಮೂದಿಸಿ",
    );
    pub const OTP_INVALID: Text = Text::new(
        "Invalid OTP. Please try again. (Hint: Use 123456 for testing)",
        "ಅಮಾನ್ಯ OTP. ದಯವಿಟ್ಟು ಮತ್ತೊಮ್ಮೆ ಪ್ರಯತ್ನಿಸಿ. (ಸುಳಿವು: ಪರೀಕ್ಷೆಗಾಗಿ 123456 ಬಳಸಿ)",
    );
    pub const EMAIL_SENT: Text = Text::new(
        "Confirmation email sent successfully!",
        "ದೃಢೀಕರಣ ಇಮೇಲ್ ಯಶಸ್ವಿಯಾಗಿ ಕಳುಹಿಸಲಾಗಿದೆ!",
    );
    pub const EMAIL_FAILED: Text = Text::new(
        "Failed to send confirmation email. Please contact support.",
        "ದೃಢೀಕರಣ ಇಮೇಲ್ ಕಳುಹಿಸಲು ವಿಫಲವಾಗಿದೆ. ದಯವಿಟ್ಟು ಬೆಂಬಲವನ್ನು ಸಂಪರ್ಕಿಸಿ.",
    );
    pub const EMAIL_SENDING: Text = Text::new(
        "Sending confirmation email...",
        "ದೃಢೀಕರಣ ಇಮೇಲ್ ಕಳುಹಿಸಲಾಗುತ್ತಿದೆ...",
    );

    // Rejected actions

    pub const FORM_INVALID: Text = Text::new(
        "Please correct the highlighted fields",
        "ದಯವಿಟ್ಟು ಗುರುತಿಸಲಾದ ಕ್ಷೇತ್ರಗಳನ್ನು ಸರಿಪಡಿಸಿ",
    );
    /// `{secs}` is replaced with the remaining lock time.
    pub const RESEND_WAIT: Text = Text::new(
        "You can resend the OTP in {secs} seconds",
        "{secs} ಸೆಕೆಂಡುಗಳ ನಂತರ OTP ಮರುಕಳುಹಿಸಬಹುದು",
    );
    pub const WRONG_STEP: Text = Text::new(
        "This action is not available on the current step",
        "ಈ ಹಂತದಲ್ಲಿ ಈ ಕ್ರಿಯೆ ಲಭ್ಯವಿಲ್ಲ",
    );
    pub const BUSY: Text = Text::new(
        "Please wait, your request is being processed",
        "ದಯವಿಟ್ಟು ನಿರೀಕ್ಷಿಸಿ, ನಿಮ್ಮ ವಿನಂತಿಯನ್ನು ಪ್ರಕ್ರಿಯೆಗೊಳಿಸಲಾಗುತ್ತಿದೆ",
    );
    pub const CANNOT_GO_BACK: Text = Text::new(
        "You cannot go back from this step",
        "ಈ ಹಂತದಿಂದ ಹಿಂದಕ್ಕೆ ಹೋಗಲು ಸಾಧ್ಯವಿಲ್ಲ",
    );
    pub const OTP_CELL_INVALID: Text = Text::new(
        "That OTP box does not exist",
        "ಆ OTP ಪೆಟ್ಟಿಗೆ ಅಸ್ತಿತ್ವದಲ್ಲಿಲ್ಲ",
    );
    pub const REQUEST_CANCELLED: Text = Text::new(
        "The request was cancelled. Please try again.",
        "ವಿನಂತಿಯನ್ನು ರದ್ದುಗೊಳಿಸಲಾಗಿದೆ. ದಯವಿಟ್ಟು ಮತ್ತೊಮ್ಮೆ ಪ್ರಯತ್ನಿಸಿ.",
    );
    pub const REQUEST_STALE: Text = Text::new(
        "The page has moved on. Please check the current step.",
        "ಪುಟ ಮುಂದುವರಿದಿದೆ. ದಯವಿಟ್ಟು ಪ್ರಸ್ತುತ ಹಂತವನ್ನು ಪರಿಶೀಲಿಸಿ.",
    );
    pub const SESSION_NOT_FOUND: Text = Text::new(
        "Registration session not found. Please start again.",
        "ನೋಂದಣಿ ಅವಧಿ ಕಂಡುಬಂದಿಲ್ಲ. ದಯವಿಟ್ಟು ಮತ್ತೆ ಪ್ರಾರಂಭಿಸಿ.",
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_only_known_codes() {
        assert_eq!(Language::parse("en"), Some(Language::En));
        assert_eq!(Language::parse("kn"), Some(Language::Kn));
        assert_eq!(Language::parse("fr"), None);
        assert_eq!(Language::parse(""), None);
    }

    #[test]
    fn default_is_kannada() {
        assert_eq!(Language::default(), Language::Kn);
    }

    #[test]
    fn display_matches_serde() {
        for lang in [Language::En, Language::Kn] {
            let json = serde_json::to_string(&lang).unwrap();
            assert_eq!(format!("\"{lang}\""), json);
        }
    }

    #[test]
    fn text_picks_language() {
        let text = messages::PHONE_INVALID;
        assert!(text.get(Language::En).starts_with("Please enter"));
        assert!(text.get(Language::Kn).contains("ಫೋನ್"));
    }
}
