//! Synchronous input validation for the phone and details steps.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::model::{Category, RegistrationDetails, RegistrationRecord, Role, options};
use crate::i18n::{Language, Text, messages};

/// Length of an India-local mobile number (no country code).
pub const PHONE_LEN: usize = 10;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Strip non-digits and truncate to ten digits, as the phone inputs do on
/// every keystroke.
pub fn sanitize_phone(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).take(PHONE_LEN).collect()
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Why the phone step refused to advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhoneRejection {
    InvalidNumber,
    TermsNotAccepted,
}

impl PhoneRejection {
    pub fn message(&self) -> Text {
        match self {
            Self::InvalidNumber => messages::PHONE_INVALID,
            Self::TermsNotAccepted => messages::TERMS_REQUIRED,
        }
    }
}

impl std::fmt::Display for PhoneRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message().en)
    }
}

/// Validate the phone step. The number length is checked before the terms.
///
/// Returns the sanitized number on success.
pub fn validate_phone(raw: &str, accepted_terms: bool) -> Result<String, PhoneRejection> {
    let phone = sanitize_phone(raw);
    if phone.len() != PHONE_LEN {
        return Err(PhoneRejection::InvalidNumber);
    }
    if !accepted_terms {
        return Err(PhoneRejection::TermsNotAccepted);
    }
    Ok(phone)
}

/// Fields of the details form, in on-screen order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    StudentName,
    DateOfBirth,
    Gender,
    Email,
    Grade,
    SchoolName,
    SchoolCity,
    SchoolState,
    ParentName,
    ParentEmail,
    ParentPhone,
    Relationship,
    Category,
    Language,
    ReferralSource,
}

impl FormField {
    fn error_text(&self) -> Text {
        match self {
            Self::StudentName => Text::new(
                "Full name must be at least 3 characters",
                "ಪೂರ್ಣ ಹೆಸರು ಕನಿಷ್ಠ 3 ಅಕ್ಷರಗಳಾಗಿರಬೇಕು",
            ),
            Self::DateOfBirth => Text::new("Date of birth is required", "ಹುಟ್ಟಿದ ದಿನಾಂಕ ಅಗತ್ಯವಿದೆ"),
            Self::Gender => Text::new("Please select gender", "ದಯವಿಟ್ಟು ಲಿಂಗವನ್ನು ಆಯ್ಕೆಮಾಡಿ"),
            Self::Email => Text::new("Valid email is required", "ಮಾನ್ಯ ಇಮೇಲ್ ಅಗತ್ಯವಿದೆ"),
            Self::Grade => Text::new("Please select grade", "ದಯವಿಟ್ಟು ತರಗತಿ ಆಯ್ಕೆಮಾಡಿ"),
            Self::SchoolName => Text::new(
                "School name must be at least 5 characters",
                "ಶಾಲೆಯ ಹೆಸರು ಕನಿಷ್ಠ 5 ಅಕ್ಷರಗಳಾಗಿರಬೇಕು",
            ),
            Self::SchoolCity => Text::new("School city is required", "ಶಾಲೆಯ ನಗರ ಅಗತ್ಯವಿದೆ"),
            Self::SchoolState => Text::new("Please select state", "ದಯವಿಟ್ಟು ರಾಜ್ಯವನ್ನು ಆಯ್ಕೆಮಾಡಿ"),
            Self::ParentName => Text::new(
                "Parent name must be at least 3 characters",
                "ಪೋಷಕರ ಹೆಸರು ಕನಿಷ್ಠ 3 ಅಕ್ಷರಗಳಾಗಿರಬೇಕು",
            ),
            Self::ParentEmail => Text::new("Valid parent email is required", "ಮಾನ್ಯ ಪೋಷಕರ ಇಮೇಲ್ ಅಗತ್ಯವಿದೆ"),
            Self::ParentPhone => Text::new(
                "Valid 10-digit phone number required",
                "ಮಾನ್ಯ 10-ಅಂಕಿಯ ಫೋನ್ ಸಂಖ್ಯೆ ಅಗತ್ಯವಿದೆ",
            ),
            Self::Relationship => Text::new("Please select relationship", "ದಯವಿಟ್ಟು ಸಂಬಂಧವನ್ನು ಆಯ್ಕೆಮಾಡಿ"),
            Self::Category => Text::new("Please select category", "ದಯವಿಟ್ಟು ವರ್ಗವನ್ನು ಆಯ್ಕೆಮಾಡಿ"),
            Self::Language => Text::new("Please select language", "ದಯವಿಟ್ಟು ಭಾಷೆಯನ್ನು ಆಯ್ಕೆಮಾಡಿ"),
            Self::ReferralSource => Text::new("Please select a valid option", "ದಯವಿಟ್ಟು ಮಾನ್ಯ ಆಯ್ಕೆಯನ್ನು ಆರಿಸಿ"),
        }
    }
}

/// Field errors collected from one submit, ordered by form position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormErrors(BTreeMap<FormField, Text>);

impl FormErrors {
    fn flag(&mut self, field: FormField) {
        self.0.insert(field, field.error_text());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: FormField) -> bool {
        self.0.contains_key(&field)
    }

    /// The field the view should scroll to.
    pub fn first(&self) -> Option<FormField> {
        self.0.keys().next().copied()
    }

    pub fn clear(&mut self, field: FormField) {
        self.0.remove(&field);
    }

    pub fn fields(&self) -> impl Iterator<Item = FormField> + '_ {
        self.0.keys().copied()
    }

    /// Render the messages in `language`, keyed by field.
    pub fn localized(&self, language: Language) -> BTreeMap<FormField, &'static str> {
        self.0.iter().map(|(field, text)| (*field, text.get(language))).collect()
    }
}

/// Raw details form as submitted. All values are plain strings; select
/// fields carry their option value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationForm {
    pub student_name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub email: String,
    pub grade: String,
    pub school_name: String,
    pub school_city: String,
    pub school_state: String,
    pub parent_name: String,
    pub parent_email: String,
    pub parent_phone: String,
    pub relationship: String,
    pub category: String,
    pub language: String,
    pub referral_source: String,
}

impl RegistrationForm {
    /// Initial form contents for a session: whatever the record already
    /// holds, the display language as the competition language, and the
    /// verified phone as the parent phone when a parent is registering.
    pub fn prefilled(record: &RegistrationRecord, display_language: Language) -> Self {
        let parent_phone = if !record.parent_phone.is_empty() {
            record.parent_phone.clone()
        } else if record.role == Some(Role::Parent) {
            record.phone.clone()
        } else {
            String::new()
        };

        Self {
            student_name: record.student_name.clone(),
            date_of_birth: record.date_of_birth.clone(),
            gender: record.gender.clone(),
            email: record.email.clone(),
            grade: record.grade.clone(),
            school_name: record.school_name.clone(),
            school_city: record.school_city.clone(),
            school_state: record.school_state.clone(),
            parent_name: record.parent_name.clone(),
            parent_email: record.parent_email.clone(),
            parent_phone,
            relationship: record.relationship.clone(),
            category: record.category.map(|c| c.to_string()).unwrap_or_default(),
            language: record.language.unwrap_or(display_language).to_string(),
            referral_source: record.referral_source.clone().unwrap_or_default(),
        }
    }

    /// Update one field the way the input handlers do. The parent phone is
    /// sanitized like the primary phone input.
    pub fn set(&mut self, field: FormField, value: &str) {
        let slot = match field {
            FormField::StudentName => &mut self.student_name,
            FormField::DateOfBirth => &mut self.date_of_birth,
            FormField::Gender => &mut self.gender,
            FormField::Email => &mut self.email,
            FormField::Grade => &mut self.grade,
            FormField::SchoolName => &mut self.school_name,
            FormField::SchoolCity => &mut self.school_city,
            FormField::SchoolState => &mut self.school_state,
            FormField::ParentName => &mut self.parent_name,
            FormField::ParentEmail => &mut self.parent_email,
            FormField::ParentPhone => {
                self.parent_phone = sanitize_phone(value);
                return;
            }
            FormField::Relationship => &mut self.relationship,
            FormField::Category => &mut self.category,
            FormField::Language => &mut self.language,
            FormField::ReferralSource => &mut self.referral_source,
        };
        *slot = value.to_string();
    }
}

fn min_len(value: &str, len: usize) -> bool {
    !value.trim().is_empty() && value.chars().count() >= len
}

fn one_of(value: &str, allowed: &[&str]) -> bool {
    allowed.contains(&value)
}

fn is_iso_date(value: &str) -> bool {
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

/// Validate the whole form, collecting every error.
///
/// `display_language` is used when the form leaves the competition language
/// empty.
pub fn validate_form(
    form: &RegistrationForm,
    display_language: Language,
) -> Result<RegistrationDetails, FormErrors> {
    let mut errors = FormErrors::default();

    if !min_len(&form.student_name, 3) {
        errors.flag(FormField::StudentName);
    }
    if !is_iso_date(&form.date_of_birth) {
        errors.flag(FormField::DateOfBirth);
    }
    if !one_of(&form.gender, options::GENDERS) {
        errors.flag(FormField::Gender);
    }
    if !is_valid_email(&form.email) {
        errors.flag(FormField::Email);
    }
    if !one_of(&form.grade, options::GRADES) {
        errors.flag(FormField::Grade);
    }
    if !min_len(&form.school_name, 5) {
        errors.flag(FormField::SchoolName);
    }
    if form.school_city.trim().is_empty() {
        errors.flag(FormField::SchoolCity);
    }
    if !one_of(&form.school_state, options::INDIAN_STATES) {
        errors.flag(FormField::SchoolState);
    }
    if !min_len(&form.parent_name, 3) {
        errors.flag(FormField::ParentName);
    }
    if !is_valid_email(&form.parent_email) {
        errors.flag(FormField::ParentEmail);
    }
    if form.parent_phone.len() != PHONE_LEN || !form.parent_phone.bytes().all(|b| b.is_ascii_digit()) {
        errors.flag(FormField::ParentPhone);
    }
    if !one_of(&form.relationship, options::RELATIONSHIPS) {
        errors.flag(FormField::Relationship);
    }
    let category = Category::parse(&form.category);
    if category.is_none() {
        errors.flag(FormField::Category);
    }
    let language = if form.language.is_empty() {
        Some(display_language)
    } else {
        Language::parse(&form.language)
    };
    if language.is_none() {
        errors.flag(FormField::Language);
    }
    let referral_source = match form.referral_source.as_str() {
        "" => None,
        source if one_of(source, options::REFERRAL_SOURCES) => Some(source.to_string()),
        _ => {
            errors.flag(FormField::ReferralSource);
            None
        }
    };

    match (category, language) {
        (Some(category), Some(language)) if errors.is_empty() => Ok(RegistrationDetails {
            student_name: form.student_name.trim().to_string(),
            date_of_birth: form.date_of_birth.clone(),
            gender: form.gender.clone(),
            email: form.email.clone(),
            grade: form.grade.clone(),
            school_name: form.school_name.trim().to_string(),
            school_city: form.school_city.trim().to_string(),
            school_state: form.school_state.clone(),
            parent_name: form.parent_name.trim().to_string(),
            parent_email: form.parent_email.clone(),
            parent_phone: form.parent_phone.clone(),
            relationship: form.relationship.clone(),
            category,
            language,
            referral_source,
        }),
        _ => Err(errors),
    }
}
