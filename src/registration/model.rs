//! Registration record and the option sets the form offers.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::i18n::{Language, Text};

/// Who is filling in the wizard.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Student,
    Parent,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Student => write!(f, "student"),
            Self::Parent => write!(f, "parent"),
        }
    }
}

/// Competition category.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Essay,
    ShortStory,
    Poetry,
    CreativeNonFiction,
}

impl Category {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "essay" => Some(Self::Essay),
            "short_story" => Some(Self::ShortStory),
            "poetry" => Some(Self::Poetry),
            "creative_non_fiction" => Some(Self::CreativeNonFiction),
            _ => None,
        }
    }

    pub fn label(&self) -> Text {
        match self {
            Self::Essay => Text::new("Essay", "ಪ್ರಬಂಧ"),
            Self::ShortStory => Text::new("Short Story", "ಕಿರುಕಥೆ"),
            Self::Poetry => Text::new("Poetry", "ಕವಿತೆ"),
            Self::CreativeNonFiction => Text::new("Creative Non-fiction", "ಸೃಜನಾತ್ಮಕ ಪ್ರಬಂಧ"),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Essay => "essay",
            Self::ShortStory => "short_story",
            Self::Poetry => "poetry",
            Self::CreativeNonFiction => "creative_non_fiction",
        };
        write!(f, "{s}")
    }
}

/// Option sets for the select fields of the details form.
pub mod options {
    pub const GENDERS: &[&str] = &["male", "female", "other"];
    pub const GRADES: &[&str] = &["9", "10", "11", "12"];
    pub const RELATIONSHIPS: &[&str] = &["father", "mother", "guardian"];
    pub const REFERRAL_SOURCES: &[&str] = &["school", "social_media", "friends", "website", "other"];
    pub const INDIAN_STATES: &[&str] = &[
        "Andhra Pradesh",
        "Arunachal Pradesh",
        "Assam",
        "Bihar",
        "Chhattisgarh",
        "Goa",
        "Gujarat",
        "Haryana",
        "Himachal Pradesh",
        "Jharkhand",
        "Karnataka",
        "Kerala",
        "Madhya Pradesh",
        "Maharashtra",
        "Manipur",
        "Meghalaya",
        "Mizoram",
        "Nagaland",
        "Odisha",
        "Punjab",
        "Rajasthan",
        "Sikkim",
        "Tamil Nadu",
        "Telangana",
        "Tripura",
        "Uttar Pradesh",
        "Uttarakhand",
        "West Bengal",
        "Delhi",
    ];
}

/// Display-only registration identifier, e.g. `JAN2026-4821`.
///
/// Not unique and never persisted; collisions are possible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrationId(String);

impl RegistrationId {
    pub const PREFIX: &'static str = "JAN2026-";

    /// Draw a fresh id with a random suffix in 1000..=9999.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let suffix: u16 = rng.gen_range(1000..=9999);
        Self(format!("{}{suffix}", Self::PREFIX))
    }

    /// Whether `value` has the `JAN2026-dddd` shape.
    pub fn is_well_formed(value: &str) -> bool {
        value
            .strip_prefix(Self::PREFIX)
            .is_some_and(|rest| rest.len() == 4 && rest.bytes().all(|b| b.is_ascii_digit()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The accumulator record filled in across the wizard steps.
///
/// Later steps never erase what earlier ones set: every merge skips empty
/// incoming values, and `registration_id` is write-once.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationRecord {
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_id: Option<RegistrationId>,
}

/// Validated output of the details form, ready to merge.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationDetails {
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
    pub category: Category,
    pub language: Language,
    pub referral_source: Option<String>,
}

fn fill(target: &mut String, value: &str) {
    if !value.is_empty() {
        *target = value.to_string();
    }
}

impl RegistrationRecord {
    /// Merge the verified phone number and role from the first step.
    pub fn merge_contact(&mut self, phone: &str, role: Role) {
        fill(&mut self.phone, phone);
        self.role = Some(role);
    }

    /// Merge the validated details form.
    pub fn merge_details(&mut self, details: &RegistrationDetails) {
        fill(&mut self.student_name, &details.student_name);
        fill(&mut self.date_of_birth, &details.date_of_birth);
        fill(&mut self.gender, &details.gender);
        fill(&mut self.email, &details.email);
        fill(&mut self.grade, &details.grade);
        fill(&mut self.school_name, &details.school_name);
        fill(&mut self.school_city, &details.school_city);
        fill(&mut self.school_state, &details.school_state);
        fill(&mut self.parent_name, &details.parent_name);
        fill(&mut self.parent_email, &details.parent_email);
        fill(&mut self.parent_phone, &details.parent_phone);
        fill(&mut self.relationship, &details.relationship);
        self.category = Some(details.category);
        self.language = Some(details.language);
        if let Some(source) = details.referral_source.as_ref().filter(|s| !s.is_empty()) {
            self.referral_source = Some(source.clone());
        }
    }

    /// Set the registration id. Returns `false` (and keeps the old id) if
    /// one was already assigned.
    pub fn assign_registration_id(&mut self, id: RegistrationId) -> bool {
        if self.registration_id.is_some() {
            return false;
        }
        self.registration_id = Some(id);
        true
    }

    /// Whether the parent should receive a separate copy of the confirmation.
    pub fn parent_needs_copy(&self) -> bool {
        !self.parent_email.is_empty() && self.parent_email != self.email
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn details() -> RegistrationDetails {
        RegistrationDetails {
            student_name: "Ananya Rao".into(),
            date_of_birth: "2010-05-14".into(),
            gender: "female".into(),
            email: "ananya@example.com".into(),
            grade: "10".into(),
            school_name: "Sadvidya High School".into(),
            school_city: "Mysuru".into(),
            school_state: "Karnataka".into(),
            parent_name: "Ravi Rao".into(),
            parent_email: "ravi@example.com".into(),
            parent_phone: "9123456780".into(),
            relationship: "father".into(),
            category: Category::ShortStory,
            language: Language::Kn,
            referral_source: None,
        }
    }

    #[test]
    fn registration_id_has_expected_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let id = RegistrationId::generate(&mut rng);
            assert!(RegistrationId::is_well_formed(id.as_str()), "bad id {id}");
            let suffix: u16 = id.as_str()[RegistrationId::PREFIX.len()..].parse().unwrap();
            assert!((1000..=9999).contains(&suffix));
        }
    }

    #[test]
    fn well_formed_rejects_other_shapes() {
        assert!(RegistrationId::is_well_formed("JAN2026-1234"));
        assert!(!RegistrationId::is_well_formed("JAN2026-123"));
        assert!(!RegistrationId::is_well_formed("JAN2026-12345"));
        assert!(!RegistrationId::is_well_formed("JAN2025-1234"));
        assert!(!RegistrationId::is_well_formed("JAN2026-12a4"));
    }

    #[test]
    fn registration_id_is_write_once() {
        let mut record = RegistrationRecord::default();
        assert!(record.assign_registration_id(RegistrationId("JAN2026-1111".into())));
        assert!(!record.assign_registration_id(RegistrationId("JAN2026-2222".into())));
        assert_eq!(record.registration_id.unwrap().as_str(), "JAN2026-1111");
    }

    #[test]
    fn merge_never_erases_filled_fields() {
        let mut record = RegistrationRecord::default();
        record.merge_contact("9876543210", Role::Parent);
        record.merge_details(&details());

        let mut blank = details();
        blank.student_name.clear();
        blank.parent_phone.clear();
        record.merge_details(&blank);

        assert_eq!(record.phone, "9876543210");
        assert_eq!(record.role, Some(Role::Parent));
        assert_eq!(record.student_name, "Ananya Rao");
        assert_eq!(record.parent_phone, "9123456780");
        assert_eq!(record.category, Some(Category::ShortStory));

        record.merge_contact("", Role::Student);
        assert_eq!(record.phone, "9876543210");
    }

    #[test]
    fn record_serializes_camel_case() {
        let mut record = RegistrationRecord::default();
        record.merge_contact("9876543210", Role::Student);
        record.merge_details(&details());

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["studentName"], "Ananya Rao");
        assert_eq!(json["parentPhone"], "9123456780");
        assert_eq!(json["category"], "short_story");
        assert_eq!(json["language"], "kn");
        assert!(json.get("registrationId").is_none());
    }

    #[test]
    fn record_accepts_partial_json() {
        let record: RegistrationRecord = serde_json::from_str(
            r#"{"phone":"9876543210","role":"parent","email":"a@b.co","registrationId":"JAN2026-4321"}"#,
        )
        .unwrap();
        assert_eq!(record.role, Some(Role::Parent));
        assert_eq!(record.registration_id.unwrap().as_str(), "JAN2026-4321");
        assert!(record.student_name.is_empty());
    }

    #[test]
    fn parent_copy_only_for_distinct_address() {
        let mut record = RegistrationRecord::default();
        record.email = "kid@example.com".into();
        assert!(!record.parent_needs_copy());
        record.parent_email = "kid@example.com".into();
        assert!(!record.parent_needs_copy());
        record.parent_email = "mum@example.com".into();
        assert!(record.parent_needs_copy());
    }

    #[test]
    fn category_parse_and_display_agree() {
        for raw in ["essay", "short_story", "poetry", "creative_non_fiction"] {
            let category = Category::parse(raw).unwrap();
            assert_eq!(category.to_string(), raw);
            assert_eq!(serde_json::to_string(&category).unwrap(), format!("\"{raw}\""));
        }
        assert!(Category::parse("drama").is_none());
    }
}
