//! Entry fee, payment summary and the payment seam.

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use uuid::Uuid;

use super::model::RegistrationRecord;
use crate::i18n::Language;

/// Non-refundable entry fee in rupees.
pub const ENTRY_FEE: Decimal = dec!(500);
pub const CURRENCY: &str = "INR";

/// Static summary shown on the payment step.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    pub student_name: String,
    pub grade: String,
    pub school_name: String,
    pub category: String,
    pub language: String,
    pub fee: Decimal,
    pub currency: &'static str,
    /// Fee formatted for display, e.g. `₹500`.
    pub fee_display: String,
}

impl PaymentSummary {
    pub fn from_record(record: &RegistrationRecord, display_language: Language) -> Self {
        Self {
            student_name: record.student_name.clone(),
            grade: record.grade.clone(),
            school_name: record.school_name.clone(),
            category: record
                .category
                .map(|c| c.label().get(display_language).to_string())
                .unwrap_or_default(),
            language: record.language.map(|l| l.display_name().to_string()).unwrap_or_default(),
            fee: ENTRY_FEE,
            currency: CURRENCY,
            fee_display: format!("₹{ENTRY_FEE}"),
        }
    }
}

/// Proof that a payment went through.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub reference: String,
    pub amount: Decimal,
    pub currency: &'static str,
}

/// Collects the entry fee.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, record: &RegistrationRecord, amount: Decimal) -> PaymentReceipt;
}

/// Test seam standing in for a payment provider: every charge succeeds and
/// nothing leaves the process.
#[derive(Debug, Default)]
pub struct SimulatedGateway;

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn charge(&self, _record: &RegistrationRecord, amount: Decimal) -> PaymentReceipt {
        PaymentReceipt {
            reference: format!("SIM-{}", Uuid::new_v4().simple()),
            amount,
            currency: CURRENCY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registration::model::Category;

    #[test]
    fn summary_shows_fixed_fee() {
        let mut record = RegistrationRecord::default();
        record.student_name = "Ananya Rao".into();
        record.category = Some(Category::CreativeNonFiction);
        record.language = Some(Language::Kn);

        let summary = PaymentSummary::from_record(&record, Language::En);
        assert_eq!(summary.fee, dec!(500));
        assert_eq!(summary.fee_display, "₹500");
        assert_eq!(summary.category, "Creative Non-fiction");
        assert_eq!(summary.language, "Kannada (ಕನ್ನಡ)");
    }

    #[test]
    fn summary_category_follows_display_language() {
        let mut record = RegistrationRecord::default();
        record.category = Some(Category::Poetry);
        let summary = PaymentSummary::from_record(&record, Language::Kn);
        assert_eq!(summary.category, "ಕವಿತೆ");
    }

    #[tokio::test]
    async fn simulated_gateway_always_succeeds() {
        let receipt = SimulatedGateway
            .charge(&RegistrationRecord::default(), ENTRY_FEE)
            .await;
        assert_eq!(receipt.amount, ENTRY_FEE);
        assert_eq!(receipt.currency, "INR");
        assert!(receipt.reference.starts_with("SIM-"));
    }
}
