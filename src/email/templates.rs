//! Bilingual confirmation email bodies.

use crate::i18n::Language;
use crate::registration::model::RegistrationRecord;

const SUPPORT_EMAIL: &str = "support@janapada.com";
const SUPPORT_PHONE: &str = "+91 98765 43210";
const WEBSITE: &str = "www.janapada.com";

/// A rendered confirmation email.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Escape a value for interpolation into HTML text or attributes.
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn pick(language: Language, en: &'static str, kn: &'static str) -> &'static str {
    match language {
        Language::En => en,
        Language::Kn => kn,
    }
}

pub fn subject(registration_id: &str, language: Language) -> String {
    match language {
        Language::En => format!("Registration Confirmed - {registration_id} - JANAPADA"),
        Language::Kn => format!("ನೋಂದಣಿ ದೃಢೀಕರಿಸಲಾಗಿದೆ - {registration_id} - ಜನಪದ"),
    }
}

/// Field values as they appear in both bodies (unescaped).
struct Fields {
    registration_id: String,
    student_name: String,
    email: String,
    phone: String,
    grade: String,
    school: String,
    language: &'static str,
    category: String,
    parent_name: String,
    parent_email: String,
    parent_phone: String,
    relationship: String,
}

impl Fields {
    fn from_record(record: &RegistrationRecord, language: Language) -> Self {
        Self {
            registration_id: record
                .registration_id
                .as_ref()
                .map(|id| id.as_str().to_string())
                .unwrap_or_default(),
            student_name: record.student_name.clone(),
            email: record.email.clone(),
            phone: format!("+91 {}", record.phone),
            grade: record.grade.clone(),
            school: record.school_name.clone(),
            language: record.language.map(|l| l.display_name()).unwrap_or_default(),
            category: record
                .category
                .map(|c| c.label().get(language).to_string())
                .unwrap_or_default(),
            parent_name: record.parent_name.clone(),
            parent_email: record.parent_email.clone(),
            parent_phone: format!("+91 {}", record.parent_phone),
            relationship: record.relationship.clone(),
        }
    }

    fn student_rows(&self, l: Language) -> [(&'static str, &str); 7] {
        [
            (pick(l, "Full Name", "ಪೂರ್ಣ ಹೆಸರು"), self.student_name.as_str()),
            (pick(l, "Email", "ಇಮೇಲ್"), self.email.as_str()),
            (pick(l, "Phone", "ಫೋನ್"), self.phone.as_str()),
            (pick(l, "Grade", "ತರಗತಿ"), self.grade.as_str()),
            (pick(l, "School", "ಶಾಲೆ"), self.school.as_str()),
            (pick(l, "Language", "ಭಾಷೆ"), self.language),
            (pick(l, "Category", "ವರ್ಗ"), self.category.as_str()),
        ]
    }

    fn parent_rows(&self, l: Language) -> [(&'static str, &str); 4] {
        [
            (pick(l, "Name", "ಹೆಸರು"), self.parent_name.as_str()),
            (pick(l, "Email", "ಇಮೇಲ್"), self.parent_email.as_str()),
            (pick(l, "Phone", "ಫೋನ್"), self.parent_phone.as_str()),
            (pick(l, "Relationship", "ಸಂಬಂಧ"), self.relationship.as_str()),
        ]
    }
}

/// (title, body) for each next step.
fn next_steps(l: Language) -> [(&'static str, &'static str); 4] {
    [
        (
            pick(l, "Write your essay", "ನಿಮ್ಮ ಪ್ರಬಂಧವನ್ನು ಬರೆಯಿರಿ"),
            pick(
                l,
                "Start working on your essay following the competition guidelines",
                "ಸ್ಪರ್ಧೆಯ ಮಾರ್ಗಸೂಚಿಗಳನ್ನು ಅನುಸರಿಸಿ ನಿಮ್ಮ ಪ್ರಬಂಧದಲ್ಲಿ ಕೆಲಸ ಮಾಡಲು ಪ್ರಾರಂಭಿಸಿ",
            ),
        ),
        (
            pick(l, "Submission deadline", "ಸಲ್ಲಿಕೆ ಕೊನೆಯ ದಿನಾಂಕ"),
            pick(
                l,
                "Submit your essay by January 15, 2026",
                "ಜನವರಿ 15, 2026 ರೊಳಗೆ ನಿಮ್ಮ ಪ್ರಬಂಧವನ್ನು ಸಲ್ಲಿಸಿ",
            ),
        ),
        (
            pick(l, "Evaluation", "ಮೌಲ್ಯಮಾಪನ"),
            pick(
                l,
                "Submissions will be evaluated by our expert panel",
                "ನಮ್ಮ ತಜ್ಞ ಸಮಿತಿಯಿಂದ ಸಲ್ಲಿಕೆಗಳನ್ನು ಮೌಲ್ಯಮಾಪನ ಮಾಡಲಾಗುವುದು",
            ),
        ),
        (
            pick(l, "Results", "ಫಲಿತಾಂಶಗಳು"),
            pick(
                l,
                "Winners will be announced on January 31, 2026",
                "ಜನವರಿ 31, 2026 ರಂದು ವಿಜೇತರನ್ನು ಘೋಷಿಸಲಾಗುವುದು",
            ),
        ),
    ]
}

const TAGLINE: (&str, &str) = (
    "Nurturing Young Readers & Writers",
    "ಯುವ ಓದುಗರು ಮತ್ತು ಬರಹಗಾರರನ್ನು ಪೋಷಿಸುವುದು",
);
const CONGRATS: (&str, &str) = (
    "Congratulations! Your registration for the JANAPADA Essay Writing Competition has been successfully confirmed.",
    "ಅಭಿನಂದನೆಗಳು! ಜನಪದ ಪ್ರಬಂಧ ಬರವಣಿಗೆ ಸ್ಪರ್ಧೆಗೆ ನಿಮ್ಮ ನೋಂದಣಿಯನ್ನು ಯಶಸ್ವಿಯಾಗಿ ದೃಢೀಕರಿಸಲಾಗಿದೆ.",
);
const SAVE_ID: (&str, &str) = (
    "Please save this registration ID. You will need it for essay submission and to check your results.",
    "ದಯವಿಟ್ಟು ಈ ನೋಂದಣಿ ID ಅನ್ನು ಉಳಿಸಿ. ಪ್ರಬಂಧ ಸಲ್ಲಿಕೆ ಮತ್ತು ನಿಮ್ಮ ಫಲಿತಾಂಶಗಳನ್ನು ಪರಿಶೀಲಿಸಲು ನಿಮಗೆ ಇದು ಅಗತ್ಯವಿರುತ್ತದೆ.",
);
const CLOSING: (&str, &str) = (
    "We look forward to reading your essay and wish you the very best in the competition!",
    "ನಿಮ್ಮ ಪ್ರಬಂಧವನ್ನು ಓದಲು ನಾವು ಎದುರು ನೋಡುತ್ತಿದ್ದೇವೆ ಮತ್ತು ಸ್ಪರ್ಧೆಯಲ್ಲಿ ನಿಮಗೆ ಶುಭವಾಗಲಿ!",
);
const FOOTER: (&str, &str) = (
    "Building a Generation of Readers and Writers",
    "ಓದುಗರು ಮತ್ತು ಬರಹಗಾರರ ಪೀಳಿಗೆಯನ್ನು ನಿರ್ಮಿಸುವುದು",
);

fn pair(l: Language, text: (&'static str, &'static str)) -> &'static str {
    pick(l, text.0, text.1)
}

const STYLE: &str = "body{font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,Arial,sans-serif;line-height:1.6;color:#333;max-width:600px;margin:0 auto;padding:20px;background:#f5f5f5}\
.container{background:#fff;border-radius:12px;padding:40px}\
.header{text-align:center;border-bottom:3px solid #2563eb;padding-bottom:30px;margin-bottom:30px}\
.logo{font-size:32px;font-weight:800;color:#2563eb}\
.badge{background:#10b981;color:#fff;padding:15px 30px;border-radius:50px;display:inline-block;font-weight:600}\
.reg-id{border:2px solid #2563eb;border-radius:12px;padding:20px;text-align:center;margin:30px 0}\
.reg-id-value{font-size:28px;font-weight:900;color:#2563eb;letter-spacing:2px}\
.details{background:#f9fafb;border-radius:8px;padding:20px}\
.row{display:flex;justify-content:space-between;padding:12px 0;border-bottom:1px solid #e5e7eb}\
.note{background:#fee2e2;border-left:4px solid #dc2626;padding:15px;margin:20px 0}\
.steps{background:#fef3c7;border-left:4px solid #f59e0b;padding:20px;margin:30px 0}\
.footer{margin-top:40px;border-top:2px solid #e5e7eb;text-align:center;color:#6b7280;font-size:14px}";

fn html_rows(out: &mut String, rows: &[(&str, &str)]) {
    for (label, value) in rows {
        out.push_str(&format!(
            "<div class=\"row\"><span>{}:</span><span>{}</span></div>\n",
            label,
            escape_html(value)
        ));
    }
}

/// Render the HTML body. Every record value is escaped.
pub fn render_html(record: &RegistrationRecord, l: Language) -> String {
    let f = Fields::from_record(record, l);
    let mut out = String::with_capacity(8 * 1024);

    out.push_str(&format!(
        "<!DOCTYPE html>\n<html lang=\"{lang}\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>{title} - JANAPADA</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <div class=\"container\">\n<div class=\"header\">\n<div class=\"logo\">JANAPADA</div>\n",
        lang = l.as_str(),
        title = pick(l, "Registration Confirmation", "ನೋಂದಣಿ ದೃಢೀಕರಣ"),
    ));
    if l == Language::Kn {
        out.push_str("<div class=\"logo\">ಜನಪದ</div>\n");
    }
    out.push_str(&format!("<div>{}</div>\n</div>\n", pair(l, TAGLINE)));

    out.push_str(&format!(
        "<div style=\"text-align:center\"><div class=\"badge\">✓ {}</div></div>\n",
        pick(l, "Registration Successful!", "ನೋಂದಣಿ ಯಶಸ್ವಿಯಾಗಿದೆ!")
    ));
    out.push_str(&format!(
        "<div class=\"reg-id\"><div>{}</div><div class=\"reg-id-value\">{}</div></div>\n",
        pick(l, "Your Registration ID", "ನಿಮ್ಮ ನೋಂದಣಿ ID"),
        escape_html(&f.registration_id)
    ));
    out.push_str(&format!(
        "<p>{} <strong>{}</strong>,</p>\n<p>{}</p>\n",
        pick(l, "Dear", "ಆತ್ಮೀಯ"),
        escape_html(&f.student_name),
        pair(l, CONGRATS)
    ));

    out.push_str(&format!(
        "<h2>{}</h2>\n<div class=\"details\">\n",
        pick(l, "Student Details", "ವಿದ್ಯಾರ್ಥಿ ವಿವರಗಳು")
    ));
    html_rows(&mut out, &f.student_rows(l));
    out.push_str(&format!(
        "</div>\n<h2>{}</h2>\n<div class=\"details\">\n",
        pick(l, "Parent/Guardian Details", "ಪೋಷಕರ ವಿವರಗಳು")
    ));
    html_rows(&mut out, &f.parent_rows(l));
    out.push_str("</div>\n");

    out.push_str(&format!(
        "<div class=\"note\"><p><strong>⚠️ {}</strong></p><p>{}</p></div>\n",
        pick(l, "Important: Save Your Registration ID", "ಮುಖ್ಯ: ನಿಮ್ಮ ನೋಂದಣಿ ID ಅನ್ನು ಉಳಿಸಿ"),
        pair(l, SAVE_ID)
    ));

    out.push_str(&format!(
        "<div class=\"steps\"><p><strong>📋 {}</strong></p>\n<ul>\n",
        pick(l, "Next Steps", "ಮುಂದಿನ ಹಂತಗಳು")
    ));
    for (title, body) in next_steps(l) {
        out.push_str(&format!("<li><strong>{title}:</strong> {body}</li>\n"));
    }
    out.push_str("</ul>\n</div>\n");

    out.push_str(&format!(
        "<div class=\"contact\"><p><strong>📞 {help}</strong></p>\n\
         <p><strong>{email}:</strong> {SUPPORT_EMAIL}</p>\n\
         <p><strong>{phone}:</strong> {SUPPORT_PHONE}</p>\n\
         <p><strong>{web}:</strong> {WEBSITE}</p></div>\n",
        help = pick(l, "Need Help?", "ಸಹಾಯ ಬೇಕೇ?"),
        email = pick(l, "Email", "ಇಮೇಲ್"),
        phone = pick(l, "Phone", "ಫೋನ್"),
        web = pick(l, "Website", "ವೆಬ್‌ಸೈಟ್"),
    ));

    out.push_str(&format!(
        "<p>{}</p>\n<p>{}<br><strong>{}</strong></p>\n",
        pair(l, CLOSING),
        pick(l, "Best regards,", "ಶುಭಾಶಯಗಳು,"),
        pick(l, "Team JANAPADA", "ತಂಡ ಜನಪದ")
    ));
    out.push_str(&format!(
        "<div class=\"footer\"><p>{}</p><p>© 2026 JANAPADA. {}</p></div>\n</div>\n</body>\n</html>",
        pair(l, FOOTER),
        pick(l, "All rights reserved.", "ಎಲ್ಲಾ ಹಕ್ಕುಗಳನ್ನು ಕಾಯ್ದಿರಿಸಲಾಗಿದೆ.")
    ));
    out
}

/// Render the plain-text body.
pub fn render_text(record: &RegistrationRecord, l: Language) -> String {
    let f = Fields::from_record(record, l);
    let mut lines: Vec<String> = Vec::with_capacity(64);

    lines.push(pick(l, "JANAPADA", "JANAPADA - ಜನಪದ").to_string());
    lines.push(pair(l, TAGLINE).to_string());
    lines.push(String::new());
    lines.push(pick(l, "REGISTRATION SUCCESSFUL!", "ನೋಂದಣಿ ಯಶಸ್ವಿಯಾಗಿದೆ!").to_string());
    lines.push(String::new());
    lines.push(format!(
        "{}: {}",
        pick(l, "Your Registration ID", "ನಿಮ್ಮ ನೋಂದಣಿ ID"),
        f.registration_id
    ));
    lines.push(String::new());
    lines.push(format!("{} {},", pick(l, "Dear", "ಆತ್ಮೀಯ"), f.student_name));
    lines.push(String::new());
    lines.push(pair(l, CONGRATS).to_string());
    lines.push(String::new());

    lines.push(pick(l, "STUDENT DETAILS", "ವಿದ್ಯಾರ್ಥಿ ವಿವರಗಳು").to_string());
    lines.extend(f.student_rows(l).iter().map(|(k, v)| format!("{k}: {v}")));
    lines.push(String::new());
    lines.push(pick(l, "PARENT/GUARDIAN DETAILS", "ಪೋಷಕರ ವಿವರಗಳು").to_string());
    lines.extend(f.parent_rows(l).iter().map(|(k, v)| format!("{k}: {v}")));
    lines.push(String::new());

    lines.push(format!(
        "⚠️ {}",
        pick(l, "IMPORTANT: SAVE YOUR REGISTRATION ID", "ಮುಖ್ಯ: ನಿಮ್ಮ ನೋಂದಣಿ ID ಅನ್ನು ಉಳಿಸಿ")
    ));
    lines.push(pair(l, SAVE_ID).to_string());
    lines.push(String::new());

    lines.push(format!("📋 {}", pick(l, "NEXT STEPS", "ಮುಂದಿನ ಹಂತಗಳು")));
    for (i, (title, body)) in next_steps(l).iter().enumerate() {
        lines.push(String::new());
        lines.push(format!("{}. {title}: {body}", i + 1));
    }
    lines.push(String::new());

    lines.push(format!("📞 {}", pick(l, "NEED HELP?", "ಸಹಾಯ ಬೇಕೇ?")));
    lines.push(format!("{}: {SUPPORT_EMAIL}", pick(l, "Email", "ಇಮೇಲ್")));
    lines.push(format!("{}: {SUPPORT_PHONE}", pick(l, "Phone", "ಫೋನ್")));
    lines.push(format!("{}: {WEBSITE}", pick(l, "Website", "ವೆಬ್‌ಸೈಟ್")));
    lines.push(String::new());

    lines.push(pair(l, CLOSING).to_string());
    lines.push(String::new());
    lines.push(pick(l, "Best regards,", "ಶುಭಾಶಯಗಳು,").to_string());
    lines.push(pick(l, "Team JANAPADA", "ತಂಡ ಜನಪದ").to_string());
    lines.push(String::new());
    lines.push("---".to_string());
    lines.push(pair(l, FOOTER).to_string());
    lines.push(format!(
        "© 2026 JANAPADA. {}",
        pick(l, "All rights reserved.", "ಎಲ್ಲಾ ಹಕ್ಕುಗಳನ್ನು ಕಾಯ್ದಿರಿಸಲಾಗಿದೆ.")
    ));

    lines.join("\n")
}

/// Render subject and both bodies.
pub fn render(record: &RegistrationRecord, language: Language) -> RenderedEmail {
    let id = record
        .registration_id
        .as_ref()
        .map(|id| id.as_str())
        .unwrap_or_default();
    RenderedEmail {
        subject: subject(id, language),
        html: render_html(record, language),
        text: render_text(record, language),
    }
}
