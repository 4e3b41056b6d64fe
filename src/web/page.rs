//! Server-rendered single page: the form and the two output regions

use crate::types::loan::{Category, CohortMonth, CompanyType, Industry, Segment, MAX_LOAN_TERM_DAYS};
use crate::types::{Prediction, PredictionRequest, RiskBanner};
use std::fmt::Write;

pub const TITLE: &str = "Loan Default Risk Predictor";

/// What to show below the form
pub enum Outcome<'a> {
    None,
    Scored(&'a Prediction),
    Failed(&'a str),
}

/// A form control that can render itself with its current value.
///
/// The submitted value is captured by decoding the form into a
/// [`PredictionRequest`], whose field names match each widget's `name`.
pub trait Widget {
    fn name(&self) -> &str;
    fn label(&self) -> &str;
    fn render_control(&self, out: &mut String);

    fn render(&self, out: &mut String) {
        let _ = write!(
            out,
            r#"<div class="field"><label for="{name}">{label}</label>"#,
            name = self.name(),
            label = escape(self.label()),
        );
        self.render_control(out);
        out.push_str("</div>\n");
    }
}

pub struct NumberInput {
    name: &'static str,
    label: &'static str,
    value: f64,
}

impl Widget for NumberInput {
    fn name(&self) -> &str {
        self.name
    }

    fn label(&self) -> &str {
        self.label
    }

    fn render_control(&self, out: &mut String) {
        let _ = write!(
            out,
            r#"<input type="number" id="{n}" name="{n}" value="{v}" step="any" required>"#,
            n = self.name,
            v = self.value,
        );
    }
}

pub struct Slider {
    name: &'static str,
    label: &'static str,
    min: u32,
    max: u32,
    value: u32,
}

impl Widget for Slider {
    fn name(&self) -> &str {
        self.name
    }

    fn label(&self) -> &str {
        self.label
    }

    fn render_control(&self, out: &mut String) {
        let _ = write!(
            out,
            r#"<input type="range" id="{n}" name="{n}" min="{min}" max="{max}" value="{v}" oninput="this.nextElementSibling.value=this.value"><output>{v}</output>"#,
            n = self.name,
            min = self.min,
            max = self.max,
            v = self.value,
        );
    }
}

pub struct Select {
    name: &'static str,
    label: &'static str,
    /// (submitted value, display text)
    options: Vec<(String, String)>,
    selected: String,
}

impl Select {
    fn of<C: Category>(name: &'static str, label: &'static str, selected: C) -> Self {
        Self {
            name,
            label,
            options: C::options().into_iter().map(|o| (o.clone(), o)).collect(),
            selected: selected.as_ref().to_string(),
        }
    }

    fn boolean(name: &'static str, label: &'static str, selected: bool) -> Self {
        Self {
            name,
            label,
            options: vec![
                ("true".to_string(), "True".to_string()),
                ("false".to_string(), "False".to_string()),
            ],
            selected: selected.to_string(),
        }
    }
}

impl Widget for Select {
    fn name(&self) -> &str {
        self.name
    }

    fn label(&self) -> &str {
        self.label
    }

    fn render_control(&self, out: &mut String) {
        let _ = write!(out, r#"<select id="{n}" name="{n}">"#, n = self.name);
        for (value, text) in &self.options {
            let selected = if *value == self.selected { " selected" } else { "" };
            let _ = write!(
                out,
                r#"<option value="{}"{}>{}</option>"#,
                escape(value),
                selected,
                escape(text)
            );
        }
        out.push_str("</select>");
    }
}

/// The seven controls, pre-filled from `request`.
pub fn widgets(request: &PredictionRequest) -> Vec<Box<dyn Widget>> {
    vec![
        Box::new(NumberInput {
            name: "INITIAL_LOAN_AMOUNT",
            label: "Loan Amount",
            value: request.initial_loan_amount,
        }),
        Box::new(Slider {
            name: "LOAN_TERM_LENGTH",
            label: "Loan Term (days)",
            min: 0,
            max: MAX_LOAN_TERM_DAYS,
            value: request.loan_term_length,
        }),
        Box::new(Select::boolean(
            "REPEAT_BORROWER",
            "Repeat Borrower",
            request.repeat_borrower,
        )),
        Box::new(Select::of::<Industry>("INDUSTRY", "Industry", request.industry)),
        Box::new(Select::of::<CompanyType>(
            "COMPANY_TYPE",
            "Company Type",
            request.company_type,
        )),
        Box::new(Select::of::<Segment>("SEGMENT", "Segment", request.segment)),
        Box::new(Select::of::<CohortMonth>(
            "COHORT_MONTH",
            "Cohort Month",
            request.cohort_month,
        )),
    ]
}

const STYLE: &str = r#"
body { font-family: sans-serif; max-width: 40rem; margin: 2rem auto; padding: 0 1rem; }
.field { margin-bottom: 1rem; display: flex; flex-direction: column; }
.field label { font-weight: 600; margin-bottom: .25rem; }
.result { padding: .75rem 1rem; border-radius: .4rem; margin-top: 1rem; }
.success { background: #e6f4ea; color: #1e4620; }
.high-risk { background: #fdecea; color: #611a15; }
.low-risk { background: #e8f0fe; color: #174ea6; }
.error { background: #fdecea; color: #611a15; font-family: monospace; }
"#;

/// Render the whole page.
pub fn render_page(request: &PredictionRequest, outcome: Outcome<'_>) -> String {
    let mut out = String::with_capacity(4096);
    let _ = write!(
        out,
        "<!DOCTYPE html>\n<html lang=\"en\"><head><meta charset=\"utf-8\"><title>{t}</title><style>{STYLE}</style></head><body>\n<h1>{t}</h1>\n<form method=\"post\" action=\"/predict\">\n",
        t = TITLE,
    );

    for widget in widgets(request) {
        widget.render(&mut out);
    }
    out.push_str("<button type=\"submit\">Predict</button>\n</form>\n");

    match outcome {
        Outcome::None => {}
        Outcome::Scored(prediction) => {
            let _ = write!(
                out,
                "<div class=\"result success\" id=\"probability\">{}</div>\n",
                escape(&prediction.probability_message())
            );
            let class = match prediction.risk {
                RiskBanner::High => "high-risk",
                RiskBanner::Low => "low-risk",
            };
            let _ = write!(
                out,
                "<div class=\"result {}\" id=\"risk\">{}</div>\n",
                class,
                prediction.risk.message()
            );
        }
        Outcome::Failed(message) => {
            let _ = write!(
                out,
                "<div class=\"result error\" id=\"error\">{}</div>\n",
                escape(message)
            );
        }
    }

    out.push_str("</body></html>\n");
    out
}

/// Minimal HTML text escaping
pub fn escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_has_seven_controls() {
        let page = render_page(&PredictionRequest::default(), Outcome::None);
        assert!(page.contains(TITLE));
        for name in [
            "INITIAL_LOAN_AMOUNT",
            "LOAN_TERM_LENGTH",
            "REPEAT_BORROWER",
            "INDUSTRY",
            "COMPANY_TYPE",
            "SEGMENT",
            "COHORT_MONTH",
        ] {
            assert!(page.contains(&format!("name=\"{}\"", name)), "{} missing", name);
        }
        assert!(page.contains(r#"value="500000""#));
        assert!(page.contains(r#"max="2000" value="180""#));
        assert!(!page.contains("id=\"risk\""));
    }

    #[test]
    fn test_category_with_ampersand_is_escaped() {
        let page = render_page(&PredictionRequest::default(), Outcome::None);
        assert!(page.contains(
            r#"<option value="commercial &amp; professional services">"#
        ));
    }

    #[test]
    fn test_selected_values_kept() {
        let request = PredictionRequest {
            segment: Segment::Segment3,
            repeat_borrower: false,
            ..Default::default()
        };
        let page = render_page(&request, Outcome::None);
        assert!(page.contains(r#"<option value="Segment 3" selected>"#));
        assert!(page.contains(r#"<option value="false" selected>False</option>"#));
    }

    #[test]
    fn test_result_regions() {
        let high = Prediction::new(1, 0.734);
        let page = render_page(&PredictionRequest::default(), Outcome::Scored(&high));
        assert!(page.contains("Default Probability: 73.40%"));
        assert!(page.contains("high-risk"));
        assert!(page.contains("HIGH RISK of Default"));

        let low = Prediction::new(0, 0.1);
        let page = render_page(&PredictionRequest::default(), Outcome::Scored(&low));
        assert!(page.contains("LOW RISK of Default"));
        assert!(!page.contains("HIGH RISK"));
    }

    #[test]
    fn test_error_region_escaped() {
        let page = render_page(&PredictionRequest::default(), Outcome::Failed("<boom>"));
        assert!(page.contains("&lt;boom&gt;"));
    }
}
