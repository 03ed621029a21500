//! Server-side HTML for the prediction page

use std::fmt::Write;

use timelytics_core::logic::features::{FieldKind, FEATURE_COUNT, FEATURE_FIELDS};
use timelytics_core::logic::sample;
use timelytics_core::{PredictionRequest, PredictionResult};

pub const PAGE_TITLE: &str = "Timelytics: OTD Prediction";

const HEADING: &str = "Timelytics: Optimize your supply chain with advanced forecasting techniques.";

const CAPTIONS: [&str; 2] = [
    "Timelytics is an ensemble model that utilizes three powerful machine learning algorithms - \
     XGBoost, Random Forests, and Support Vector Machines (SVM) - to accurately forecast Order to \
     Delivery (OTD) times.",
    "With Timelytics, businesses can identify potential bottlenecks and delays in their supply chain \
     and take proactive measures to address them, reducing lead times and improving delivery times.",
];

/// Input text per field, in layout order, exactly as it will be echoed back
pub type FormValues = [String; FEATURE_COUNT];

/// Display text for each field of a request; absent fields are blank
pub fn request_values(request: &PredictionRequest) -> FormValues {
    std::array::from_fn(|i| request.value_at(i).map(|v| v.to_string()).unwrap_or_default())
}

/// Message box above the output section
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Error(Vec<String>),
    Warning(String),
}

/// Everything one render of the page needs
#[derive(Debug, Clone)]
pub struct Page {
    /// Text shown in the inputs
    pub values: FormValues,
    pub result: Option<PredictionResult>,
    pub notice: Option<Notice>,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            values: request_values(&sample::form_defaults()),
            result: None,
            notice: None,
        }
    }
}

impl Page {
    pub fn with_values(values: FormValues) -> Self {
        Self { values, ..Self::default() }
    }

    pub fn render(&self) -> String {
        let mut html = String::with_capacity(8 * 1024);

        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
        let _ = writeln!(html, "<title>{}</title>", escape(PAGE_TITLE));
        html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
        html.push_str(STYLE);
        html.push_str("</head>\n<body>\n<main>\n");

        let _ = writeln!(html, "<h1>{}</h1>", escape(HEADING));
        for caption in CAPTIONS {
            let _ = writeln!(html, "<p class=\"caption\">{}</p>", escape(caption));
        }

        self.render_form(&mut html);
        self.render_output(&mut html);
        render_sample_table(&mut html);

        html.push_str("</main>\n</body>\n</html>\n");
        html
    }

    fn render_form(&self, html: &mut String) {
        html.push_str("<section>\n<h2>Input Parameters</h2>\n");
        html.push_str("<form method=\"post\" action=\"/predict\">\n");

        for (i, spec) in FEATURE_FIELDS.iter().enumerate() {
            let step = match spec.kind {
                FieldKind::Integer => "1",
                FieldKind::Number => "any",
            };
            let max = spec
                .max
                .map(|m| format!(" max=\"{}\"", m))
                .unwrap_or_default();

            let _ = writeln!(
                html,
                "<label for=\"{name}\">{label}</label>\n\
                 <input type=\"number\" id=\"{name}\" name=\"{name}\" value=\"{value}\" \
                 step=\"{step}\" min=\"{min}\"{max}>",
                name = spec.name,
                label = escape(spec.label),
                value = escape(&self.values[i]),
                step = step,
                min = spec.min,
                max = max,
            );
        }

        html.push_str("<button type=\"submit\">Predict OTD Time</button>\n</form>\n</section>\n");
    }

    fn render_output(&self, html: &mut String) {
        html.push_str("<section>\n<h2>Output: Predicted Wait Time (in Days)</h2>\n");

        match &self.notice {
            Some(Notice::Error(messages)) => {
                html.push_str("<div class=\"notice error\">\n<ul>\n");
                for message in messages {
                    let _ = writeln!(html, "<li>{}</li>", escape(message));
                }
                html.push_str("</ul>\n</div>\n");
            }
            Some(Notice::Warning(message)) => {
                let _ = writeln!(html, "<div class=\"notice warning\">{}</div>", escape(message));
            }
            None => {}
        }

        if let Some(result) = &self.result {
            let _ = writeln!(
                html,
                "<p class=\"result\">Estimated Delivery Time: <strong>{} days</strong></p>",
                result.days
            );
        }

        html.push_str("</section>\n");
    }
}

fn render_sample_table(html: &mut String) {
    html.push_str("<section>\n<h2>Sample Dataset (For Reference)</h2>\n<table>\n<thead><tr>");
    for header in sample::headers() {
        let _ = write!(html, "<th>{}</th>", escape(header));
    }
    html.push_str("</tr></thead>\n<tbody>\n");

    for row in sample::reference_rows() {
        html.push_str("<tr>");
        for i in 0..FEATURE_FIELDS.len() {
            let cell = row.value_at(i).map(|v| v.to_string()).unwrap_or_default();
            let _ = write!(html, "<td>{}</td>", escape(&cell));
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</tbody>\n</table>\n</section>\n");
}

/// Escape text for HTML element and attribute content
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

const STYLE: &str = "<style>\n\
body { font-family: system-ui, sans-serif; margin: 0; background: #fafafa; color: #222; }\n\
main { max-width: 860px; margin: 0 auto; padding: 1.5rem; }\n\
.caption { color: #666; font-size: 0.9rem; }\n\
form { display: grid; grid-template-columns: max-content 1fr; gap: 0.4rem 1rem; align-items: center; }\n\
form button { grid-column: 2; justify-self: start; padding: 0.4rem 1rem; }\n\
.notice { padding: 0.6rem 1rem; border-radius: 4px; margin-bottom: 0.8rem; }\n\
.error { background: #fdecea; color: #8a1c1c; }\n\
.warning { background: #fff4e5; color: #7a4b00; }\n\
.result { background: #edf7ed; color: #1e4620; padding: 0.6rem 1rem; border-radius: 4px; }\n\
table { border-collapse: collapse; font-size: 0.85rem; }\n\
th, td { border: 1px solid #ddd; padding: 0.3rem 0.5rem; text-align: right; }\n\
</style>\n";
