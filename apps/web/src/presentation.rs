//! Small helpers the page templates lean on: the "new" badge, status
//! filtering/tallies over application lists, and form-field rendering with
//! injected attributes and current values.

use askama::Template;
use chrono::{DateTime, Duration, Utc};

use crate::models::application::{ApplicationStatus, ApplicationWithApplicant, ApplicationWithJob};
use crate::validation::FormErrors;
use crate::views::FilterTab;

pub const RECENT_DAYS: i64 = 7;

pub const INPUT_CLASS: &str = "mt-1 block w-full rounded-lg border-gray-300 shadow-sm \
     focus:border-violet-500 focus:ring-violet-500 sm:text-sm transition duration-200 py-3 pl-3";
pub const TEXTAREA_CLASS: &str = "mt-1 block w-full rounded-lg border-gray-300 shadow-sm \
     focus:border-violet-500 focus:ring-violet-500 sm:text-sm transition duration-200 pl-3";

/// True when `created_at` falls within the last `RECENT_DAYS` days.
pub fn is_recent(created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now - created_at < Duration::days(RECENT_DAYS)
}

pub fn display_date(at: DateTime<Utc>) -> String {
    at.format("%b %d, %Y").to_string()
}

// ────────────────────────────────────────────────────────────────────────────
// Status filtering
// ────────────────────────────────────────────────────────────────────────────

pub trait HasStatus {
    fn status(&self) -> ApplicationStatus;
}

impl HasStatus for ApplicationWithApplicant {
    fn status(&self) -> ApplicationStatus {
        self.application.status
    }
}

impl HasStatus for ApplicationWithJob {
    fn status(&self) -> ApplicationStatus {
        self.application.status
    }
}

pub fn filter_status<T: HasStatus>(
    items: &[T],
    status: ApplicationStatus,
) -> impl Iterator<Item = &T> {
    items.iter().filter(move |item| item.status() == status)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}

impl StatusCounts {
    pub fn tally<T: HasStatus>(items: &[T]) -> Self {
        let count = |status| filter_status(items, status).count() as i64;
        StatusCounts {
            total: items.len() as i64,
            pending: count(ApplicationStatus::Pending),
            approved: count(ApplicationStatus::Approved),
            rejected: count(ApplicationStatus::Rejected),
        }
    }
}

/// The `?status=` filter shared by the applicant dashboard and the review page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    Only(ApplicationStatus),
}

impl StatusFilter {
    /// `all`, absent and unrecognised values mean no filter.
    pub fn parse(raw: Option<&str>) -> Self {
        raw.and_then(ApplicationStatus::parse)
            .map_or(StatusFilter::All, StatusFilter::Only)
    }

    pub fn status(self) -> Option<ApplicationStatus> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Only(status) => Some(status),
        }
    }

    pub fn apply<T: HasStatus>(self, items: Vec<T>) -> Vec<T> {
        match self {
            StatusFilter::All => items,
            StatusFilter::Only(status) => items
                .into_iter()
                .filter(|item| item.status() == status)
                .collect(),
        }
    }

    pub fn tabs(self) -> Vec<FilterTab> {
        let mut tabs = vec![FilterTab {
            value: "all",
            label: "All",
            active: self == StatusFilter::All,
        }];
        tabs.extend(ApplicationStatus::ALL.into_iter().map(|status| FilterTab {
            value: status.as_str(),
            label: status.label(),
            active: self == StatusFilter::Only(status),
        }));
        tabs
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Form fields
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Widget {
    /// `<input type=...>`
    Input(&'static str),
    Textarea { rows: u8 },
    Select(Vec<(String, String)>),
    Radio(Vec<(String, String)>),
}

/// A renderable form field. Attributes are injected with `with_attr`, stored
/// values with `with_value`.
#[derive(Debug, Clone)]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub widget: Widget,
    /// Initial value: input value, textarea body, selected option or checked radio.
    pub value: String,
    pub attrs: Vec<(String, String)>,
    pub errors: Vec<String>,
}

impl FormField {
    fn new(name: &'static str, label: &'static str, widget: Widget) -> Self {
        FormField {
            name,
            label,
            widget,
            value: String::new(),
            attrs: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn input(name: &'static str, label: &'static str, input_type: &'static str) -> Self {
        Self::new(name, label, Widget::Input(input_type))
    }

    pub fn textarea(name: &'static str, label: &'static str, rows: u8) -> Self {
        Self::new(name, label, Widget::Textarea { rows })
    }

    pub fn select(name: &'static str, label: &'static str, options: Vec<(String, String)>) -> Self {
        Self::new(name, label, Widget::Select(options))
    }

    pub fn radio(name: &'static str, label: &'static str, options: Vec<(String, String)>) -> Self {
        Self::new(name, label, Widget::Radio(options))
    }

    /// Sets (or overwrites) a single HTML attribute on the widget.
    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some(existing) => existing.1 = value.to_string(),
            None => self.attrs.push((name.to_string(), value.to_string())),
        }
        self
    }

    /// Plain initial value, e.g. echoing a rejected submission back.
    pub fn initial(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }

    /// Prefills a stored value. Text-like inputs also advertise it as a
    /// `Current: ...` placeholder, textareas as `Current value:` + newline.
    pub fn with_value(mut self, value: &str) -> Self {
        let placeholder = match &self.widget {
            Widget::Input("text" | "email" | "url" | "number") => {
                Some(Some(format!("Current: {value}")))
            }
            Widget::Textarea { .. } => Some(Some(format!("Current value:\n{value}"))),
            Widget::Select(_) => Some(None),
            Widget::Input(_) | Widget::Radio(_) => None,
        };
        let Some(placeholder) = placeholder else {
            return self;
        };

        self.value = value.to_string();
        match placeholder {
            Some(text) => self.with_attr("placeholder", &text),
            None => self,
        }
    }

    pub fn with_errors(mut self, errors: &FormErrors) -> Self {
        self.errors = errors.field(self.name).to_vec();
        self
    }

    pub fn render(&self) -> Result<String, askama::Error> {
        let choices = |options: &[(String, String)]| {
            options
                .iter()
                .map(|(value, label)| Choice {
                    selected: *value == self.value,
                    value: value.clone(),
                    label: label.clone(),
                })
                .collect::<Vec<_>>()
        };

        let (kind, input_type, rows, options) = match &self.widget {
            Widget::Input(t) => ("input", *t, 0, Vec::new()),
            Widget::Textarea { rows } => ("textarea", "", *rows, Vec::new()),
            Widget::Select(opts) => ("select", "", 0, choices(opts)),
            Widget::Radio(opts) => ("radio", "", 0, choices(opts)),
        };

        let mut attrs = self.attrs.clone();
        if kind == "input" && !matches!(input_type, "password" | "file") && !self.value.is_empty()
        {
            attrs.retain(|(k, _)| k != "value");
            attrs.push(("value".to_string(), self.value.clone()));
        }

        FieldTemplate {
            name: self.name,
            label: self.label,
            kind,
            input_type,
            rows,
            value: &self.value,
            attrs,
            options,
            errors: &self.errors,
        }
        .render()
    }
}

pub struct Choice {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "partials/field.html")]
struct FieldTemplate<'a> {
    name: &'a str,
    label: &'a str,
    kind: &'a str,
    input_type: &'a str,
    rows: u8,
    value: &'a str,
    attrs: Vec<(String, String)>,
    options: Vec<Choice>,
    errors: &'a [String],
}

/// Renders a list of fields into HTML fragments for a page template.
pub fn render_fields(fields: &[FormField]) -> Result<Vec<String>, askama::Error> {
    fields.iter().map(FormField::render).collect()
}
