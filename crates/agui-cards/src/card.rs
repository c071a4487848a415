use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::a2a::Consultation;
use crate::calculator::Calculation;
use crate::catalog::CatalogSearch;
use crate::clock::ClockReading;
use crate::frontend::{set_background_color, BackgroundColorOutcome, WeatherApproval};
use crate::payload;
use crate::quote::{Quote, Story};
use crate::status::{CardView, ToolStatus};
use crate::weather::WeatherData;

/// A tool call resolved to the card that renders it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "card", rename_all = "snake_case")]
pub enum Card {
    Weather {
        location: String,
        view: CardView<WeatherData>,
    },
    Clock {
        view: CardView<ClockReading>,
    },
    Calculator {
        expression: String,
        view: CardView<Calculation>,
    },
    CatalogSearch {
        view: CardView<CatalogSearch>,
    },
    Consultation {
        view: CardView<Consultation>,
    },
    Quote {
        view: CardView<Quote>,
    },
    Story {
        view: CardView<Story>,
    },
    BackgroundColor {
        outcome: BackgroundColorOutcome,
    },
    WeatherApproval {
        status: ToolStatus,
        prompt: WeatherApproval,
    },
    /// Tools without a dedicated card: name, arguments and raw result.
    Generic {
        name: String,
        status: ToolStatus,
        args: Value,
        result: Option<String>,
    },
}

impl Card {
    /// Picks and fills the card for one tool call. Never fails: unknown tools get the
    /// generic card and unparseable results the raw view.
    pub fn from_tool_call(
        name: &str,
        status: ToolStatus,
        args: &Value,
        result: Option<&Value>,
    ) -> Self {
        let placeholder =
            |key: &str| payload::arg(args, key).unwrap_or_else(|| "...".to_string());
        match name {
            "get_weather" => Self::Weather {
                location: placeholder("location"),
                view: CardView::resolve(status, result, WeatherData::parse),
            },
            "get_current_time" => Self::Clock {
                view: CardView::resolve(status, result, ClockReading::parse),
            },
            "calculate" => Self::Calculator {
                expression: placeholder("expression"),
                view: CardView::resolve(status, result, Calculation::parse),
            },
            "search_catalog" => Self::CatalogSearch {
                view: CardView::resolve(status, result, CatalogSearch::parse),
            },
            "a2a_consult" => Self::Consultation {
                view: CardView::resolve(status, result, Consultation::parse),
            },
            "get_quote" => Self::Quote {
                view: CardView::resolve(status, result, Quote::parse),
            },
            "tell_bedtime_story" => Self::Story {
                view: CardView::resolve(status, result, |value| {
                    Some(Story {
                        theme: payload::arg(args, "theme"),
                        text: payload::text_of(value),
                    })
                }),
            },
            "set_background_color" => Self::BackgroundColor {
                outcome: set_background_color(args),
            },
            "approve_weather_request" => Self::WeatherApproval {
                status,
                prompt: WeatherApproval::from_args(args),
            },
            other => Self::Generic {
                name: other.to_string(),
                status,
                args: args.clone(),
                result: result.map(payload::text_of),
            },
        }
    }

    /// Card title as shown in the header.
    pub fn title(&self) -> &str {
        match self {
            Self::Weather { .. } => "Weather",
            Self::Clock { .. } => "Current Time",
            Self::Calculator { .. } => "Calculator Tool",
            Self::CatalogSearch { .. } => "Catalog Search",
            Self::Consultation { .. } => "A2A Collaboration",
            Self::Quote { .. } => "Quote",
            Self::Story { .. } => "BedTimeStory Agent",
            Self::BackgroundColor { .. } => "Background Color",
            Self::WeatherApproval { .. } => "Approve weather lookup",
            Self::Generic { name, .. } => name.as_str(),
        }
    }
}

fn summarize<T>(
    f: &mut fmt::Formatter<'_>,
    view: &CardView<T>,
    ready: impl FnOnce(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
) -> fmt::Result {
    match view {
        CardView::Pending => f.write_str("pending"),
        CardView::Ready(value) => ready(f, value),
        CardView::Raw(text) => write!(f, "{}", crate::truncate(text)),
        CardView::Error(message) => write!(f, "error: {}", crate::truncate(message)),
    }
}

/// One-line summary, used for logging proxied tool results.
impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.title())?;
        match self {
            Self::Weather { location, view } => summarize(f, view, |f, w| {
                let theme = w.theme();
                write!(f, "{} {location}: {}°C, {}", theme.icon, w.temperature, w.condition)
            }),
            Self::Clock { view } => {
                summarize(f, view, |f, c| write!(f, "{} {}", c.long_date(), c.time))
            }
            Self::Calculator { expression, view } => summarize(f, view, |f, c| match c {
                Calculation::Answer { expression, value } => write!(f, "{expression} = {value}"),
                Calculation::Failed { message } => write!(f, "{expression}: {message}"),
            }),
            Self::CatalogSearch { view } => summarize(f, view, |f, s| {
                if let Some(error) = &s.error {
                    return write!(f, "error: {error}");
                }
                if s.is_empty() {
                    return write!(f, "{}: no results", s.query_label());
                }
                let top = &s.results[0];
                write!(f, "{} ({} results), top: {}", s.query_label(), s.results.len(), top.title())?;
                match top.price_label() {
                    Some(price) => write!(f, " {price}"),
                    None => Ok(()),
                }
            }),
            Self::Consultation { view } => summarize(f, view, |f, c| {
                let answer = c.final_answer.as_deref().unwrap_or("(no answer)");
                write!(f, "{}", crate::truncate(answer))
            }),
            Self::Quote { view } => {
                summarize(f, view, |f, q| write!(f, "\"{}\" ({})", q.text, q.author))
            }
            Self::Story { view } => {
                summarize(f, view, |f, s| write!(f, "{}", crate::truncate(&s.text)))
            }
            Self::BackgroundColor { outcome } => match outcome {
                BackgroundColorOutcome::Applied { color, .. } => write!(f, "{color}"),
                BackgroundColorOutcome::Rejected { error, .. } => write!(f, "error: {error}"),
            },
            Self::WeatherApproval { status, prompt } => {
                write!(f, "{} {}", status.badge(), prompt.prompt())
            }
            Self::Generic { status, result, .. } => match result {
                Some(text) => write!(f, "{} {}", status.badge(), crate::truncate(text)),
                None => write!(f, "{}", status.badge()),
            },
        }
    }
}
