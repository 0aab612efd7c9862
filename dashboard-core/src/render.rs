//! Normalization of raw API payloads into a display model, plus the
//! presentation values derived from it.
//!
//! Nothing in this module fails. Missing or malformed fields degrade to
//! placeholders (`Unknown location`, `N/A`, `No signal`, `--:--`) so a
//! partial payload always renders.

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::model::{QueryKind, label_request_type};

pub const UNKNOWN_LOCATION: &str = "Unknown location";
pub const UNKNOWN_DATE: &str = "Unknown date";
pub const MISSING_TEMP: &str = "N/A";
pub const NO_SIGNAL: &str = "No signal";
pub const MISSING_TIME: &str = "--:--";

/// Hours fed into the trend chart.
pub const SPARKLINE_HOURS: usize = 12;
/// Hours shown as chips.
pub const CHIP_HOURS: usize = 6;

pub const SPARKLINE_WIDTH: f64 = 240.0;
pub const SPARKLINE_HEIGHT: f64 = 54.0;
pub const SPARKLINE_MARGIN: f64 = 4.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourEntry {
    pub time: Option<String>,
    pub temp_c: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayEntry {
    pub date: Option<String>,
    pub date_epoch: Option<String>,
    pub avg_temp_c: Option<f64>,
    pub max_temp_c: Option<f64>,
    pub min_temp_c: Option<f64>,
    pub hours: Vec<HourEntry>,
}

impl DayEntry {
    fn from_value(entry: &Value) -> Self {
        let day = entry.get("day");
        let hours = entry
            .get("hour")
            .and_then(Value::as_array)
            .map(|hours| {
                hours
                    .iter()
                    .map(|h| HourEntry {
                        time: text(h.get("time")),
                        temp_c: number(h.get("tempC")),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            date: text(entry.get("date")),
            date_epoch: text(entry.get("dateEpoch")),
            avg_temp_c: number(day.and_then(|d| d.get("avgTempC"))),
            max_temp_c: number(day.and_then(|d| d.get("maxTempC"))),
            min_temp_c: number(day.and_then(|d| d.get("minTempC"))),
            hours,
        }
    }

    /// Stable identifier for the day, `date-epoch` with `x` for a missing epoch.
    pub fn key(&self) -> String {
        format!(
            "{}-{}",
            self.date.as_deref().unwrap_or("unknown"),
            self.date_epoch.as_deref().unwrap_or("x")
        )
    }
}

/// Uniform view over current, forecast and history payloads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayModel {
    pub location_name: String,
    pub days: Vec<DayEntry>,
    pub primary_temp_c: Option<f64>,
}

impl DisplayModel {
    pub fn from_response(raw: &Value, kind: QueryKind) -> Self {
        let location_name = text(raw.get("locationName"))
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string());

        let days: Vec<DayEntry> = raw
            .get("forecastDays")
            .and_then(Value::as_array)
            .map(|days| days.iter().map(DayEntry::from_value).collect())
            .unwrap_or_default();

        let primary_temp_c = match kind {
            QueryKind::Current => number(raw.get("tempC")),
            QueryKind::Forecast | QueryKind::History => days.first().and_then(|d| d.avg_temp_c),
        };

        Self {
            location_name,
            days,
            primary_temp_c,
        }
    }

    pub fn theme(&self) -> Option<TempTheme> {
        TempTheme::classify(self.primary_temp_c)
    }
}

/// Only JSON numbers count; numeric strings do not.
fn number(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64)
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// One decimal, rounding the stored value once. Exact binary ties
/// (`7.25`, `0.25`) go away from zero.
fn fixed1(value: f64) -> String {
    let scaled = value * 10.0;
    let exact_tie = value.mul_add(10.0, -scaled) == 0.0 && scaled.fract().abs() == 0.5;

    if exact_tie {
        format!("{:.1}", scaled.round() / 10.0)
    } else {
        format!("{value:.1}")
    }
}

/// `7.25` becomes `7.3°C`; anything missing becomes `N/A`.
pub fn format_temp(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{}°C", fixed1(v)),
        None => MISSING_TEMP.to_string(),
    }
}

/// Textual band, upper bounds inclusive: 0, 12, 24.
pub fn describe_temp(value: Option<f64>) -> &'static str {
    match value {
        None => NO_SIGNAL,
        Some(v) if v <= 0.0 => "Freezing",
        Some(v) if v <= 12.0 => "Cool",
        Some(v) if v <= 24.0 => "Mild",
        Some(_) => "Hot",
    }
}

/// Visual theme. Cut points (4 and 25) are independent of [`describe_temp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TempTheme {
    Cold,
    Mild,
    Warm,
}

impl TempTheme {
    pub fn classify(value: Option<f64>) -> Option<Self> {
        let v = value?;
        Some(if v <= 4.0 {
            TempTheme::Cold
        } else if v >= 25.0 {
            TempTheme::Warm
        } else {
            TempTheme::Mild
        })
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            TempTheme::Cold => "theme-cold",
            TempTheme::Mild => "theme-mild",
            TempTheme::Warm => "theme-warm",
        }
    }
}

/// Normalized trend line over hourly temperatures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sparkline {
    points: Vec<(f64, f64)>,
}

impl Sparkline {
    /// Chart for the first twelve hours. `None` when fewer than two of them
    /// carry a numeric temperature.
    pub fn from_hours(hours: &[HourEntry]) -> Option<Self> {
        let temps: Vec<f64> = hours
            .iter()
            .take(SPARKLINE_HOURS)
            .filter_map(|h| h.temp_c)
            .collect();
        Self::from_temps(&temps)
    }

    pub fn from_temps(temps: &[f64]) -> Option<Self> {
        if temps.len() < 2 {
            return None;
        }

        let min = temps.iter().copied().fold(f64::INFINITY, f64::min);
        let max = temps.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = if max - min == 0.0 { 1.0 } else { max - min };
        let step_x = SPARKLINE_WIDTH / (temps.len() - 1) as f64;
        let usable = SPARKLINE_HEIGHT - 2.0 * SPARKLINE_MARGIN;

        let points = temps
            .iter()
            .enumerate()
            .map(|(idx, temp)| {
                let x = idx as f64 * step_x;
                let y = SPARKLINE_HEIGHT - ((temp - min) / range) * usable - SPARKLINE_MARGIN;
                (x, y)
            })
            .collect();

        Some(Self { points })
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// SVG path data, e.g. `M0.0,50.0 L240.0,4.0`.
    pub fn path_data(&self) -> String {
        self.points
            .iter()
            .enumerate()
            .map(|(idx, (x, y))| {
                let command = if idx == 0 { 'M' } else { 'L' };
                format!("{command}{},{}", fixed1(*x), fixed1(*y))
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn to_svg(&self) -> String {
        format!(
            concat!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" class="sparkline" "#,
                r#"viewBox="0 0 {w} {h}" role="img" aria-label="Hourly temperature trend">"#,
                r#"<path d="{d}" fill="none" stroke="currentColor" stroke-width="2"/></svg>"#,
                "\n"
            ),
            w = SPARKLINE_WIDTH,
            h = SPARKLINE_HEIGHT,
            d = self.path_data(),
        )
    }

    /// Terminal rendition using eighth-block characters.
    pub fn to_blocks(&self) -> String {
        const BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
        let usable = SPARKLINE_HEIGHT - 2.0 * SPARKLINE_MARGIN;

        self.points
            .iter()
            .map(|(_, y)| {
                let level = (SPARKLINE_HEIGHT - SPARKLINE_MARGIN - y) / usable;
                let idx = (level * (BLOCKS.len() - 1) as f64).round().clamp(0.0, 7.0) as usize;
                BLOCKS[idx]
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourChip {
    pub label: String,
    pub temp: String,
}

impl HourChip {
    fn from_hour(hour: &HourEntry) -> Self {
        // Times arrive as `yyyy-MM-dd HH:mm`; keep the clock part.
        let label = hour
            .time
            .as_deref()
            .map(|t| t.chars().skip(11).collect::<String>())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| MISSING_TIME.to_string());

        Self {
            label,
            temp: format_temp(hour.temp_c),
        }
    }
}

/// Chips for the first six hours, valid temperature or not.
pub fn hour_chips(hours: &[HourEntry]) -> Vec<HourChip> {
    hours
        .iter()
        .take(CHIP_HOURS)
        .map(HourChip::from_hour)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetaBar {
    pub label: &'static str,
    pub location: String,
    pub day_count: usize,
    pub updated_at: Option<DateTime<Utc>>,
}

impl MetaBar {
    pub fn days_label(&self) -> String {
        plural_days(self.day_count)
    }

    pub fn updated_label(&self) -> String {
        match self.updated_at {
            Some(ts) => format!("Updated {}", ts.with_timezone(&Local).format("%H:%M:%S")),
            None => "Updated now".to_string(),
        }
    }

    pub fn segments(&self) -> [String; 4] {
        [
            self.label.to_string(),
            self.location.clone(),
            self.days_label(),
            self.updated_label(),
        ]
    }
}

fn plural_days(count: usize) -> String {
    format!("{count} day{}", if count == 1 { "" } else { "s" })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentCard {
    pub meta: MetaBar,
    pub location: String,
    pub temperature: String,
    pub status: String,
    pub theme: Option<TempTheme>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayTile {
    pub key: String,
    pub title: String,
    pub average: String,
    pub high: String,
    pub low: String,
    pub sparkline: Option<Sparkline>,
    pub chips: Vec<HourChip>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesView {
    pub meta: MetaBar,
    pub location: String,
    pub status: String,
    pub theme: Option<TempTheme>,
    pub tiles: Vec<DayTile>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "lowercase")]
pub enum ResultView {
    Current(CurrentCard),
    Series(SeriesView),
}

impl ResultView {
    pub fn theme(&self) -> Option<TempTheme> {
        match self {
            ResultView::Current(card) => card.theme,
            ResultView::Series(series) => series.theme,
        }
    }
}

/// Render a raw response for the query kind that produced it.
pub fn render(raw: &Value, kind: QueryKind, updated_at: Option<DateTime<Utc>>) -> ResultView {
    let model = DisplayModel::from_response(raw, kind);
    let theme = model.theme();

    if kind == QueryKind::Current {
        let temp = number(raw.get("tempC"));
        return ResultView::Current(CurrentCard {
            meta: MetaBar {
                label: label_request_type(Some(kind)),
                location: model.location_name.clone(),
                day_count: 1,
                updated_at,
            },
            location: model.location_name,
            temperature: format_temp(temp),
            status: format!("Current observation · {}", describe_temp(temp)),
            theme,
        });
    }

    let heading = if kind == QueryKind::Forecast {
        "Forecast window"
    } else {
        "Historical data"
    };
    let tiles = model.days.iter().map(|day| day_tile(day, kind)).collect();

    ResultView::Series(SeriesView {
        meta: MetaBar {
            label: label_request_type(Some(kind)),
            location: model.location_name.clone(),
            day_count: model.days.len(),
            updated_at,
        },
        status: format!("{heading} ({})", plural_days(model.days.len())),
        location: model.location_name,
        theme,
        tiles,
    })
}

fn day_tile(day: &DayEntry, kind: QueryKind) -> DayTile {
    let (sparkline, chips) = if kind == QueryKind::Forecast && !day.hours.is_empty() {
        (Sparkline::from_hours(&day.hours), hour_chips(&day.hours))
    } else {
        (None, Vec::new())
    };

    DayTile {
        key: day.key(),
        title: day.date.as_deref().unwrap_or(UNKNOWN_DATE).to_string(),
        average: format_temp(day.avg_temp_c),
        high: format_temp(day.max_temp_c),
        low: format_temp(day.min_temp_c),
        sparkline,
        chips,
    }
}
