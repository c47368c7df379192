/// Display values derived from an analysis payload.
///
/// Everything here is pure: the UI components call these and never look at
/// raw scores directly, so out-of-range payload numbers are clamped in one place.
use crate::model::{AnalysisResult, PricePoint};

pub const IMPULSE_SCORE_MAX: i64 = 100;
pub const FACTOR_MAX: i64 = 30;

/// Bars narrower than this are invisible at popup width
pub const MIN_VISIBLE_BAR_PERCENT: f64 = 4.0;

/// Vertical position used when every price in the history is the same
pub const FLAT_CHART_Y: f64 = 50.0;

/// Display order and labels for the six impulse factors
pub const FACTOR_LABELS: &[(&str, &str)] = &[
    ("price_manipulation", "Price manipulation"),
    ("scarcity_tactics", "Scarcity tactics"),
    ("emotional_triggers", "Emotional triggers"),
    ("urgency_language", "Urgency language"),
    ("deal_authenticity", "Deal authenticity"),
    ("volatility_factor", "Price volatility"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictBucket {
    Buy,
    Wait,
    Skip,
    Unknown,
}

impl VerdictBucket {
    /// First keyword found wins, checked in the order buy, wait, skip
    pub fn classify(verdict: &str) -> VerdictBucket {
        let verdict = verdict.to_lowercase();
        if verdict.contains("buy") {
            VerdictBucket::Buy
        } else if verdict.contains("wait") {
            VerdictBucket::Wait
        } else if verdict.contains("skip") {
            VerdictBucket::Skip
        } else {
            VerdictBucket::Unknown
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VerdictBucket::Buy => "BUY",
            VerdictBucket::Wait => "WAIT",
            VerdictBucket::Skip => "SKIP",
            VerdictBucket::Unknown => "REVIEW",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            VerdictBucket::Buy => "verdict-buy",
            VerdictBucket::Wait => "verdict-wait",
            VerdictBucket::Skip => "verdict-skip",
            VerdictBucket::Unknown => "verdict-unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskBand {
    Low,
    Moderate,
    High,
    Severe,
}

impl RiskBand {
    pub fn from_score(score: i64) -> RiskBand {
        match clamp_score(score) {
            80.. => RiskBand::Severe,
            60..=79 => RiskBand::High,
            40..=59 => RiskBand::Moderate,
            _ => RiskBand::Low,
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            RiskBand::Severe => "#dc2626",
            RiskBand::High => "#ea580c",
            RiskBand::Moderate => "#ca8a04",
            RiskBand::Low => "#16a34a",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskBand::Severe => "Severe impulse risk",
            RiskBand::High => "High impulse risk",
            RiskBand::Moderate => "Moderate impulse risk",
            RiskBand::Low => "Low impulse risk",
        }
    }

    /// Deal scores reuse the thresholds but read the other way: high is good
    pub fn deal_label(self) -> &'static str {
        match self {
            RiskBand::Severe => "Excellent deal",
            RiskBand::High => "Good deal",
            RiskBand::Moderate => "Fair deal",
            RiskBand::Low => "Poor deal",
        }
    }
}

pub fn clamp_score(score: i64) -> i64 {
    score.clamp(0, IMPULSE_SCORE_MAX)
}

/// Width of the impulse meter fill, percent
pub fn impulse_meter_percent(score: i64) -> f64 {
    clamp_score(score) as f64
}

/// Width of one factor bar, percent of the 30-point ceiling
pub fn factor_bar_percent(value: i64) -> f64 {
    let fraction = value.clamp(0, FACTOR_MAX) as f64 / FACTOR_MAX as f64;
    (fraction * 100.0).max(MIN_VISIBLE_BAR_PERCENT)
}

#[derive(Debug, Clone, PartialEq)]
pub struct FactorBar {
    pub key: String,
    pub label: String,
    pub value: i64,
    pub percent: f64,
}

/// Known factors first in their fixed order, then any extra keys the service sends
pub fn factor_bars(result: &AnalysisResult) -> Vec<FactorBar> {
    let known = FACTOR_LABELS.iter().filter_map(|(key, label)| {
        result.impulse_factors.get(*key).map(|value| FactorBar {
            key: key.to_string(),
            label: label.to_string(),
            value: *value,
            percent: factor_bar_percent(*value),
        })
    });

    let extra = result
        .impulse_factors
        .iter()
        .filter(|(key, _)| !FACTOR_LABELS.iter().any(|(k, _)| *k == key.as_str()))
        .map(|(key, value)| FactorBar {
            key: key.clone(),
            label: key.replace('_', " "),
            value: *value,
            percent: factor_bar_percent(*value),
        });

    known.chain(extra).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    pub date: String,
    pub price: f64,
    /// Percent from the left edge
    pub x: f64,
    /// Percent from the top edge
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceChart {
    pub points: Vec<ChartPoint>,
    pub min: f64,
    pub max: f64,
}

impl PriceChart {
    /// A lone point is drawn as a dot, never as a line
    pub fn is_single_point(&self) -> bool {
        self.points.len() == 1
    }

    /// `points` attribute for an SVG polyline in a 100x100 viewBox
    pub fn polyline(&self) -> Option<String> {
        if self.points.len() < 2 {
            return None;
        }
        Some(
            self.points
                .iter()
                .map(|p| format!("{:.2},{:.2}", p.x, p.y))
                .collect::<Vec<_>>()
                .join(" "),
        )
    }
}

/// Scale a price history into chart coordinates, in array order
pub fn scale_price_history(history: &[PricePoint]) -> Option<PriceChart> {
    if history.is_empty() {
        return None;
    }

    let min = history.iter().map(|p| p.price).fold(f64::INFINITY, f64::min);
    let max = history.iter().map(|p| p.price).fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    let last_index = history.len().saturating_sub(1);

    let points = history
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let x = if last_index == 0 {
                50.0
            } else {
                i as f64 / last_index as f64 * 100.0
            };
            let y = if range > 0.0 {
                100.0 - ((point.price - min) / range) * 100.0
            } else {
                FLAT_CHART_Y
            };
            ChartPoint {
                date: point.date.clone(),
                price: point.price,
                x,
                y,
            }
        })
        .collect();

    Some(PriceChart { points, min, max })
}

/// Never phrased as negative savings
pub fn savings_label(savings: f64, savings_percent: f64) -> String {
    if savings > 0.0 && savings_percent >= 0.0 {
        format!("{}% cheaper", format_percent(savings_percent))
    } else {
        "similar price".to_string()
    }
}

fn format_percent(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{:.0}", rounded)
    } else {
        format!("{:.1}", rounded)
    }
}

/// US-dollar formatting with thousands separators, e.g. `$1,234.50`
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let dollars = (cents / 100).to_string();
    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (i, ch) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, cents % 100)
}

/// Score over its ceiling, e.g. `72/100`
pub fn format_score(score: i64, max: i64) -> String {
    format!("{}/{}", score.clamp(0, max), max)
}
