/// Reusable result widgets shared by the popup and the in-page overlay

use yew::prelude::*;
use crate::model::{Alternative, DealAnalysis};
use crate::presentation::{
    FactorBar, PriceChart, RiskBand, VerdictBucket, format_currency, format_score,
    impulse_meter_percent, savings_label, IMPULSE_SCORE_MAX,
};

#[derive(Properties, PartialEq)]
pub struct VerdictBadgeProps {
    pub verdict: String,
}

#[function_component(VerdictBadge)]
pub fn verdict_badge(props: &VerdictBadgeProps) -> Html {
    let bucket = VerdictBucket::classify(&props.verdict);

    html! {
        <div class={classes!("verdict", bucket.css_class())}>
            <span class="verdict-label">{bucket.label()}</span>
            <span class="verdict-text">{&props.verdict}</span>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct ImpulseMeterProps {
    pub score: i64,
    #[prop_or_default]
    pub confidence: Option<i64>,
}

#[function_component(ImpulseMeter)]
pub fn impulse_meter(props: &ImpulseMeterProps) -> Html {
    let band = RiskBand::from_score(props.score);
    let width = impulse_meter_percent(props.score);

    html! {
        <div class="impulse-meter">
            <div class="impulse-meter-header">
                <span class="impulse-meter-title">{"Impulse score"}</span>
                <span style={format!("color: {}; font-weight: bold;", band.color())}>
                    {format_score(props.score, IMPULSE_SCORE_MAX)}
                </span>
            </div>
            <div class="progress-container">
                <div style={format!("width: {}%; background-color: {}; height: 100%; transition: width 0.3s ease;", width, band.color())}></div>
            </div>
            <p class="impulse-meter-band">
                {band.label()}
                if let Some(confidence) = props.confidence {
                    {format!(" • {}% confidence", confidence.clamp(0, 100))}
                }
            </p>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct FactorBarsProps {
    pub bars: Vec<FactorBar>,
}

#[function_component(FactorBars)]
pub fn factor_bars(props: &FactorBarsProps) -> Html {
    if props.bars.is_empty() {
        return html! {};
    }

    html! {
        <div class="factor-bars">
            <h3 class="section-title">{"What is pushing you to buy"}</h3>
            {for props.bars.iter().map(|bar| html! {
                <div key={bar.key.clone()} class="factor-row">
                    <span class="factor-label">{&bar.label}</span>
                    <div class="factor-track">
                        <div style={format!("width: {:.1}%; background-color: #5B4FE8; height: 100%;", bar.percent)}></div>
                    </div>
                    <span class="factor-value">{bar.value}</span>
                </div>
            })}
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct PriceChartViewProps {
    pub chart: PriceChart,
}

#[function_component(PriceChartView)]
pub fn price_chart_view(props: &PriceChartViewProps) -> Html {
    let chart = &props.chart;

    html! {
        <div class="price-chart">
            <h3 class="section-title">{"Price history"}</h3>
            <svg viewBox="0 0 100 100" preserveAspectRatio="none" class="price-chart-svg">
                if let Some(points) = chart.polyline() {
                    <polyline points={points} fill="none" stroke="#5B4FE8" stroke-width="1.5" />
                }
                {for chart.points.iter().map(|p| html! {
                    <circle cx={format!("{:.2}", p.x)} cy={format!("{:.2}", p.y)} r="1.8" fill="#5B4FE8">
                        <title>{format!("{}: {}", p.date, format_currency(p.price))}</title>
                    </circle>
                })}
            </svg>
            <div class="price-chart-range">
                <span>{format!("Low {}", format_currency(chart.min))}</span>
                <span>{format!("High {}", format_currency(chart.max))}</span>
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct DealSummaryProps {
    pub deal: DealAnalysis,
}

#[function_component(DealSummary)]
pub fn deal_summary(props: &DealSummaryProps) -> Html {
    let deal = &props.deal;
    let band = RiskBand::from_score(deal.score);

    html! {
        <div class="deal-summary">
            <h3 class="section-title">
                {format!("Deal quality: {} ", deal.quality)}
                <span style={format!("color: {};", band.color())}>
                    {format!("({})", band.deal_label())}
                </span>
            </h3>
            <div class="deal-prices">
                <span>{format!("Now {}", format_currency(deal.current_price))}</span>
                <span>{format!("Avg {}", format_currency(deal.average_price))}</span>
                <span>{format!("Range {} – {}", format_currency(deal.min_price), format_currency(deal.max_price))}</span>
            </div>
            <p class="deal-analysis">{&deal.analysis}</p>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct AlternativeCardProps {
    pub alternative: Alternative,
}

#[function_component(AlternativeCard)]
pub fn alternative_card(props: &AlternativeCardProps) -> Html {
    let alt = &props.alternative;

    html! {
        <div class="alternative-card">
            if let Some(image) = &alt.image_url {
                <img class="alternative-image" src={image.clone()} alt={alt.title.clone()} />
            }
            <div class="alternative-body">
                <a class="alternative-title" href={alt.affiliate_url.clone()} target="_blank" rel="noopener noreferrer">
                    {&alt.title}
                </a>
                <div class="alternative-meta">
                    <span class="alternative-price">{format_currency(alt.price)}</span>
                    <span class="alternative-savings">{savings_label(alt.savings, alt.savings_percent)}</span>
                    if let Some(rating) = alt.rating {
                        <span class="alternative-rating">
                            {format!("★ {:.1}", rating)}
                            if let Some(count) = alt.review_count {
                                {format!(" ({})", count)}
                            }
                        </span>
                    }
                </div>
                <p class="alternative-why">{&alt.why_better}</p>
            </div>
        </div>
    }
}
