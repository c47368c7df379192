/// Full analysis panel rendered on success

use yew::prelude::*;
use crate::model::AnalysisResult;
use crate::presentation::{factor_bars, scale_price_history};
use super::components::{
    AlternativeCard, DealSummary, FactorBars, ImpulseMeter, PriceChartView, VerdictBadge,
};

#[derive(Properties, PartialEq)]
pub struct ResultsPanelProps {
    pub result: AnalysisResult,
}

#[function_component(ResultsPanel)]
pub fn results_panel(props: &ResultsPanelProps) -> Html {
    let result = &props.result;
    let bars = factor_bars(result);
    let chart = result
        .price_history
        .as_deref()
        .and_then(scale_price_history);

    html! {
        <div class="results-panel">
            <div class="product-header">
                if let Some(image) = &result.product_data.image_url {
                    <img class="product-image" src={image.clone()} alt={result.product_data.title.clone()} />
                }
                <div>
                    <h2 class="product-title">{&result.product_data.title}</h2>
                    <p class="product-meta">
                        {result.product_data.price.clone().unwrap_or_default()}
                        if let Some(rating) = &result.product_data.rating {
                            {format!(" • ★ {}", rating)}
                        }
                        if let Some(count) = &result.product_data.review_count {
                            {format!(" ({} reviews)", count)}
                        }
                    </p>
                </div>
            </div>

            <VerdictBadge verdict={result.verdict.clone()} />
            <ImpulseMeter score={result.impulse_score} confidence={Some(result.confidence_score)} />
            <FactorBars bars={bars} />

            if let Some(inflation) = &result.inflation_analysis {
                if inflation.inflation_detected {
                    <div class="inflation-warning">
                        <strong>{"⚠️ Price inflation detected: "}</strong>
                        {&inflation.analysis}
                    </div>
                }
            }

            if let Some(deal) = &result.deal_analysis {
                <DealSummary deal={deal.clone()} />
            }

            if let Some(chart) = chart {
                <PriceChartView chart={chart} />
            }

            <div class="pros-cons">
                <div class="pros">
                    <h3 class="section-title">{"Pros"}</h3>
                    <ul>{for result.pros.iter().map(|p| html! { <li>{p}</li> })}</ul>
                </div>
                <div class="cons">
                    <h3 class="section-title">{"Cons"}</h3>
                    <ul>{for result.cons.iter().map(|c| html! { <li>{c}</li> })}</ul>
                </div>
            </div>

            <p class="recommendation">{&result.recommendation}</p>

            if !result.alternatives.is_empty() {
                <div class="alternatives">
                    <h3 class="section-title">{"Consider instead"}</h3>
                    {for result.alternatives.iter().map(|alt| html! {
                        <AlternativeCard key={alt.asin.clone()} alternative={alt.clone()} />
                    })}
                </div>
            }

            if !result.affiliate_link.is_empty() {
                <a class="view-product" href={result.affiliate_link.clone()} target="_blank" rel="noopener noreferrer">
                    {"View on Amazon"}
                </a>
            }
        </div>
    }
}
