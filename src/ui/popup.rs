/// Popup UI: analyze a URL directly against the service

use std::rc::Rc;
use yew::prelude::*;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use patternfly_yew::prelude::*;
use log::warn;
use crate::client::HttpClient;
use crate::config::ClientConfig;
use crate::domain::DomainClassifier;
use crate::model::AnalysisSummary;
use crate::pipeline::{AnalysisSession, RequestLifecycle};
use crate::presentation::{RiskBand, VerdictBucket, format_score, IMPULSE_SCORE_MAX};
use crate::relay::OverlayCommand;
use super::results::ResultsPanel;

// Import JS bridge functions
#[wasm_bindgen(module = "/popup_bridge.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn getActiveTabUrl() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn sendToActiveTab(message: JsValue) -> Result<(), JsValue>;
}

#[derive(Properties, PartialEq)]
pub struct PopupProps {
    #[prop_or_default]
    pub config: ClientConfig,
}

#[derive(Clone, PartialEq)]
enum RecentState {
    NotLoaded,
    Loading,
    Loaded(Vec<AnalysisSummary>),
    Unavailable(String),
}

#[derive(Clone, PartialEq)]
enum ActiveTab {
    Analyze,
    Recent,
}

#[function_component(App)]
pub fn app(props: &PopupProps) -> Html {
    let client = use_memo(props.config.clone(), |config| HttpClient::new(config.clone()));
    let session = use_memo(props.config.clone(), |config| {
        AnalysisSession::new(
            HttpClient::new(config.clone()),
            DomainClassifier::from_config(config),
        )
    });
    let lifecycle = use_state(|| RequestLifecycle::Idle);
    let url_input = use_state(String::new);
    let recent = use_state(|| RecentState::NotLoaded);
    let active_tab = use_state(|| ActiveTab::Analyze);
    let on_marketplace = use_state(|| false);
    let service_down = use_state(|| None::<String>);

    // Prefill from the active tab when it is a marketplace page
    {
        let url_input = url_input.clone();
        let on_marketplace = on_marketplace.clone();
        let classifier = DomainClassifier::from_config(&props.config);
        use_effect_with((), move |_| {
            spawn_local(async move {
                if let Ok(url_js) = getActiveTabUrl().await {
                    if let Some(url) = url_js.as_string() {
                        if classifier.is_eligible(&url) {
                            url_input.set(url);
                            on_marketplace.set(true);
                        }
                    }
                }
            });
            || ()
        });
    }

    // Warn up front when the analysis service is unreachable
    {
        let client = client.clone();
        let service_down = service_down.clone();
        use_effect_with((), move |_| {
            spawn_local(async move {
                if let Err(e) = client.health().await {
                    warn!("Analysis service unreachable: {}", e);
                    service_down.set(Some(e.message().to_string()));
                }
            });
            || ()
        });
    }

    let on_show_on_page = Callback::from(move |_: MouseEvent| {
        spawn_local(async move {
            let message = match serde_wasm_bindgen::to_value(&OverlayCommand::show()) {
                Ok(message) => message,
                Err(e) => {
                    warn!("Failed to serialize overlay command: {:?}", e);
                    return;
                }
            };
            match sendToActiveTab(message).await {
                Ok(()) => {
                    if let Some(window) = web_sys::window() {
                        let _ = window.close();
                    }
                }
                Err(e) => warn!("Could not reach the page: {:?}", e),
            }
        });
    });

    let on_url_input = {
        let url_input = url_input.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                url_input.set(input.value());
            }
        })
    };

    let start_analysis = {
        let session = session.clone();
        let lifecycle = lifecycle.clone();
        let url_input = url_input.clone();
        Callback::from(move |_: ()| {
            if session.is_busy() {
                return;
            }
            let session: Rc<AnalysisSession<HttpClient>> = session.clone();
            let lifecycle = lifecycle.clone();
            let url = (*url_input).clone();

            spawn_local(async move {
                session
                    .run(&url, |state| lifecycle.set(state.clone()))
                    .await;
            });
        })
    };

    let on_analyze = start_analysis.reform(|_: MouseEvent| ());
    let on_keydown = {
        let start_analysis = start_analysis.clone();
        Callback::from(move |e: KeyboardEvent| {
            if e.key() == "Enter" {
                start_analysis.emit(());
            }
        })
    };

    let on_tab_click = {
        let active_tab = active_tab.clone();
        let recent = recent.clone();
        let client = client.clone();
        let limit = props.config.recent_limit;
        move |tab: ActiveTab| {
            let active_tab = active_tab.clone();
            let recent = recent.clone();
            let client = client.clone();
            Callback::from(move |_| {
                if tab == ActiveTab::Recent && matches!(*recent, RecentState::NotLoaded) {
                    recent.set(RecentState::Loading);
                    let recent = recent.clone();
                    let client = client.clone();
                    spawn_local(async move {
                        match client.recent_analyses(limit).await {
                            Ok(items) => recent.set(RecentState::Loaded(items)),
                            Err(e) => {
                                warn!("Recent analyses failed: {}", e);
                                recent.set(RecentState::Unavailable(e.to_string()));
                            }
                        }
                    });
                }
                active_tab.set(tab.clone());
            })
        }
    };

    let is_busy = lifecycle.is_loading();
    let validation_message = lifecycle
        .error()
        .filter(|e| e.is_validation())
        .map(|e| e.message().to_string());

    html! {
        <div class="impulse-popup">
            <h1 class="popup-title">{"Impulse Saver"}</h1>

            if let Some(reason) = (*service_down).clone() {
                <Alert r#type={AlertType::Warning} title={"Analysis service unreachable"} inline={true}>
                    {reason}
                </Alert>
            }

            // Tab navigation
            <div class="pf-v5-c-tabs">
                <ul class="pf-v5-c-tabs__list">
                    <li class={if *active_tab == ActiveTab::Analyze { "pf-v5-c-tabs__item pf-m-current" } else { "pf-v5-c-tabs__item" }}>
                        <button
                            class="pf-v5-c-tabs__link"
                            onclick={on_tab_click(ActiveTab::Analyze)}
                        >
                            <span class="pf-v5-c-tabs__item-text">{"Analyze"}</span>
                        </button>
                    </li>
                    <li class={if *active_tab == ActiveTab::Recent { "pf-v5-c-tabs__item pf-m-current" } else { "pf-v5-c-tabs__item" }}>
                        <button
                            class="pf-v5-c-tabs__link"
                            onclick={on_tab_click(ActiveTab::Recent)}
                        >
                            <span class="pf-v5-c-tabs__item-text">{"Recent"}</span>
                        </button>
                    </li>
                </ul>
            </div>

            <div class="tab-pane-content">
                {match &*active_tab {
                    ActiveTab::Analyze => html! {
                        <div class="tab-stack">
                            <input
                                type="url"
                                placeholder="Paste an Amazon product URL..."
                                value={(*url_input).clone()}
                                oninput={on_url_input}
                                onkeydown={on_keydown}
                                disabled={is_busy}
                                class="url-input"
                            />
                            if let Some(message) = validation_message {
                                <p class="input-error">{message}</p>
                            }
                            <Button onclick={on_analyze} disabled={is_busy} variant={ButtonVariant::Primary} block={true}>
                                {if is_busy { "Analyzing..." } else { "🛡️ Analyze Impulse Risk" }}
                            </Button>
                            if *on_marketplace {
                                <Button onclick={on_show_on_page} variant={ButtonVariant::Secondary} block={true}>
                                    {"Show on page"}
                                </Button>
                            }

                            // Status display
                            {match &*lifecycle {
                                RequestLifecycle::Loading => html! {
                                    <div class="loading-text-center">
                                        <Spinner />
                                        <p class="loading-text">{"Analyzing product..."}</p>
                                    </div>
                                },
                                RequestLifecycle::Failed(err) if !err.is_validation() => html! {
                                    <div class="analysis-error">
                                        <Alert r#type={AlertType::Danger} title={"Analysis failed"} inline={true}>
                                            {err.message().to_string()}
                                        </Alert>
                                    </div>
                                },
                                RequestLifecycle::Succeeded(result) => html! {
                                    <ResultsPanel result={(**result).clone()} />
                                },
                                _ => html! {}
                            }}
                        </div>
                    },
                    ActiveTab::Recent => html! {
                        <div class="tab-stack">
                            {match &*recent {
                                RecentState::NotLoaded | RecentState::Loading => html! {
                                    <div class="loading-text-center">
                                        <Spinner />
                                    </div>
                                },
                                RecentState::Unavailable(err) => html! {
                                    <Alert r#type={AlertType::Warning} title={"Recent analyses unavailable"} inline={true}>
                                        {err.clone()}
                                    </Alert>
                                },
                                RecentState::Loaded(items) if items.is_empty() => html! {
                                    <div class="empty-state">
                                        <p>{"No analyses yet."}</p>
                                    </div>
                                },
                                RecentState::Loaded(items) => html! {
                                    <div class="recent-list">
                                        {for items.iter().map(|item| {
                                            let band = RiskBand::from_score(item.impulse_score);
                                            let bucket = VerdictBucket::classify(&item.verdict);
                                            html! {
                                                <div key={item.id.clone()} class="recent-item">
                                                    <a class="recent-title" href={item.url.clone()} target="_blank" rel="noopener noreferrer">
                                                        {&item.product_data.title}
                                                    </a>
                                                    <span class={classes!("recent-verdict", bucket.css_class())}>{bucket.label()}</span>
                                                    <span class="recent-score" style={format!("color: {};", band.color())}>
                                                        {format_score(item.impulse_score, IMPULSE_SCORE_MAX)}
                                                    </span>
                                                </div>
                                            }
                                        })}
                                    </div>
                                },
                            }}
                        </div>
                    },
                }}
            </div>

            <p class="popup-footer">
                {"Impulse Saver v0.1.0"}
            </p>
        </div>
    }
}
