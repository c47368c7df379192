/// In-page overlay injected on product pages. Requests go through the
/// background context because the page's network context may be restricted.

use std::rc::Rc;
use yew::prelude::*;
use wasm_bindgen_futures::spawn_local;
use patternfly_yew::prelude::*;
use crate::config::ClientConfig;
use crate::content::RuntimeChannel;
use crate::domain::DomainClassifier;
use crate::pipeline::{AnalysisSession, RequestLifecycle};
use crate::relay::RelayClient;
use super::results::ResultsPanel;

type RelaySession = AnalysisSession<RelayClient<RuntimeChannel>>;

#[derive(Properties, PartialEq)]
pub struct OverlayProps {
    pub url: String,
    pub config: ClientConfig,
    #[prop_or(false)]
    pub start_open: bool,
}

#[function_component(Overlay)]
pub fn overlay(props: &OverlayProps) -> Html {
    let session = use_memo(props.config.clone(), |config| {
        AnalysisSession::new(
            RelayClient::new(RuntimeChannel),
            DomainClassifier::from_config(config),
        )
    });
    let lifecycle = use_state(|| RequestLifecycle::Idle);
    let open = use_state(|| props.start_open);

    let start_analysis = {
        let session = session.clone();
        let lifecycle = lifecycle.clone();
        let url = props.url.clone();
        Callback::from(move |_: ()| {
            if session.is_busy() {
                return;
            }
            let session: Rc<RelaySession> = session.clone();
            let lifecycle = lifecycle.clone();
            let url = url.clone();

            spawn_local(async move {
                session
                    .run(&url, |state| lifecycle.set(state.clone()))
                    .await;
            });
        })
    };

    // Opened from the popup: analyze right away
    {
        let start_analysis = start_analysis.clone();
        use_effect_with(props.start_open, move |start_open| {
            if *start_open {
                start_analysis.emit(());
            }
            || ()
        });
    }

    let on_toggle = {
        let open = open.clone();
        let lifecycle = lifecycle.clone();
        let start_analysis = start_analysis.clone();
        Callback::from(move |_: MouseEvent| {
            let opening = !*open;
            open.set(opening);
            if opening && matches!(*lifecycle, RequestLifecycle::Idle) {
                start_analysis.emit(());
            }
        })
    };

    let on_retry = start_analysis.reform(|_: MouseEvent| ());
    let is_busy = lifecycle.is_loading();

    html! {
        <div class="impulse-saver-overlay" style="position: fixed; bottom: 20px; right: 20px; z-index: 2147483647; max-width: 380px; font-family: sans-serif;">
            if *open {
                <div class="impulse-saver-panel" style="background: white; border-radius: 8px; box-shadow: 0 4px 24px rgba(0,0,0,0.25); padding: 16px; max-height: 70vh; overflow-y: auto; margin-bottom: 8px;">
                    {match &*lifecycle {
                        RequestLifecycle::Idle | RequestLifecycle::Loading => html! {
                            <div class="loading-text-center">
                                <Spinner />
                                <p class="loading-text">{"Analyzing this product..."}</p>
                            </div>
                        },
                        RequestLifecycle::Failed(err) => html! {
                            <div>
                                <Alert r#type={AlertType::Danger} title={"Analysis failed"} inline={true}>
                                    {err.message().to_string()}
                                </Alert>
                                <Button onclick={on_retry} disabled={is_busy} variant={ButtonVariant::Secondary} block={true}>
                                    {"Try again"}
                                </Button>
                            </div>
                        },
                        RequestLifecycle::Succeeded(result) => html! {
                            <ResultsPanel result={(**result).clone()} />
                        },
                    }}
                </div>
            }
            <Button onclick={on_toggle} disabled={is_busy && !*open} variant={ButtonVariant::Primary}>
                {if *open { "✕ Close" } else { "🛡️ Check impulse risk" }}
            </Button>
        </div>
    }
}
