use std::sync::Arc;

use leptos::prelude::*;

use vramsim::catalog::Catalog;
use vramsim::config::SimConfig;

use crate::ui_model::ViewTab;

mod canvas;
mod float_fmt;
mod frame_loop;
mod inference_view;
mod logging;
mod pipeline_view;
mod showcase_view;
mod training_view;
mod widgets;

use inference_view::InferenceView;
use pipeline_view::PipelineView;
use showcase_view::{AsicView, TpuView};
use training_view::TrainingView;

pub fn start() {
    logging::init();
    mount_to_body(|| view! { <App /> });
}

#[component]
fn App() -> impl IntoView {
    let catalog = Arc::new(Catalog::builtin());
    let config = SimConfig::default();
    if let Err(e) = catalog.validate().and_then(|_| config.validate()) {
        tracing::error!(error = %e, "built-in tables rejected");
    }
    tracing::info!(
        gpus = catalog.gpus.len(),
        models = catalog.inference_models.len(),
        "catalog loaded"
    );

    let (tab, set_tab) = signal(ViewTab::default());

    let active_view = move || {
        let catalog = Arc::clone(&catalog);
        let config = config.clone();
        match tab.get() {
            ViewTab::Inference => view! { <InferenceView catalog=catalog config=config /> }.into_any(),
            ViewTab::Pipeline => view! { <PipelineView catalog=catalog config=config /> }.into_any(),
            ViewTab::Training => view! { <TrainingView catalog=catalog config=config /> }.into_any(),
            ViewTab::Tpu => view! { <TpuView catalog=catalog config=config /> }.into_any(),
            ViewTab::Asic => view! { <AsicView catalog=catalog config=config /> }.into_any(),
        }
    };

    view! {
        <main class="app">
            <header>
                <h1>"VRAM Simulator"</h1>
                <p class="subtitle">
                    "How LLM inference and training fill accelerator memory. Figures are estimates, not measurements."
                </p>
            </header>

            <nav class="tabs">
                {ViewTab::all()
                    .iter()
                    .copied()
                    .map(|t| {
                        view! {
                            <button
                                class="tab"
                                class:active=move || tab.get() == t
                                title=t.description()
                                on:click=move |_| {
                                    if tab.get_untracked() != t {
                                        tracing::debug!(tab = t.label(), "tab switched");
                                        set_tab.set(t);
                                    }
                                }
                            >
                                <span class="tab-icon">{t.icon()}</span>
                                " "
                                {t.label()}
                            </button>
                        }
                    })
                    .collect_view()}
            </nav>

            {active_view}
        </main>
    }
}
