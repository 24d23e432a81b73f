use std::sync::Arc;

use leptos::prelude::*;

use vramsim::catalog::Catalog;
use vramsim::config::SimConfig;
use vramsim_views::inference::QuickInferenceSim;

use super::canvas;
use super::float_fmt::fmt_gb;
use super::frame_loop::Scheduled;
use super::widgets::{MemoryBar, MemoryReadout, Stat};
use crate::ui_model::{parse_precision, precision_options};

#[component]
pub fn InferenceView(catalog: Arc<Catalog>, config: SimConfig) -> impl IntoView {
    let sim = match QuickInferenceSim::new(catalog) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "inference view unavailable");
            return view! { <p class="error">{e.to_string()}</p> }.into_any();
        }
    };
    let gpu_options: Vec<(String, String)> = sim
        .catalog()
        .gpus
        .iter()
        .map(|g| (g.key.clone(), g.name.clone()))
        .collect();
    let model_options: Vec<(String, String)> = sim
        .catalog()
        .inference_models
        .iter()
        .map(|m| (m.key.clone(), m.name.clone()))
        .collect();

    let sim = StoredValue::new(sim);
    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
    let (rev, set_rev) = signal(0u64);
    let bump = move || set_rev.update(|r| *r = r.wrapping_add(1));

    let timers = StoredValue::new_local(Scheduled::default());
    timers.update_value(|t| {
        t.on_frame("inference", move |_ts| {
            if let Some(el) = canvas_ref.get_untracked() {
                if let Some(Err(e)) = sim.try_with_value(|s| canvas::draw_quick_inference(&el, s)) {
                    tracing::debug!(error = %e, "inference frame skipped");
                }
            }
        });
    });
    on_cleanup(move || timers.update_value(Scheduled::stop_all));

    let memory = Signal::derive(move || {
        rev.get();
        sim.with_value(|s| {
            let est = s.estimate();
            MemoryReadout {
                used_gb: est.used_gb,
                capacity_gb: est.capacity_gb,
                fraction: est.bar_fraction(),
                overflow: est.overflow,
            }
        })
    });

    view! {
        <section class="view inference">
            <canvas
                node_ref=canvas_ref
                width=config.simple_canvas.width.to_string()
                height=config.simple_canvas.height.to_string()
                class="scene"
            ></canvas>

            <div class="controls">
                <label>
                    <span>"Model"</span>
                    <select
                        prop:value=move || { rev.get(); sim.with_value(|s| s.model().key.clone()) }
                        on:change=move |ev| {
                            let key = event_target_value(&ev);
                            sim.update_value(|s| {
                                if let Err(e) = s.select_model(&key) {
                                    tracing::warn!(error = %e, "model not switched");
                                }
                            });
                            bump();
                        }
                    >
                        {model_options
                            .into_iter()
                            .map(|(k, n)| view! { <option value=k>{n}</option> })
                            .collect_view()}
                    </select>
                </label>

                <label>
                    <span>"GPU"</span>
                    <select
                        prop:value=move || { rev.get(); sim.with_value(|s| s.gpu().key.clone()) }
                        on:change=move |ev| {
                            let key = event_target_value(&ev);
                            sim.update_value(|s| {
                                if let Err(e) = s.select_gpu(&key) {
                                    tracing::warn!(error = %e, "gpu not switched");
                                }
                            });
                            bump();
                        }
                    >
                        {gpu_options
                            .into_iter()
                            .map(|(k, n)| view! { <option value=k>{n}</option> })
                            .collect_view()}
                    </select>
                </label>

                <label>
                    <span>"Precision"</span>
                    <select
                        prop:value=move || { rev.get(); sim.with_value(|s| s.precision().bits().to_string()) }
                        on:change=move |ev| {
                            if let Some(p) = parse_precision(&event_target_value(&ev)) {
                                sim.update_value(|s| s.set_precision(p));
                                bump();
                            }
                        }
                    >
                        {precision_options()
                            .into_iter()
                            .map(|(bits, label)| view! { <option value=bits.to_string()>{label}</option> })
                            .collect_view()}
                    </select>
                </label>

                <button
                    class="primary"
                    on:click=move |_| {
                        sim.update_value(|s| s.toggle());
                        bump();
                    }
                >
                    {move || { rev.get(); sim.with_value(|s| s.phase().button_label()) }}
                </button>
            </div>

            <div class="readouts">
                <Stat label="Model size" value=move || { rev.get(); sim.with_value(|s| fmt_gb(s.estimate().used_gb)) } />
                <Stat label="GPU memory" value=move || { rev.get(); sim.with_value(|s| fmt_gb(s.gpu().vram_gb)) } />
            </div>

            <MemoryBar title="VRAM" readout=memory />
        </section>
    }
    .into_any()
}
