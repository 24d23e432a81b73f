use std::sync::Arc;

use leptos::prelude::*;

use vramsim::catalog::Catalog;
use vramsim::config::SimConfig;
use vramsim_views::showcase::{AsicShowcase, TpuShowcase};

use super::canvas;
use super::float_fmt::{fmt_f64_fixed, fmt_gb};
use super::frame_loop::Scheduled;
use super::widgets::Stat;

#[component]
pub fn TpuView(catalog: Arc<Catalog>, config: SimConfig) -> impl IntoView {
    let tpu = match TpuShowcase::new(catalog) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, "tpu view unavailable");
            return view! { <p class="error">{e.to_string()}</p> }.into_any();
        }
    };
    let options: Vec<(String, String)> = tpu
        .options()
        .map(|t| (t.key.clone(), t.name.clone()))
        .collect();

    let tpu = StoredValue::new(tpu);
    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
    let (rev, set_rev) = signal(0u64);

    let timers = StoredValue::new_local(Scheduled::default());
    timers.update_value(|t| {
        t.on_frame("tpu", move |_ts| {
            if let Some(el) = canvas_ref.get_untracked() {
                if let Some(Err(e)) = tpu.try_with_value(|c| canvas::draw_tpu(&el, c)) {
                    tracing::debug!(error = %e, "tpu frame skipped");
                }
            }
        });
    });
    on_cleanup(move || timers.update_value(Scheduled::stop_all));

    view! {
        <section class="view tpu">
            <canvas
                node_ref=canvas_ref
                width=config.simple_canvas.width.to_string()
                height=config.simple_canvas.height.to_string()
                class="scene"
            ></canvas>

            <div class="controls">
                <label>
                    <span>"Configuration"</span>
                    <select
                        prop:value=move || { rev.get(); tpu.with_value(|c| c.selected().key.clone()) }
                        on:change=move |ev| {
                            let key = event_target_value(&ev);
                            tpu.update_value(|c| {
                                if let Err(e) = c.select(&key) {
                                    tracing::warn!(error = %e, "tpu not switched");
                                }
                            });
                            set_rev.update(|r| *r = r.wrapping_add(1));
                        }
                    >
                        {options
                            .into_iter()
                            .map(|(k, n)| view! { <option value=k>{n}</option> })
                            .collect_view()}
                    </select>
                </label>
            </div>

            <div class="readouts">
                <Stat label="Compute" value=move || {
                    rev.get();
                    let mut v = tpu.with_value(|c| fmt_f64_fixed(c.headline().0, 0));
                    v.push_str(" TOPS");
                    v
                } />
                <Stat label="HBM" value=move || { rev.get(); tpu.with_value(|c| fmt_gb(c.headline().1)) } />
                <Stat label="Power" value=move || { rev.get(); tpu.with_value(|c| c.headline().2.to_string()) } />
            </div>
        </section>
    }
    .into_any()
}

#[component]
pub fn AsicView(catalog: Arc<Catalog>, config: SimConfig) -> impl IntoView {
    let asic = match AsicShowcase::new(catalog) {
        Ok(a) => a,
        Err(e) => {
            tracing::error!(error = %e, "asic view unavailable");
            return view! { <p class="error">{e.to_string()}</p> }.into_any();
        }
    };
    let options: Vec<(String, String)> = asic
        .options()
        .map(|a| (a.key.clone(), a.name.clone()))
        .collect();

    let asic = StoredValue::new(asic);
    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
    let (rev, set_rev) = signal(0u64);

    let timers = StoredValue::new_local(Scheduled::default());
    timers.update_value(|t| {
        t.on_frame("asic", move |_ts| {
            if let Some(el) = canvas_ref.get_untracked() {
                if let Some(Err(e)) = asic.try_with_value(|c| canvas::draw_asic(&el, c)) {
                    tracing::debug!(error = %e, "asic frame skipped");
                }
            }
        });
    });
    on_cleanup(move || timers.update_value(Scheduled::stop_all));

    view! {
        <section class="view asic">
            <canvas
                node_ref=canvas_ref
                width=config.simple_canvas.width.to_string()
                height=config.simple_canvas.height.to_string()
                class="scene"
            ></canvas>

            <div class="controls">
                <label>
                    <span>"Chip"</span>
                    <select
                        prop:value=move || { rev.get(); asic.with_value(|c| c.selected().key.clone()) }
                        on:change=move |ev| {
                            let key = event_target_value(&ev);
                            asic.update_value(|c| {
                                if let Err(e) = c.select(&key) {
                                    tracing::warn!(error = %e, "asic not switched");
                                }
                            });
                            set_rev.update(|r| *r = r.wrapping_add(1));
                        }
                    >
                        {options
                            .into_iter()
                            .map(|(k, n)| view! { <option value=k>{n}</option> })
                            .collect_view()}
                    </select>
                </label>
            </div>

            <div class="readouts">
                <Stat label="Hard-wired model" value=move || { rev.get(); asic.with_value(|c| c.selected().model.clone()) } />
                <Stat label="Throughput" value=move || {
                    rev.get();
                    let mut v = asic.with_value(|c| c.tokens_per_sec_label());
                    v.push_str(" tok/s");
                    v
                } />
                <Stat label="Power" value=move || { rev.get(); asic.with_value(|c| c.selected().power.clone()) } />
            </div>
        </section>
    }
    .into_any()
}
