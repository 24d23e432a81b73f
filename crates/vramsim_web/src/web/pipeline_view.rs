use std::sync::Arc;

use leptos::prelude::*;

use vramsim::catalog::Catalog;
use vramsim::config::SimConfig;
use vramsim_views::pipeline::PipelineSim;
use vramsim_views::time::MountClock;

use super::canvas;
use super::float_fmt::{fmt_f64_fixed, fmt_grouped, fmt_seconds};
use super::frame_loop::Scheduled;
use super::widgets::{LogPanel, MemoryBar, MemoryReadout, Stat};
use crate::ui_model::{parse_precision, precision_options};

#[component]
pub fn PipelineView(catalog: Arc<Catalog>, config: SimConfig) -> impl IntoView {
    let sim = match PipelineSim::new(catalog, config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "pipeline view unavailable");
            return view! { <p class="error">{e.to_string()}</p> }.into_any();
        }
    };

    let gpu_options: Vec<(String, String)> = sim
        .catalog()
        .pipeline_gpus
        .iter()
        .map(|g| (g.key.clone(), g.name.clone()))
        .collect();
    let model_options: Vec<(String, String)> = sim
        .catalog()
        .pipeline_models
        .iter()
        .map(|m| (m.key.clone(), m.name.clone()))
        .collect();
    let cfg = sim.config().clone();
    let layout = sim.layout();

    let sim = StoredValue::new(sim);
    let clock = MountClock::start();
    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
    let (rev, set_rev) = signal(0u64);
    let bump = move || set_rev.update(|r| *r = r.wrapping_add(1));

    let timers = StoredValue::new_local(Scheduled::default());
    timers.update_value(|t| {
        t.on_frame("pipeline", move |_ts| {
            // Intervals have no timestamp of their own; keep every callback on
            // the same clock.
            let now = clock.now_ms();
            sim.update_value(|s| s.frame(now));
            if let Some(el) = canvas_ref.get_untracked() {
                if let Some(Err(e)) = sim.try_with_value(|s| canvas::draw_pipeline(&el, s)) {
                    tracing::debug!(error = %e, "pipeline frame skipped");
                }
            }
            if !sim.with_value(|s| s.phase().is_running()) {
                timers.update_value(Scheduled::disarm_run);
            }
            bump();
        });
    });
    on_cleanup(move || timers.update_value(Scheduled::stop_all));

    // The elapsed clock only ticks during a run.
    let clock_tick_ms = cfg.clock_tick_ms;
    let sync_clock = move || {
        let running = sim.with_value(|s| s.phase().is_running());
        timers.update_value(|t| {
            t.sync_run("pipeline", running, clock_tick_ms, move || {
                let now = clock.now_ms();
                sim.update_value(|s| s.tick_clock(now));
            });
        });
    };

    let locked = move || {
        rev.get();
        sim.with_value(|s| s.controls_locked())
    };

    let memory = Signal::derive(move || {
        rev.get();
        sim.with_value(|s| {
            let f = s.footprint();
            MemoryReadout {
                used_gb: f.total_gb(),
                capacity_gb: f.capacity_gb,
                fraction: f.bar_fraction(),
                overflow: f.overflow(),
            }
        })
    });
    let log = Signal::derive(move || {
        rev.get();
        sim.with_value(|s| s.log().entries().to_vec())
    });

    view! {
        <section class="view pipeline">
            <canvas
                node_ref=canvas_ref
                width=fmt_f64_fixed(layout.width, 0)
                height=fmt_f64_fixed(layout.height, 0)
                class="scene"
            ></canvas>

            <div class="controls">
                <label>
                    <span>"Model"</span>
                    <select
                        prop:value=move || { rev.get(); sim.with_value(|s| s.model().key.clone()) }
                        prop:disabled=locked
                        on:change=move |ev| {
                            let key = event_target_value(&ev);
                            let now = clock.now_ms();
                            sim.update_value(|s| {
                                if let Err(e) = s.select_model(&key, now) {
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
                        prop:disabled=locked
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
                        prop:disabled=locked
                        on:change=move |ev| {
                            if let Some(p) = parse_precision(&event_target_value(&ev)) {
                                sim.update_value(|s| {
                                    s.set_precision(p);
                                });
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

                <label>
                    <span>"Prompt tokens"</span>
                    <input
                        type="range"
                        min=fmt_f64_fixed(cfg.prompt_size.min, 0)
                        max=fmt_f64_fixed(cfg.prompt_size.max, 0)
                        step=fmt_f64_fixed(cfg.prompt_size.step, 0)
                        prop:value=move || { rev.get(); sim.with_value(|s| s.prompt_size().to_string()) }
                        prop:disabled=locked
                        on:input=move |ev| {
                            if let Ok(v) = event_target_value(&ev).parse::<u32>() {
                                sim.update_value(|s| {
                                    s.set_prompt_size(v);
                                });
                                bump();
                            }
                        }
                    />
                    <span class="value">{move || { rev.get(); sim.with_value(|s| s.prompt_size().to_string()) }}</span>
                </label>

                <label>
                    <span>"Speed"</span>
                    <input
                        type="range"
                        min=fmt_f64_fixed(cfg.speed.min, 1)
                        max=fmt_f64_fixed(cfg.speed.max, 1)
                        step=fmt_f64_fixed(cfg.speed.step, 1)
                        prop:value=move || { rev.get(); sim.with_value(|s| fmt_f64_fixed(s.speed(), 1)) }
                        on:input=move |ev| {
                            if let Ok(v) = event_target_value(&ev).parse::<f64>() {
                                sim.update_value(|s| s.set_speed(v));
                                bump();
                            }
                        }
                    />
                    <span class="value">{move || { rev.get(); let mut s = sim.with_value(|s| fmt_f64_fixed(s.speed(), 1)); s.push('x'); s }}</span>
                </label>

                <button
                    class="primary"
                    on:click=move |_| {
                        let now = clock.now_ms();
                        sim.update_value(|s| s.toggle(now));
                        sync_clock();
                        bump();
                    }
                >
                    {move || if locked() { "Halt Simulation" } else { "Run Inference" }}
                </button>
            </div>

            <div class="readouts">
                <Stat label="Phase" value=move || { rev.get(); sim.with_value(|s| s.phase().label().to_string()) } />
                <Stat label="Status" value=move || { rev.get(); sim.with_value(|s| s.status().to_string()) } />
                <Stat label="Tokens" value=move || { rev.get(); sim.with_value(|s| fmt_grouped(s.tokens() as f64)) } />
                <Stat label="Elapsed" value=move || { rev.get(); sim.with_value(|s| fmt_seconds(s.elapsed_ms())) } />
                <Stat label="Throughput" value=move || {
                    rev.get();
                    let mut v = sim.with_value(|s| fmt_f64_fixed(s.throughput(), 1));
                    v.push_str(" tok/s");
                    v
                } />
                <Stat label="Arithmetic intensity" value=move || {
                    rev.get();
                    sim.with_value(|s| {
                        let (level, caption) = s.arithmetic_intensity();
                        let mut v = level.to_string();
                        v.push_str(" · ");
                        v.push_str(caption);
                        v
                    })
                } />
                <Stat label="KV cache" value=move || { rev.get(); sim.with_value(|s| s.formula()) } />
            </div>

            <MemoryBar title="VRAM (weights + KV cache)" readout=memory />

            <div class="output-stream">
                {move || { rev.get(); sim.with_value(|s| s.words().join(" ")) }}
            </div>

            <LogPanel entries=log />
        </section>
    }
    .into_any()
}
