use std::sync::Arc;

use leptos::prelude::*;

use vramsim::catalog::Catalog;
use vramsim::config::SimConfig;
use vramsim_views::time::MountClock;
use vramsim_views::training::TrainingSim;

use super::canvas;
use super::float_fmt::{fmt_f32_fixed, fmt_f64_fixed, fmt_grouped};
use super::frame_loop::Scheduled;
use super::widgets::{LogPanel, MemoryBar, MemoryReadout, Stat};
use crate::ui_model::{parse_precision, precision_options};

#[component]
pub fn TrainingView(catalog: Arc<Catalog>, config: SimConfig) -> impl IntoView {
    let sim = match TrainingSim::new(catalog, config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "training view unavailable");
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
        .training_models
        .iter()
        .map(|m| (m.key.clone(), m.name.clone()))
        .collect();
    let dataset_options: Vec<(String, String)> = sim
        .catalog()
        .datasets
        .iter()
        .map(|d| (d.key.clone(), d.name.clone()))
        .collect();
    let cfg = sim.config().clone();

    let sim = StoredValue::new(sim);
    let clock = MountClock::start();
    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
    let (rev, set_rev) = signal(0u64);
    let bump = move || set_rev.update(|r| *r = r.wrapping_add(1));

    let timers = StoredValue::new_local(Scheduled::default());
    timers.update_value(|t| {
        t.on_frame("training", move |_ts| {
            if let Some(el) = canvas_ref.get_untracked() {
                if let Some(Err(e)) = sim.try_with_value(|s| canvas::draw_training(&el, s)) {
                    tracing::debug!(error = %e, "training frame skipped");
                }
            }
        });
    });
    on_cleanup(move || timers.update_value(Scheduled::stop_all));

    // The step tick is armed by Start and cleared on Stop or completion.
    let tick_ms = cfg.tick_ms;
    let sync_tick = move || {
        let running = sim.with_value(|s| s.phase().is_running());
        timers.update_value(|t| {
            t.sync_run("training", running, tick_ms, move || {
                let now = clock.now_ms();
                sim.update_value(|s| s.tick(now));
                bump();
                if !sim.with_value(|s| s.phase().is_running()) {
                    timers.update_value(Scheduled::disarm_run);
                }
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
            let est = s.estimate();
            MemoryReadout {
                used_gb: est.used_gb,
                capacity_gb: est.capacity_gb,
                fraction: est.bar_fraction(),
                overflow: est.overflow,
            }
        })
    });
    let log = Signal::derive(move || {
        rev.get();
        sim.with_value(|s| s.log().entries().to_vec())
    });

    view! {
        <section class="view training">
            <canvas
                node_ref=canvas_ref
                width=cfg.simple_canvas.width.to_string()
                height=cfg.simple_canvas.height.to_string()
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
                    <span>"Dataset"</span>
                    <select
                        prop:value=move || { rev.get(); sim.with_value(|s| s.dataset().key.clone()) }
                        prop:disabled=locked
                        on:change=move |ev| {
                            let key = event_target_value(&ev);
                            sim.update_value(|s| {
                                if let Err(e) = s.select_dataset(&key) {
                                    tracing::warn!(error = %e, "dataset not switched");
                                }
                            });
                            bump();
                        }
                    >
                        {dataset_options
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
                    <span>"Batch size"</span>
                    <select
                        prop:value=move || { rev.get(); sim.with_value(|s| s.batch_size().to_string()) }
                        prop:disabled=locked
                        on:change=move |ev| {
                            if let Ok(b) = event_target_value(&ev).parse::<u32>() {
                                sim.update_value(|s| {
                                    if let Err(e) = s.set_batch_size(b) {
                                        tracing::warn!(error = %e, "batch size rejected");
                                    }
                                });
                                bump();
                            }
                        }
                    >
                        {cfg.batch_sizes
                            .iter()
                            .map(|b| view! { <option value=b.to_string()>{b.to_string()}</option> })
                            .collect_view()}
                    </select>
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
                </label>

                <button
                    class="primary"
                    on:click=move |_| {
                        let now = clock.now_ms();
                        sim.update_value(|s| s.toggle(now));
                        sync_tick();
                        bump();
                    }
                >
                    {move || if locked() { "Stop Training" } else { "Start Training" }}
                </button>
            </div>

            <div class="readouts">
                <Stat label="Phase" value=move || { rev.get(); sim.with_value(|s| s.phase().label().to_string()) } />
                <Stat label="Step" value=move || {
                    rev.get();
                    sim.with_value(|s| {
                        let mut v = s.step().to_string();
                        v.push_str(" / ");
                        v.push_str(&s.target_steps().to_string());
                        v
                    })
                } />
                <Stat label="Tokens seen" value=move || { rev.get(); sim.with_value(|s| fmt_grouped(s.tokens() as f64)) } />
                <Stat label="Loss" value=move || { rev.get(); sim.with_value(|s| fmt_f32_fixed(s.loss(), 3)) } />
                <Stat label="Grad norm" value=move || { rev.get(); sim.with_value(|s| fmt_f32_fixed(s.grad_norm(), 3)) } />
                <Stat label="Throughput" value=move || {
                    rev.get();
                    let mut v = sim.with_value(|s| fmt_grouped(s.throughput()));
                    v.push_str(" tok/s");
                    v
                } />
            </div>

            <MemoryBar
                title="VRAM (weights + gradients + optimizer)"
                readout=memory
                fill="linear-gradient(90deg, #8b5cf6, #ec4899)"
            />

            <LogPanel entries=log />
        </section>
    }
    .into_any()
}
