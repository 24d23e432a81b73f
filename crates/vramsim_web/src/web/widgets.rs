use leptos::prelude::*;

use vramsim::event_log::LogEntry;

use super::float_fmt::{fmt_gb, fmt_percent, fmt_seconds};

#[component]
pub fn Stat(label: &'static str, value: impl Fn() -> String + Send + 'static) -> impl IntoView {
    view! {
        <div class="stat">
            <div class="stat-label">{label}</div>
            <div class="stat-value">{value}</div>
        </div>
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MemoryReadout {
    pub used_gb: f64,
    pub capacity_gb: f64,
    pub fraction: f64,
    pub overflow: bool,
}

/// VRAM usage bar with the "insufficient memory" banner.
#[component]
pub fn MemoryBar(
    title: &'static str,
    #[prop(into)] readout: Signal<MemoryReadout>,
    #[prop(default = "linear-gradient(90deg, #3b82f6, #8b5cf6)")] fill: &'static str,
) -> impl IntoView {
    view! {
        <div class="memory">
            <div class="memory-row">
                <span class="memory-title">{title}</span>
                <span class="memory-figures">
                    {move || {
                        let r = readout.get();
                        let mut s = fmt_gb(r.used_gb);
                        s.push_str(" / ");
                        s.push_str(&fmt_gb(r.capacity_gb));
                        s
                    }}
                </span>
            </div>
            <div class="memory-track">
                <div
                    class="memory-fill"
                    style:width=move || fmt_percent(readout.get().fraction)
                    style:background=move || if readout.get().overflow { "#ef4444" } else { fill }
                ></div>
            </div>
            <Show when=move || readout.get().overflow>
                <div class="memory-warning">"⚠ Insufficient memory: the selection does not fit on this accelerator."</div>
            </Show>
        </div>
    }
}

/// Newest-first event log.
#[component]
pub fn LogPanel(#[prop(into)] entries: Signal<Vec<LogEntry>>) -> impl IntoView {
    view! {
        <ul class="log">
            {move || {
                entries
                    .get()
                    .into_iter()
                    .map(|e| {
                        view! {
                            <li>
                                <span class="log-time">{fmt_seconds(e.at_ms)}</span>
                                " "
                                <span>{e.message}</span>
                            </li>
                        }
                    })
                    .collect_view()
            }}
        </ul>
    }
}
