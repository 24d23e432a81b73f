//! UI models and metadata that should be available on both wasm and native.
//!
//! Keeping these out of the wasm-only `web` module allows us to unit-test the
//! tab inventory and control menus on the host.

use vramsim::precision::Precision;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewTab {
    #[default]
    Inference,
    Pipeline,
    Training,
    Tpu,
    Asic,
}

impl ViewTab {
    pub fn label(self) -> &'static str {
        match self {
            ViewTab::Inference => "Inference",
            ViewTab::Pipeline => "Pipeline",
            ViewTab::Training => "Training",
            ViewTab::Tpu => "TPU",
            ViewTab::Asic => "ASIC",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            ViewTab::Inference => "⚡",
            ViewTab::Pipeline => "🔬",
            ViewTab::Training => "🏋️",
            ViewTab::Tpu => "🧮",
            ViewTab::Asic => "🔩",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ViewTab::Inference => "Does the model fit in VRAM?",
            ViewTab::Pipeline => "Prefill, decode and KV-cache growth, token by token",
            ViewTab::Training => "Weights, gradients and optimizer state over a pre-training run",
            ViewTab::Tpu => "Google TPU configurations",
            ViewTab::Asic => "Models etched into silicon",
        }
    }

    pub fn all() -> &'static [ViewTab] {
        &[
            ViewTab::Inference,
            ViewTab::Pipeline,
            ViewTab::Training,
            ViewTab::Tpu,
            ViewTab::Asic,
        ]
    }
}

/// Precision menu as (bits, label), widest first.
pub fn precision_options() -> Vec<(u32, &'static str)> {
    Precision::ALL.iter().map(|p| (p.bits(), p.label())).collect()
}

/// Parses a `<select>` value back into a precision; unknown values are ignored.
pub fn parse_precision(value: &str) -> Option<Precision> {
    value
        .parse::<u32>()
        .ok()
        .and_then(|bits| Precision::try_from(bits).ok())
}

/// What to do with a run-scoped interval after the phase may have changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    Arm,
    Disarm,
    Keep,
}

/// Run-scoped intervals tick only while a run is active.
pub fn timer_action(armed: bool, running: bool) -> TimerAction {
    match (armed, running) {
        (false, true) => TimerAction::Arm,
        (true, false) => TimerAction::Disarm,
        _ => TimerAction::Keep,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_inventory_is_stable() {
        let all = ViewTab::all();
        assert_eq!(all.len(), 5);

        let mut labels: Vec<&'static str> = all.iter().copied().map(ViewTab::label).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), 5);

        for t in all {
            assert!(!t.icon().trim().is_empty());
            assert!(!t.description().trim().is_empty());
        }
        assert_eq!(ViewTab::default(), ViewTab::Inference);
    }

    #[test]
    fn precision_menu_round_trips_through_select_values() {
        let opts = precision_options();
        assert_eq!(opts.len(), 3);
        assert_eq!(opts[0], (16, "16-bit"));
        for (bits, _) in opts {
            assert_eq!(parse_precision(&bits.to_string()).map(|p| p.bits()), Some(bits));
        }
        assert_eq!(parse_precision("32"), None);
        assert_eq!(parse_precision("fast"), None);
    }

    #[test]
    fn run_interval_follows_the_phase() {
        assert_eq!(timer_action(false, true), TimerAction::Arm);
        assert_eq!(timer_action(true, true), TimerAction::Keep);
        assert_eq!(timer_action(true, false), TimerAction::Disarm);
        // Idle views never hold an interval.
        assert_eq!(timer_action(false, false), TimerAction::Keep);
    }
}
