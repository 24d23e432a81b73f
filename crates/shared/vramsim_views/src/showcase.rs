//! Selection state for the TPU and hard-wired ASIC tabs. No phases.

use std::sync::Arc;

use vramsim::catalog::{AsicProfile, Catalog, HardwareProfile};
use vramsim::error::{SimError, SimResult};

#[derive(Debug, Clone)]
pub struct TpuShowcase {
    catalog: Arc<Catalog>,
    selected: HardwareProfile,
}

impl TpuShowcase {
    pub fn new(catalog: Arc<Catalog>) -> SimResult<Self> {
        let selected = catalog
            .tpus
            .first()
            .cloned()
            .ok_or_else(|| SimError::InvalidCatalog("no tpus".into()))?;
        Ok(Self { catalog, selected })
    }

    pub fn select(&mut self, key: &str) -> SimResult<()> {
        self.selected = self.catalog.tpu(key)?.clone();
        Ok(())
    }

    pub fn selected(&self) -> &HardwareProfile {
        &self.selected
    }

    pub fn options(&self) -> impl Iterator<Item = &HardwareProfile> {
        self.catalog.tpus.iter()
    }

    /// Headline figures: (TOPS, HBM GB, power).
    pub fn headline(&self) -> (f64, f64, &str) {
        (
            self.selected.tera_ops.unwrap_or(0.0),
            self.selected.vram_gb,
            self.selected.power.as_deref().unwrap_or("n/a"),
        )
    }
}

#[derive(Debug, Clone)]
pub struct AsicShowcase {
    catalog: Arc<Catalog>,
    selected: AsicProfile,
}

impl AsicShowcase {
    pub fn new(catalog: Arc<Catalog>) -> SimResult<Self> {
        let selected = catalog
            .asics
            .first()
            .cloned()
            .ok_or_else(|| SimError::InvalidCatalog("no asics".into()))?;
        Ok(Self { catalog, selected })
    }

    pub fn select(&mut self, key: &str) -> SimResult<()> {
        self.selected = self.catalog.asic(key)?.clone();
        Ok(())
    }

    pub fn selected(&self) -> &AsicProfile {
        &self.selected
    }

    pub fn options(&self) -> impl Iterator<Item = &AsicProfile> {
        self.catalog.asics.iter()
    }

    /// Tokens/s with thousands separators, e.g. `17,000`.
    pub fn tokens_per_sec_label(&self) -> String {
        group_thousands(self.selected.tokens_per_sec as u64)
    }
}

pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Arc<Catalog> {
        Arc::new(Catalog::builtin())
    }

    #[test]
    fn tpu_defaults_to_first_entry_and_switches() {
        let mut t = TpuShowcase::new(catalog()).unwrap();
        assert_eq!(t.selected().key, "tpu-v5e");
        assert_eq!(t.headline(), (197.0, 95.0, "300W"));

        t.select("tpu-v4-8").unwrap();
        assert_eq!(t.headline(), (2200.0, 1760.0, "3200W"));
        assert!(t.select("tpu-v9").is_err());
        assert_eq!(t.selected().key, "tpu-v4-8");
        assert_eq!(t.options().count(), 5);
    }

    #[test]
    fn asic_reports_grouped_throughput() {
        let mut a = AsicShowcase::new(catalog()).unwrap();
        assert_eq!(a.tokens_per_sec_label(), "17,000");
        a.select("hc1-reasoning").unwrap();
        assert_eq!(a.selected().model, "Reasoning LLM");
        assert_eq!(a.tokens_per_sec_label(), "8,000");
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }
}
