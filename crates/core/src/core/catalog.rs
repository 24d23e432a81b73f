//! Static lookup tables: accelerators, models, datasets and chips.
//!
//! Tables keep declaration order (menus list entries the way they are written
//! here) and resolve keys through a hash index built once at load time.

use hashbrown::HashMap;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::precision::Precision;

pub trait Keyed {
    fn key(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HardwareProfile {
    pub key: String,
    pub name: String,
    pub vram_gb: f64,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub bandwidth_gbps: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub tera_ops: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub power: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModelArch {
    pub layers: u32,
    pub hidden: u32,
    pub heads: u32,
    pub moe: bool,
    pub default_precision: Precision,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModelProfile {
    pub key: String,
    pub name: String,
    /// Parameter count in billions.
    pub params_b: f64,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub arch: Option<ModelArch>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DatasetProfile {
    pub key: String,
    pub name: String,
    pub tokens: f64,
}

/// A chip with one model's weights hard-wired into silicon.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AsicProfile {
    pub key: String,
    pub name: String,
    pub model: String,
    pub params_b: f64,
    pub tokens_per_sec: u32,
    pub power: String,
}

macro_rules! impl_keyed {
    ($($t:ty),*) => {
        $(impl Keyed for $t {
            fn key(&self) -> &str {
                &self.key
            }
        })*
    };
}

impl_keyed!(HardwareProfile, ModelProfile, DatasetProfile, AsicProfile);

/// Ordered records with a key index.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(from = "Vec<T>", into = "Vec<T>", bound(serialize = "T: Clone + Serialize", deserialize = "T: Keyed + Deserialize<'de>"))
)]
pub struct Table<T: Keyed + Clone> {
    entries: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T: Keyed + Clone> Table<T> {
    pub fn new(entries: Vec<T>) -> Self {
        let mut index = HashMap::with_capacity(entries.len());
        for (i, e) in entries.iter().enumerate() {
            // First declaration wins; duplicates are reported by `validate`.
            index.entry(e.key().to_string()).or_insert(i);
        }
        Self { entries, index }
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn first(&self) -> Option<&T> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn has_duplicates(&self) -> bool {
        self.index.len() != self.entries.len()
    }
}

impl<T: Keyed + Clone> From<Vec<T>> for Table<T> {
    fn from(entries: Vec<T>) -> Self {
        Table::new(entries)
    }
}

impl<T: Keyed + Clone> From<Table<T>> for Vec<T> {
    fn from(t: Table<T>) -> Self {
        t.entries
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Catalog {
    pub gpus: Table<HardwareProfile>,
    /// GPUs with a published memory bandwidth, used by the pipeline view.
    pub pipeline_gpus: Table<HardwareProfile>,
    pub inference_models: Table<ModelProfile>,
    /// Models with architecture detail (layers/hidden) for KV-cache math.
    pub pipeline_models: Table<ModelProfile>,
    pub training_models: Table<ModelProfile>,
    pub datasets: Table<DatasetProfile>,
    pub tpus: Table<HardwareProfile>,
    pub asics: Table<AsicProfile>,
}

impl Catalog {
    #[cfg(feature = "serde")]
    pub fn from_json_str(s: &str) -> SimResult<Self> {
        let catalog: Catalog = serde_json::from_str(s)?;
        catalog.validate()?;
        Ok(catalog)
    }

    #[cfg(feature = "serde")]
    pub fn to_json_string(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> SimResult<()> {
        check_table("gpus", &self.gpus, |g| g.vram_gb > 0.0)?;
        check_table("pipeline_gpus", &self.pipeline_gpus, |g| {
            g.vram_gb > 0.0 && g.bandwidth_gbps.is_some_and(|b| b > 0.0)
        })?;
        check_table("inference_models", &self.inference_models, |m| {
            m.params_b > 0.0
        })?;
        check_table("pipeline_models", &self.pipeline_models, |m| {
            m.params_b > 0.0 && m.arch.is_some_and(|a| a.layers > 0 && a.hidden > 0)
        })?;
        check_table("training_models", &self.training_models, |m| {
            m.params_b > 0.0
        })?;
        check_table("datasets", &self.datasets, |d| d.tokens > 0.0)?;
        check_table("tpus", &self.tpus, |t| t.vram_gb > 0.0)?;
        check_table("asics", &self.asics, |a| a.tokens_per_sec > 0)?;
        Ok(())
    }

    pub fn gpu(&self, key: &str) -> SimResult<&HardwareProfile> {
        self.gpus.get(key).ok_or_else(|| SimError::unknown("gpu", key))
    }

    pub fn pipeline_gpu(&self, key: &str) -> SimResult<&HardwareProfile> {
        self.pipeline_gpus
            .get(key)
            .ok_or_else(|| SimError::unknown("pipeline gpu", key))
    }

    pub fn inference_model(&self, key: &str) -> SimResult<&ModelProfile> {
        self.inference_models
            .get(key)
            .ok_or_else(|| SimError::unknown("inference model", key))
    }

    pub fn pipeline_model(&self, key: &str) -> SimResult<&ModelProfile> {
        self.pipeline_models
            .get(key)
            .ok_or_else(|| SimError::unknown("pipeline model", key))
    }

    pub fn training_model(&self, key: &str) -> SimResult<&ModelProfile> {
        self.training_models
            .get(key)
            .ok_or_else(|| SimError::unknown("training model", key))
    }

    pub fn dataset(&self, key: &str) -> SimResult<&DatasetProfile> {
        self.datasets
            .get(key)
            .ok_or_else(|| SimError::unknown("dataset", key))
    }

    pub fn tpu(&self, key: &str) -> SimResult<&HardwareProfile> {
        self.tpus.get(key).ok_or_else(|| SimError::unknown("tpu", key))
    }

    pub fn asic(&self, key: &str) -> SimResult<&AsicProfile> {
        self.asics.get(key).ok_or_else(|| SimError::unknown("asic", key))
    }

    /// The embedded tables.
    pub fn builtin() -> Self {
        let gpus = [
            ("h100", "NVIDIA H100", 80.0),
            ("h200", "NVIDIA H200", 141.0),
            ("b100", "NVIDIA B100", 100.0),
            ("b200", "NVIDIA B200", 141.0),
            ("b200a", "NVIDIA B200A", 192.0),
            ("gb200", "NVIDIA GB200", 288.0),
            ("a100-80", "NVIDIA A100 (80GB)", 80.0),
            ("a100-40", "NVIDIA A100 (40GB)", 40.0),
            ("a10", "NVIDIA A10", 24.0),
            ("l40s", "NVIDIA L40S", 48.0),
            ("rtx4090", "RTX 4090", 24.0),
            ("rtx3090", "RTX 3090", 24.0),
            ("mi300x", "AMD MI300X", 192.0),
            ("mi250", "AMD MI250", 128.0),
        ]
        .into_iter()
        .map(|(k, n, v)| hardware(k, n, v))
        .collect::<Vec<_>>();

        let pipeline_gpus = [
            ("h100", "NVIDIA H100", 80.0, 3352.0),
            ("h200", "NVIDIA H200", 141.0, 4800.0),
            ("b100", "NVIDIA B100", 100.0, 4000.0),
            ("b200", "NVIDIA B200", 141.0, 5600.0),
            ("a100-80", "NVIDIA A100 (80GB)", 80.0, 2039.0),
            ("a100-40", "NVIDIA A100 (40GB)", 40.0, 1555.0),
            ("rtx4090", "RTX 4090", 24.0, 1008.0),
        ]
        .into_iter()
        .map(|(k, n, v, bw)| HardwareProfile {
            bandwidth_gbps: Some(bw),
            ..hardware(k, n, v)
        })
        .collect::<Vec<_>>();

        let inference_models = [
            ("llama-3.3-70b", "Llama 3.3 70B", 70.0),
            ("llama-4-maverick", "Llama 4 Maverick", 400.0),
            ("llama-4-scout", "Llama 4 Scout", 109.0),
            ("deepseek-v3", "DeepSeek-V3", 671.0),
            ("deepseek-r1", "DeepSeek-R1", 671.0),
            ("qwen2.5-72b", "Qwen 2.5 72B", 72.0),
            ("qwen2.5-moe", "Qwen 2.5-MoE", 145.0),
            ("qwen2.5-coder-32b", "Qwen 2.5 Coder 32B", 32.0),
            ("mistral-large2", "Mistral Large 2", 123.0),
            ("mistral-small", "Mistral Small", 22.0),
            ("phi-4", "Phi-4", 14.0),
            ("phi-4-mini", "Phi-4 Mini", 4.0),
            ("gemma-3-27b", "Gemma 3 27B", 27.0),
            ("gemma-3-12b", "Gemma 3 12B", 12.0),
            ("gemma-2-2b", "Gemma 2 2B", 2.0),
            ("gpt-4o", "GPT-4o", 200.0),
            ("gpt-4o-mini", "GPT-4o Mini", 8.0),
            ("claude-3-5", "Claude 3.5 Sonnet", 175.0),
            ("claude-3-haiku", "Claude 3 Haiku", 20.0),
        ]
        .into_iter()
        .map(|(k, n, p)| model(k, n, p, None))
        .collect::<Vec<_>>();

        use Precision::{Fp16, Int4, Int8};
        let pipeline_models = [
            ("llama-3.3-70b", "Llama 3.3 70B", 70.0, (80, 8192, 64, false, Int8)),
            ("llama-4-mav", "Llama 4 Maverick", 400.0, (96, 12288, 64, true, Int4)),
            ("deepseek-v3", "DeepSeek-V3 (671B)", 671.0, (128, 7168, 128, true, Int4)),
            ("deepseek-v3.2", "DeepSeek-V3.2", 671.0, (128, 7168, 128, true, Int4)),
            ("qwen2.5-72b", "Qwen 2.5 72B", 72.0, (80, 8192, 64, false, Int8)),
            ("qwen2.5-moe", "Qwen 2.5-MoE", 145.0, (60, 6144, 48, true, Int4)),
            ("mistral-large2", "Mistral Large 2 (123B)", 123.0, (88, 12288, 96, false, Int8)),
            ("phi-4", "Phi-4 (14B)", 14.0, (40, 5120, 40, false, Fp16)),
            ("gemma-3-27b", "Gemma 3 (27B)", 27.0, (42, 4096, 32, false, Fp16)),
            ("gpt-oss-120b", "GPT-OSS-120B", 120.0, (80, 8192, 64, true, Int8)),
        ]
        .into_iter()
        .map(|(k, n, p, (layers, hidden, heads, moe, default_precision))| {
            model(
                k,
                n,
                p,
                Some(ModelArch {
                    layers,
                    hidden,
                    heads,
                    moe,
                    default_precision,
                }),
            )
        })
        .collect::<Vec<_>>();

        let training_models = [
            ("llama-3.1-8b", "Llama 3.1 8B", 8.0),
            ("llama-3.1-70b", "Llama 3.1 70B", 70.0),
            ("llama-3.1-405b", "Llama 3.1 405B", 405.0),
            ("qwen2.5-7b", "Qwen 2.5 7B", 7.0),
            ("qwen2.5-72b", "Qwen 2.5 72B", 72.0),
            ("qwen2.5-coder-32b", "Qwen 2.5 Coder 32B", 32.0),
            ("mixtral-8x7b", "Mixtral 8x7B", 45.0),
            ("mistral-7b", "Mistral 7B", 7.0),
            ("phi-4", "Phi-4", 14.0),
            ("gemma-2-27b", "Gemma 2 27B", 27.0),
        ]
        .into_iter()
        .map(|(k, n, p)| model(k, n, p, None))
        .collect::<Vec<_>>();

        let datasets = [
            ("pile-1tb", "The Pile (1TB)", 300e9),
            ("fineweb-10tb", "FineWeb (10TB)", 12e12),
            ("fineweb-edu-2tb", "FineWeb-Edu (2TB)", 800e9),
            ("dolma-1tb", "Dolma (1TB)", 400e9),
            ("slimporg-500gb", "SlimPajama (500GB)", 200e9),
            ("redpajama-1tb", "RedPajama (1TB)", 300e9),
            ("cosmopedia-1tb", "Cosmopedia (1TB)", 400e9),
            ("wikipedia", "Wikipedia (en)", 4e9),
            ("arxiv", "ArXiv", 2e9),
            ("github-code", "GitHub Code", 800e9),
        ]
        .into_iter()
        .map(|(k, n, t)| DatasetProfile {
            key: k.to_string(),
            name: n.to_string(),
            tokens: t,
        })
        .collect::<Vec<_>>();

        let tpus = [
            ("tpu-v5e", "TPU v5e", 95.0, 197.0, "300W"),
            ("tpu-v5p", "TPU v5p", 145.0, 459.0, "750W"),
            ("tpu-v4", "TPU v4", 220.0, 275.0, "400W"),
            ("tpu-v4-8", "TPU v4 Pod (8)", 1760.0, 2200.0, "3200W"),
            ("tpu-v5e-4", "TPU v5e Pod (4)", 380.0, 788.0, "1200W"),
        ]
        .into_iter()
        .map(|(k, n, v, ops, w)| HardwareProfile {
            tera_ops: Some(ops),
            power: Some(w.to_string()),
            ..hardware(k, n, v)
        })
        .collect::<Vec<_>>();

        let asics = [
            ("hc1-8b", "Taalas HC1", "Llama 3.1 8B", 8.0, 17_000, "50W"),
            ("hc1-reasoning", "Taalas HC1-R", "Reasoning LLM", 32.0, 8_000, "80W"),
        ]
        .into_iter()
        .map(|(k, n, m, p, tps, w)| AsicProfile {
            key: k.to_string(),
            name: n.to_string(),
            model: m.to_string(),
            params_b: p,
            tokens_per_sec: tps,
            power: w.to_string(),
        })
        .collect::<Vec<_>>();

        Self {
            gpus: Table::new(gpus),
            pipeline_gpus: Table::new(pipeline_gpus),
            inference_models: Table::new(inference_models),
            pipeline_models: Table::new(pipeline_models),
            training_models: Table::new(training_models),
            datasets: Table::new(datasets),
            tpus: Table::new(tpus),
            asics: Table::new(asics),
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn hardware(key: &str, name: &str, vram_gb: f64) -> HardwareProfile {
    HardwareProfile {
        key: key.to_string(),
        name: name.to_string(),
        vram_gb,
        bandwidth_gbps: None,
        tera_ops: None,
        power: None,
    }
}

fn model(key: &str, name: &str, params_b: f64, arch: Option<ModelArch>) -> ModelProfile {
    ModelProfile {
        key: key.to_string(),
        name: name.to_string(),
        params_b,
        arch,
    }
}

fn check_table<T: Keyed + Clone>(
    table: &'static str,
    t: &Table<T>,
    valid: impl Fn(&T) -> bool,
) -> SimResult<()> {
    if t.is_empty() {
        return Err(SimError::InvalidCatalog(format!("{table} is empty")));
    }
    if t.has_duplicates() {
        return Err(SimError::InvalidCatalog(format!(
            "{table} has duplicate keys"
        )));
    }
    if let Some(bad) = t.iter().find(|e| !valid(e)) {
        return Err(SimError::InvalidCatalog(format!(
            "{table}: entry {:?} has out-of-range fields",
            bad.key()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_inventory_is_stable() {
        let c = Catalog::builtin();
        c.validate().unwrap();
        assert_eq!(c.gpus.len(), 14);
        assert_eq!(c.pipeline_gpus.len(), 7);
        assert_eq!(c.inference_models.len(), 19);
        assert_eq!(c.pipeline_models.len(), 10);
        assert_eq!(c.training_models.len(), 10);
        assert_eq!(c.datasets.len(), 10);
        assert_eq!(c.tpus.len(), 5);
        assert_eq!(c.asics.len(), 2);
    }

    #[test]
    fn lookups_resolve_and_report_unknown_keys() {
        let c = Catalog::builtin();
        assert_eq!(c.gpu("h100").unwrap().vram_gb, 80.0);
        assert_eq!(c.pipeline_gpu("b200").unwrap().bandwidth_gbps, Some(5600.0));
        assert_eq!(
            c.pipeline_model("phi-4").unwrap().arch.unwrap().default_precision,
            Precision::Fp16
        );
        assert_eq!(c.dataset("wikipedia").unwrap().tokens, 4e9);
        assert_eq!(c.asic("hc1-8b").unwrap().tokens_per_sec, 17_000);

        match c.gpu("h900") {
            Err(SimError::UnknownKey { table, key }) => {
                assert_eq!(table, "gpu");
                assert_eq!(key, "h900");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn iteration_keeps_declaration_order() {
        let c = Catalog::builtin();
        let keys: Vec<&str> = c.tpus.iter().map(|t| t.key()).collect();
        assert_eq!(
            keys,
            ["tpu-v5e", "tpu-v5p", "tpu-v4", "tpu-v4-8", "tpu-v5e-4"]
        );
        assert_eq!(c.gpus.first().map(|g| g.key.as_str()), Some("h100"));
    }

    #[test]
    fn duplicate_keys_fail_validation() {
        let mut c = Catalog::builtin();
        c.datasets = Table::new(vec![
            DatasetProfile {
                key: "a".into(),
                name: "A".into(),
                tokens: 1.0,
            },
            DatasetProfile {
                key: "a".into(),
                name: "A again".into(),
                tokens: 2.0,
            },
        ]);
        assert!(matches!(c.validate(), Err(SimError::InvalidCatalog(_))));
        // Lookup still resolves to the first declaration.
        assert_eq!(c.dataset("a").unwrap().name, "A");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_override_round_trips_and_rebuilds_index() {
        let c = Catalog::builtin();
        let json = c.to_json_string().unwrap();
        let back = Catalog::from_json_str(&json).unwrap();
        assert_eq!(back.gpu("mi300x").unwrap(), c.gpu("mi300x").unwrap());
        assert_eq!(
            back.pipeline_model("deepseek-v3").unwrap().arch,
            c.pipeline_model("deepseek-v3").unwrap().arch
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_with_bad_precision_is_rejected() {
        let json = Catalog::builtin()
            .to_json_string()
            .unwrap()
            .replacen("\"default_precision\": 8", "\"default_precision\": 6", 1);
        assert!(matches!(
            Catalog::from_json_str(&json),
            Err(SimError::Json(_))
        ));
    }
}
