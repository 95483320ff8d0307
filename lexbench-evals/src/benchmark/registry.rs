//! Benchmark lookup by name.

use super::{Benchmark, BenchmarkSources, Cuad, IfEval, LegalBench, MmluPro};
use crate::config::SuiteConfig;
use crate::{Error, Result};

/// Names of the built-in benchmarks, in default run order.
pub const BENCHMARK_NAMES: [&str; 4] = [
    LegalBench::NAME,
    Cuad::NAME,
    IfEval::NAME,
    MmluPro::NAME,
];

type Constructor = fn(&SuiteConfig, &BenchmarkSources) -> Result<Box<dyn Benchmark>>;

fn legalbench(config: &SuiteConfig, sources: &BenchmarkSources) -> Result<Box<dyn Benchmark>> {
    Ok(Box::new(LegalBench::new(sources.legalbench.clone(), config)))
}

fn cuad(config: &SuiteConfig, sources: &BenchmarkSources) -> Result<Box<dyn Benchmark>> {
    Ok(Box::new(Cuad::new(sources.cuad.clone(), config)?))
}

fn ifeval(_config: &SuiteConfig, sources: &BenchmarkSources) -> Result<Box<dyn Benchmark>> {
    Ok(Box::new(IfEval::new(sources.ifeval.clone())))
}

fn mmlupro(config: &SuiteConfig, sources: &BenchmarkSources) -> Result<Box<dyn Benchmark>> {
    Ok(Box::new(MmluPro::new(sources.mmlupro.clone(), config)))
}

/// Maps benchmark names to constructors.
#[derive(Clone, Default)]
pub struct BenchmarkRegistry {
    constructors: Vec<(String, Constructor)>,
}

impl BenchmarkRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the four built-in benchmarks.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(LegalBench::NAME, legalbench);
        registry.register(Cuad::NAME, cuad);
        registry.register(IfEval::NAME, ifeval);
        registry.register(MmluPro::NAME, mmlupro);
        registry
    }

    /// Add or replace a constructor.
    pub fn register(&mut self, name: impl Into<String>, constructor: Constructor) {
        let name = name.into();
        if let Some(slot) = self.constructors.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = constructor;
        } else {
            self.constructors.push((name, constructor));
        }
    }

    /// Build the benchmark called `name`.
    pub fn create(
        &self,
        name: &str,
        config: &SuiteConfig,
        sources: &BenchmarkSources,
    ) -> Result<Box<dyn Benchmark>> {
        let (_, constructor) = self
            .constructors
            .iter()
            .find(|(n, _)| n == name)
            .ok_or_else(|| Error::UnknownBenchmark(name.to_string()))?;
        constructor(config, sources)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.iter().map(|(n, _)| n.as_str())
    }

    /// Check that every requested name exists.
    pub fn validate<S: AsRef<str>>(&self, names: &[S]) -> Result<()> {
        for name in names {
            let name = name.as_ref();
            if !self.constructors.iter().any(|(n, _)| n == name) {
                return Err(Error::UnknownBenchmark(name.to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::dataset::{StaticDataset, StaticLegalBench};

    fn sources() -> BenchmarkSources {
        BenchmarkSources {
            legalbench: Arc::new(StaticLegalBench::new()),
            cuad: Arc::new(StaticDataset::new("cuad", Vec::new())),
            ifeval: Arc::new(StaticDataset::new("ifeval", Vec::new())),
            mmlupro: Arc::new(StaticDataset::new("mmlupro", Vec::new())),
        }
    }

    #[test]
    fn defaults_cover_every_name() {
        let registry = BenchmarkRegistry::with_defaults();
        assert_eq!(registry.names().collect::<Vec<_>>(), BENCHMARK_NAMES);
        let config = SuiteConfig::default();
        for name in BENCHMARK_NAMES {
            let bench = registry.create(name, &config, &sources()).unwrap();
            assert_eq!(bench.name(), name);
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let registry = BenchmarkRegistry::with_defaults();
        let err = registry
            .create("bigbench", &SuiteConfig::default(), &sources())
            .err()
            .unwrap();
        assert!(matches!(err, Error::UnknownBenchmark(ref n) if n == "bigbench"));
        assert!(registry.validate(&["cuad", "ifeval"]).is_ok());
        assert!(registry.validate(&["cuad", "bigbench"]).is_err());
    }
}
