//! Configuration for the aggregation pipeline.

use std::fmt;
use std::str::FromStr;

use crate::error::{MultigenError, Result};

/// Default batch size for Parquet reading
pub const DEFAULT_BATCH_SIZE: usize = 16384;

/// Which multigenerational-household codes count as multigenerational
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MultigenDefinition {
    /// Codes 22, 23, 31 and 32
    #[default]
    Any,
    /// Codes 22, 31 and 32 (code 23 excluded)
    AdjacentOnly,
}

impl FromStr for MultigenDefinition {
    type Err = MultigenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "any" | "all" => Ok(Self::Any),
            "adjacent" | "adjacent-only" | "adjacent_only" => Ok(Self::AdjacentOnly),
            other => Err(MultigenError::Config(format!(
                "unknown multigenerational definition '{other}'"
            ))),
        }
    }
}

/// How the household reducer handles person rows that disagree on
/// household-level fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcilePolicy {
    /// Abort on any disagreement
    Strict,
    /// Mean of weights, OR of multigenerational flags, and a warning
    #[default]
    Lenient,
}

impl FromStr for ReconcilePolicy {
    type Err = MultigenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            other => Err(MultigenError::Config(format!(
                "unknown reconcile policy '{other}'"
            ))),
        }
    }
}

/// Configuration for a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Multigenerational definition feeding the aggregates
    pub multigen_definition: MultigenDefinition,
    /// Household reconciliation policy
    pub reconcile_policy: ReconcilePolicy,
    /// Run the group reductions on the rayon pool
    pub parallel: bool,
    /// Size of the rayon pool configured by the binary
    pub threads: usize,
    /// Batch size for reading microdata
    pub batch_size: usize,
    /// Allowed deviation of a PUMA's summed allocation factors from 1
    pub allocation_tolerance: f64,
    /// CSV marker written for missing medians and undefined rates
    pub null_marker: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            multigen_definition: MultigenDefinition::Any,
            reconcile_policy: ReconcilePolicy::Lenient,
            parallel: true,
            threads: num_cpus::get(),
            batch_size: DEFAULT_BATCH_SIZE,
            allocation_tolerance: 1e-3,
            null_marker: "NA".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Build a configuration from defaults overridden by environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("MULTIGEN_DEFINITION") {
            config.multigen_definition = value.parse()?;
        }
        if let Some(value) = lookup("MULTIGEN_RECONCILE") {
            config.reconcile_policy = value.parse()?;
        }
        if let Some(value) = lookup("MULTIGEN_PARALLEL") {
            config.parallel = parse_var("MULTIGEN_PARALLEL", &value)?;
        }
        if let Some(value) = lookup("MULTIGEN_THREADS") {
            config.threads = parse_var("MULTIGEN_THREADS", &value)?;
        }
        if let Some(value) = lookup("PARQUET_BATCH_SIZE") {
            config.batch_size = parse_var("PARQUET_BATCH_SIZE", &value)?;
        }
        if let Some(value) = lookup("MULTIGEN_AFACT_TOLERANCE") {
            config.allocation_tolerance = parse_var("MULTIGEN_AFACT_TOLERANCE", &value)?;
        }
        if let Some(value) = lookup("MULTIGEN_NULL_MARKER") {
            config.null_marker = value;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(MultigenError::Config("threads must be at least 1".into()));
        }
        if self.batch_size == 0 {
            return Err(MultigenError::Config("batch size must be at least 1".into()));
        }
        if !(self.allocation_tolerance.is_finite() && self.allocation_tolerance >= 0.0) {
            return Err(MultigenError::Config(format!(
                "allocation tolerance must be a non-negative number, got {}",
                self.allocation_tolerance
            )));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| MultigenError::Config(format!("invalid value '{value}' for {name}")))
}

impl fmt::Display for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pipeline Configuration:")?;
        writeln!(f, "  Multigenerational Definition: {:?}", self.multigen_definition)?;
        writeln!(f, "  Reconcile Policy: {:?}", self.reconcile_policy)?;
        writeln!(f, "  Parallel: {}", self.parallel)?;
        writeln!(f, "  Threads: {}", self.threads)?;
        writeln!(f, "  Batch Size: {}", self.batch_size)?;
        writeln!(f, "  Allocation Tolerance: {}", self.allocation_tolerance)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.multigen_definition, MultigenDefinition::Any);
        assert_eq!(config.reconcile_policy, ReconcilePolicy::Lenient);
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.null_marker, "NA");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_lookup_overrides() {
        let vars: HashMap<&str, &str> = [
            ("MULTIGEN_DEFINITION", "adjacent"),
            ("MULTIGEN_RECONCILE", "strict"),
            ("MULTIGEN_PARALLEL", "false"),
            ("MULTIGEN_THREADS", "2"),
        ]
        .into_iter()
        .collect();

        let config =
            PipelineConfig::from_lookup(|name| vars.get(name).map(|v| (*v).to_string())).unwrap();

        assert_eq!(config.multigen_definition, MultigenDefinition::AdjacentOnly);
        assert_eq!(config.reconcile_policy, ReconcilePolicy::Strict);
        assert!(!config.parallel);
        assert_eq!(config.threads, 2);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad_threads = PipelineConfig::from_lookup(|name| {
            (name == "MULTIGEN_THREADS").then(|| "0".to_string())
        });
        assert!(matches!(bad_threads, Err(MultigenError::Config(_))));

        let bad_definition = PipelineConfig::from_lookup(|name| {
            (name == "MULTIGEN_DEFINITION").then(|| "cousins".to_string())
        });
        assert!(bad_definition.is_err());

        let bad_number = PipelineConfig::from_lookup(|name| {
            (name == "MULTIGEN_AFACT_TOLERANCE").then(|| "lots".to_string())
        });
        assert!(bad_number.is_err());
    }
}
