//! Run configuration.
//!
//! [`SamplerConfig`] is assembled once at startup from three layers
//! (command-line flags, the optional TOML file, built-in defaults) and is
//! then only read.

pub mod file;

use chrono::{DateTime, Utc};
use sampler_core::{
    BoundsError, DateRange, DescriptorStyle, GenerationBounds, IncludePolicy, IntRange,
    LengthRange, NamespaceFilter, ResolveError,
};
use std::path::PathBuf;

use crate::{BoundsOpts, SampleOpts};
pub use file::{FileBounds, FileConfig};

pub const DEFAULT_SAMPLE_SIZE: u32 = 1000;
pub const DEFAULT_MAX_COLLECTION_COUNT: usize = 20;
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Configuration problems detected before any database work starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("--{flag} must be a JSON array of strings: {source}")]
    PatternList {
        flag: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Filter(#[from] ResolveError),

    #[error("Invalid generation bounds: {0}")]
    Bounds(#[from] BoundsError),

    #[error("{name} must be greater than zero")]
    Zero { name: &'static str },

    #[error("--bare uses the fixed date range; drop --start-date/--end-date")]
    BareWithDates,
}

/// What the run writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// Flat `{path, probability, fieldType}` report
    Analysis,
    /// mgodatagen generator config
    Generator(DescriptorStyle),
}

#[derive(Debug, Clone)]
pub struct SamplerConfig {
    pub connection_string: String,
    pub sample_size: u32,
    pub filter: NamespaceFilter,
    pub include_policy: IncludePolicy,
    pub max_collection_count: usize,
    pub concurrency: usize,
    pub output: PathBuf,
    pub mode: OutputMode,
}

impl SamplerConfig {
    /// Build from parsed flags, loading `--config` when given.
    ///
    /// `bounds` is `Some` for the generator config mode.
    pub fn from_opts(opts: &SampleOpts, bounds: Option<&BoundsOpts>) -> Result<Self, ConfigError> {
        let file = match &opts.config {
            Some(path) => FileConfig::from_file(path)?,
            None => FileConfig::default(),
        };
        Self::from_layers(opts, bounds, &file, Utc::now())
    }

    /// Merge flags over `file` over defaults. `now` names the default output file.
    pub fn from_layers(
        opts: &SampleOpts,
        bounds: Option<&BoundsOpts>,
        file: &FileConfig,
        now: DateTime<Utc>,
    ) -> Result<Self, ConfigError> {
        let include = match &opts.include_namespace {
            Some(raw) => parse_pattern_list("include-namespace", raw)?,
            None => file.include_namespace.clone().unwrap_or_default(),
        };
        let exclude = match &opts.exclude_namespace {
            Some(raw) => parse_pattern_list("exclude-namespace", raw)?,
            None => file.exclude_namespace.clone().unwrap_or_default(),
        };
        let filter = NamespaceFilter::from_lists(&include, &exclude)?;

        let include_policy =
            if opts.accumulate_wildcards || file.accumulate_wildcards.unwrap_or(false) {
                IncludePolicy::Accumulate
            } else {
                IncludePolicy::LastWildcardWins
            };

        let sample_size = layer(&opts.sample_size, &file.sample_size, DEFAULT_SAMPLE_SIZE);
        if sample_size == 0 {
            return Err(ConfigError::Zero {
                name: "sample size",
            });
        }
        let concurrency = layer(&opts.concurrency, &file.concurrency, DEFAULT_CONCURRENCY);
        if concurrency == 0 {
            return Err(ConfigError::Zero {
                name: "concurrency",
            });
        }

        let mode = match bounds {
            None => OutputMode::Analysis,
            Some(flags) => OutputMode::Generator(descriptor_style(flags, &file.bounds)?),
        };

        let config = Self {
            connection_string: opts.connection_string.clone(),
            sample_size,
            filter,
            include_policy,
            max_collection_count: layer(
                &opts.max_collection_count,
                &file.max_collection_count,
                DEFAULT_MAX_COLLECTION_COUNT,
            ),
            concurrency,
            output: layer(&opts.output, &file.output, default_output_path(now)),
            mode,
        };

        tracing::info!(
            "Sample size {}, at most {} collections per database, concurrency {}",
            config.sample_size,
            config.max_collection_count,
            config.concurrency
        );
        Ok(config)
    }
}

fn layer<T: Clone>(flag: &Option<T>, file: &Option<T>, default: T) -> T {
    flag.clone().or_else(|| file.clone()).unwrap_or(default)
}

fn parse_pattern_list(flag: &'static str, raw: &str) -> Result<Vec<String>, ConfigError> {
    serde_json::from_str(raw).map_err(|source| ConfigError::PatternList { flag, source })
}

fn descriptor_style(flags: &BoundsOpts, file: &FileBounds) -> Result<DescriptorStyle, ConfigError> {
    let defaults = GenerationBounds::default();
    let bounds = GenerationBounds {
        int: IntRange {
            min: layer(&flags.min_int, &file.min_int, defaults.int.min),
            max: layer(&flags.max_int, &file.max_int, defaults.int.max),
        },
        string: LengthRange {
            min: layer(
                &flags.min_string_length,
                &file.min_string_length,
                defaults.string.min,
            ),
            max: layer(
                &flags.max_string_length,
                &file.max_string_length,
                defaults.string.max,
            ),
        },
        array: LengthRange {
            min: layer(
                &flags.min_array_length,
                &file.min_array_length,
                defaults.array.min,
            ),
            max: layer(
                &flags.max_array_length,
                &file.max_array_length,
                defaults.array.max,
            ),
        },
        dates: DateRange {
            start: layer(&flags.start_date, &file.start_date, defaults.dates.start),
            end: layer(&flags.end_date, &file.end_date, defaults.dates.end),
        },
    };

    if flags.bare || file.bare.unwrap_or(false) {
        let dates_given = flags.start_date.is_some()
            || flags.end_date.is_some()
            || file.start_date.is_some()
            || file.end_date.is_some();
        if dates_given {
            return Err(ConfigError::BareWithDates);
        }
        Ok(DescriptorStyle::Bare {
            dates: DateRange::default(),
        })
    } else {
        bounds.validate()?;
        Ok(DescriptorStyle::Bounded(bounds))
    }
}

/// `2024-05-01T12:30:00.000Z.json`, the name used when `--output` is absent.
pub fn default_output_path(now: DateTime<Utc>) -> PathBuf {
    PathBuf::from(format!("{}.json", now.format("%Y-%m-%dT%H:%M:%S%.3fZ")))
}
