use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, bail};
use log::info;
use multigen_pums::algorithm::pipeline::puma_rows;
use multigen_pums::models::{Crosswalk, FipsTable, PersonRecord};
use multigen_pums::utils::logging::{
    create_spinner, create_stage_progress_bar, finish_progress_bar, log_warning,
};
use multigen_pums::utils::synthetic::{SyntheticConfig, generate};
use multigen_pums::{
    PipelineConfig, find_parquet_files, load_crosswalk, load_fips_table,
    load_microdata_files_async, run_pipeline, write_json, write_rows_csv,
};

#[global_allocator]
static ALLOC: snmalloc_rs::SnMalloc = snmalloc_rs::SnMalloc;

const USAGE: &str = "usage: multigen-pums <microdata.parquet|dir>... --crosswalk FILE [--fips FILE] [--out DIR]\n       multigen-pums --synthetic N [--fips FILE] [--out DIR]";

/// Command-line arguments
#[derive(Debug, Default)]
struct Args {
    inputs: Vec<PathBuf>,
    crosswalk: Option<PathBuf>,
    fips: Option<PathBuf>,
    out: Option<PathBuf>,
    synthetic: Option<usize>,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        let mut parsed = Self::default();
        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .with_context(|| format!("{flag} requires a value\n{USAGE}"))
            };
            match arg.as_str() {
                "--crosswalk" => parsed.crosswalk = Some(value("--crosswalk")?.into()),
                "--fips" => parsed.fips = Some(value("--fips")?.into()),
                "--out" => parsed.out = Some(value("--out")?.into()),
                "--synthetic" => {
                    let n = value("--synthetic")?;
                    parsed.synthetic = Some(
                        n.parse::<usize>()
                            .with_context(|| format!("invalid household count '{n}'"))?,
                    );
                }
                "-h" | "--help" => bail!(USAGE),
                flag if flag.starts_with("--") => bail!("unknown option {flag}\n{USAGE}"),
                path => parsed.inputs.push(PathBuf::from(path)),
            }
        }

        if parsed.synthetic.is_none() && (parsed.inputs.is_empty() || parsed.crosswalk.is_none()) {
            bail!("microdata inputs and --crosswalk are required\n{USAGE}");
        }
        Ok(parsed)
    }
}

async fn load_inputs(
    args: &Args,
    config: &PipelineConfig,
) -> anyhow::Result<(Vec<PersonRecord>, Crosswalk)> {
    if let Some(households_per_puma) = args.synthetic {
        let data = generate(&SyntheticConfig {
            households_per_puma,
            ..SyntheticConfig::default()
        })?;
        info!("Generated {} synthetic person rows", data.rows.len());
        return Ok((data.persons()?, data.crosswalk()));
    }

    let crosswalk_path = args.crosswalk.as_deref().context("--crosswalk is required")?;
    let crosswalk = load_crosswalk(crosswalk_path)
        .with_context(|| format!("reading crosswalk {}", crosswalk_path.display()))?;

    let files = find_parquet_files(&args.inputs)?;
    if files.is_empty() {
        bail!("no Parquet files found in the given inputs");
    }
    let persons = load_microdata_files_async(&files, config.batch_size, config.threads).await?;
    Ok((persons, crosswalk))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse(std::env::args().skip(1))?;
    let config = PipelineConfig::from_env().context("reading configuration from environment")?;
    info!("{config}");

    rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build_global()
        .context("configuring the rayon thread pool")?;

    let out_dir = args.out.clone().unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    let start = Instant::now();
    let (persons, crosswalk) = load_inputs(&args, &config).await?;
    if persons.is_empty() {
        log_warning("No person rows loaded; outputs will be empty", None);
    }

    let fips: Option<FipsTable> = args
        .fips
        .as_deref()
        .map(|path| {
            load_fips_table(path).with_context(|| format!("reading FIPS table {}", path.display()))
        })
        .transpose()?;

    let spinner = create_spinner(Some("Aggregating households"));
    let output = run_pipeline(persons, &crosswalk, fips.as_ref(), &config)?;
    finish_progress_bar(&spinner, Some("Aggregation complete"));

    let progress = create_stage_progress_bar(4, Some("Writing outputs"));
    write_rows_csv(&out_dir.join("puma_multigen.csv"), &puma_rows(&output.pumas), &config.null_marker)?;
    progress.inc(1);
    write_rows_csv(&out_dir.join("county_multigen.csv"), &output.counties, &config.null_marker)?;
    progress.inc(1);
    write_rows_csv(&out_dir.join("state_multigen.csv"), &output.states, &config.null_marker)?;
    progress.inc(1);
    write_json(&out_dir.join("diagnostics.json"), &output.diagnostics)?;
    finish_progress_bar(&progress, Some("Outputs written"));

    info!(
        "Wrote outputs to {} in {:?}",
        out_dir.display(),
        start.elapsed()
    );
    Ok(())
}
