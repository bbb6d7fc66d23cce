use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use vartrack::analysis::{
    AnalysisRunner, BatchObserver, ConnectorRegistry, RecordBatchSource, SnpDetection,
    TrackConnector, TrackJob, WindowPlan,
};
use vartrack::genomics::io::{read_coverage, read_differences, read_features, read_gaps};
use vartrack::genomics::{write_table, ReadClass, ReadClassFilter};
use vartrack::stats::{CountingDistribution, DistributionKind, DEFAULT_BIN_STEPS};
use vartrack::store::FastaReference;
use vartrack::{MemoryStore, ReferenceStore, SnpConfig, StatsCollector};

#[derive(Parser, Debug)]
#[command(name = "vartrack", about = "Variant calling and coverage statistics for mapped tracks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Detect SNPs and small indels of one track on one chromosome.
    Snps(SnpArgs),
    /// Print the bin borders of a counting distribution.
    Bins {
        /// Adjustment value scaling the bin widths.
        #[arg(long, default_value_t = vartrack::stats::DEFAULT_ADJUSTMENT)]
        adjustment: u32,
    },
}

#[derive(clap::Args, Debug)]
struct SnpArgs {
    /// Indexed reference FASTA (`.fai` next to it).
    #[arg(long)]
    fasta: PathBuf,
    /// Chromosome name as listed in the FASTA index.
    #[arg(long)]
    chrom: String,
    /// Difference records (substitutions and deletions).
    #[arg(long)]
    diffs: PathBuf,
    /// Gap records (insertions).
    #[arg(long)]
    gaps: Option<PathBuf>,
    /// Coverage records.
    #[arg(long)]
    coverage: PathBuf,
    /// Feature table used for codon annotation.
    #[arg(long)]
    features: Option<PathBuf>,
    /// Track identifier written to the output.
    #[arg(long, default_value_t = 1)]
    track_id: u32,
    /// Minimum number of mismatching reads.
    #[arg(long, default_value_t = 5)]
    min_mismatches: u32,
    /// Minimum variant frequency in percent.
    #[arg(long, default_value_t = 20.0)]
    min_percentage: f64,
    /// Drop records whose base quality is at or below this value.
    #[arg(long, default_value_t = 0)]
    min_base_quality: u8,
    /// Minimum average base quality of the called symbol.
    #[arg(long, default_value_t = 0)]
    min_avg_base_quality: u32,
    /// Minimum average mapping quality of the called symbol.
    #[arg(long, default_value_t = 0)]
    min_avg_mapping_quality: u32,
    /// Apply the mismatch threshold to the most frequent symbol only.
    #[arg(long)]
    main_base: bool,
    /// Read classes to exclude (SPM, PM, SBM, BM, CM).
    #[arg(long = "exclude-class", value_name = "CLASS")]
    exclude_classes: Vec<String>,
    /// Window length streamed per batch.
    #[arg(long, default_value_t = 100_000)]
    interval_length: u32,
    /// Skip codon annotation.
    #[arg(long)]
    no_codons: bool,
    /// Output table (stdout if omitted).
    #[arg(long, short)]
    output: Option<PathBuf>,
    /// Write track statistics as `name<TAB>value` rows, followed by
    /// `distribution<TAB>kind<TAB>bin<TAB>count` rows for every non-empty bin.
    #[arg(long)]
    stats: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Snps(args) => run_snps(args)?,
        Commands::Bins { adjustment } => run_bins(adjustment)?,
    }
    Ok(())
}

fn snp_config(args: &SnpArgs) -> Result<SnpConfig> {
    let mut classes = ReadClassFilter::all();
    for tag in &args.exclude_classes {
        let class = match ReadClass::from_tag(tag) {
            Some(class) => class,
            None => bail!("unknown read class '{tag}'"),
        };
        classes = classes.excluding(class);
    }

    let config = SnpConfig::default()
        .with_min_mismatching_bases(args.min_mismatches)
        .with_min_percentage(args.min_percentage)
        .with_min_base_quality(args.min_base_quality)
        .with_min_average_qualities(args.min_avg_base_quality, args.min_avg_mapping_quality)
        .with_main_base(args.main_base)
        .with_read_classes(classes)
        .with_interval_length(args.interval_length)
        .with_codon_translation(!args.no_codons);
    config.validate().context("invalid thresholds")?;
    Ok(config)
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    Ok(BufReader::new(file))
}

fn run_snps(args: SnpArgs) -> Result<()> {
    let config = snp_config(&args)?;

    let reference = FastaReference::from_path(&args.fasta)
        .with_context(|| format!("failed to load reference {}", args.fasta.display()))?;
    let chrom_id = reference.chrom_id(&args.chrom).with_context(|| {
        let known: Vec<&str> = reference.chrom_names().collect();
        format!(
            "chromosome {} not found in {} (known: {})",
            args.chrom,
            args.fasta.display(),
            known.join(", ")
        )
    })?;

    let features = match &args.features {
        Some(path) => read_features(open(path)?, chrom_id)
            .with_context(|| format!("failed to parse features {}", path.display()))?,
        None => Vec::new(),
    };
    let diffs = read_differences(open(&args.diffs)?)
        .with_context(|| format!("failed to parse differences {}", args.diffs.display()))?;
    let gaps = match &args.gaps {
        Some(path) => read_gaps(open(path)?)
            .with_context(|| format!("failed to parse gaps {}", path.display()))?,
        None => Vec::new(),
    };
    let coverage = read_coverage(open(&args.coverage)?)
        .with_context(|| format!("failed to parse coverage {}", args.coverage.display()))?;

    let mut registry = ConnectorRegistry::new();
    registry.register_reference(1, reference.with_features(features));
    registry.register_track(TrackConnector::new(args.track_id, 1, args.chrom.clone()))?;
    let reference = registry.reference_for_track(args.track_id)?;

    let chrom_length = reference.chrom_length(chrom_id)?;
    let plan = WindowPlan::new(chrom_length, config.interval_length)?;
    info!(
        chrom = %args.chrom,
        length = chrom_length,
        windows = plan.num_windows,
        "starting snp detection"
    );

    let runner = AnalysisRunner::new();
    let source = RecordBatchSource::new(args.track_id, chrom_id, &plan, coverage, diffs, gaps);
    let mut detection =
        SnpDetection::new(reference, config.clone()).with_stop_flag(runner.stop_handle());
    let mut collector = StatsCollector::new(args.track_id).with_read_classes(config.read_classes);

    let summary = runner
        .run(vec![TrackJob {
            source: Box::new(source),
            observers: vec![
                &mut detection as &mut dyn BatchObserver,
                &mut collector as &mut dyn BatchObserver,
            ],
        }])
        .context("analysis failed")?;

    let calls = detection.into_results();
    info!(calls = calls.len(), batches = summary.batches, "snp detection complete");

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    write_table(&mut out, &calls).context("failed to write results")?;
    out.flush()?;

    let mut store = MemoryStore::new();
    let stats = collector
        .finish(&mut store)
        .context("failed to store track statistics")?;
    if let Some(path) = &args.stats {
        let mut writer = BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        );
        for (key, value) in stats.iter() {
            writeln!(writer, "{}\t{}", key.name(), value)?;
        }
        for (kind, bins) in store.distributions(args.track_id) {
            for (bin, count) in bins.iter().enumerate().filter(|(_, count)| **count > 0) {
                writeln!(writer, "distribution\t{kind}\t{bin}\t{count}")?;
            }
        }
        writer.flush()?;
    }

    Ok(())
}

fn run_bins(adjustment: u32) -> Result<()> {
    let distribution = CountingDistribution::with_schedule(
        DistributionKind::ReadLength,
        DEFAULT_BIN_STEPS,
        adjustment,
    );
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    writeln!(out, "Bin\tLower\tUpper")?;
    for (idx, (lower, upper)) in distribution
        .lower_borders()
        .iter()
        .zip(distribution.upper_borders())
        .enumerate()
    {
        writeln!(out, "{idx}\t{lower}\t{upper}")?;
    }
    out.flush()?;
    Ok(())
}
