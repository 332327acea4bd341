use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use plotsmith::{
    BatchOptions, BatchRunner, CancelToken, ColorTable, JobOutcome, PlotConfig, generate_figure,
    load_definition, load_profiles, parse_basis,
};

#[derive(Parser, Debug)]
#[command(name = "plotsmith", version)]
struct Cli {
    #[command(flatten)]
    log: LogArgs,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a single plot and print its JSON document.
    Plot(PlotArgs),
    /// Generate every plot of every profile into a versioned output tree.
    Batch(BatchArgs),
}

#[derive(Args, Debug)]
struct LogArgs {
    /// Include info level logs (the default).
    #[arg(short = 'v', long, global = true, env = "PLOTSMITH_VERBOSE")]
    verbose: bool,

    /// Include debug level logs.
    #[arg(long = "vv", global = true, env = "PLOTSMITH_VERYVERBOSE")]
    very_verbose: bool,

    /// Only log warnings and errors.
    #[arg(short, long, global = true, env = "PLOTSMITH_QUIET")]
    quiet: bool,

    /// Emit logs as JSON lines instead of human friendly text.
    #[arg(long, global = true, env = "PLOTSMITH_JSON_LOGS")]
    json_logs: bool,
}

#[derive(Args, Debug)]
struct PlotArgs {
    /// Plot definition file.
    file: PathBuf,

    /// Data source in the format name=url, e.g. `warehouse=sqlite:data.db`. May be repeated.
    #[arg(short, long = "source")]
    sources: Vec<String>,

    /// Template parameter in the format key=value. May be repeated.
    #[arg(short, long = "param")]
    params: Vec<String>,

    /// Write the JSON document to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Emit compact JSON instead of pretty-printed.
    #[arg(long)]
    compact: bool,

    /// Validate the definition without running queries.
    #[arg(long)]
    validate: bool,

    /// Directory containing `colors.yaml`.
    #[arg(long)]
    conf: Option<PathBuf>,

    /// Basis time: `now`, an offset such as `-2d`, a Unix timestamp or RFC 3339.
    #[arg(long, default_value = "now", allow_hyphen_values = true)]
    basis: String,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// Root of the versioned output tree.
    #[arg(long, env = "PLOTSMITH_OUT")]
    out: PathBuf,

    /// Directory containing `profiles.yaml` and `colors.yaml`.
    #[arg(long, env = "PLOTSMITH_CONF")]
    conf: PathBuf,

    /// Basis time: `now`, an offset such as `-2d`, a Unix timestamp or RFC 3339.
    #[arg(long, env = "PLOTSMITH_BASIS", default_value = "now", allow_hyphen_values = true)]
    basis: String,

    /// Regenerate plots even when an up to date version exists.
    #[arg(long, env = "PLOTSMITH_FORCE")]
    force: bool,

    /// Emit compact JSON instead of pretty-printed.
    #[arg(long, env = "PLOTSMITH_COMPACT")]
    compact: bool,

    /// Report what would be generated without running queries.
    #[arg(long, env = "PLOTSMITH_VALIDATE")]
    validate: bool,

    /// Number of plots generated concurrently.
    #[arg(long, env = "PLOTSMITH_CONCURRENCY", default_value_t = plotsmith::batch::DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Only process definition files whose name matches this glob.
    #[arg(long = "match", env = "PLOTSMITH_MATCH")]
    matcher: Option<String>,

    /// Data source in the format name=url. May be repeated.
    #[arg(short, long = "source", env = "PLOTSMITH_SOURCE", value_delimiter = ',')]
    sources: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log);
    match cli.cmd {
        Command::Plot(args) => cmd_plot(args),
        Command::Batch(args) => cmd_batch(args),
    }
}

fn init_logging(args: &LogArgs) {
    let level = if args.very_verbose {
        "debug"
    } else if args.quiet && !args.verbose {
        "warn"
    } else {
        "info"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if args.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn base_config(basis: &str, sources: &[String]) -> anyhow::Result<PlotConfig> {
    let basis = parse_basis(basis, Utc::now()).context("invalid basis time")?;
    let mut cfg = PlotConfig::new(basis);
    for opt in sources {
        cfg.sources.register_url_option(opt)?;
    }
    Ok(cfg)
}

fn load_colors_if_present(conf: &Path) -> anyhow::Result<Option<ColorTable>> {
    let path = conf.join("colors.yaml");
    if !path.exists() {
        return Ok(None);
    }
    tracing::info!(filename = %path.display(), "parsing colors.yaml");
    let colors =
        ColorTable::load(&path).with_context(|| format!("load colors '{}'", path.display()))?;
    Ok(Some(colors))
}

fn cmd_plot(args: PlotArgs) -> anyhow::Result<()> {
    let mut cfg = base_config(&args.basis, &args.sources)?;
    for param in &args.params {
        let Some((key, value)) = param.split_once('=') else {
            anyhow::bail!("param option not valid, use format 'key=value'");
        };
        if cfg.template_params.contains_key(key) {
            anyhow::bail!("duplicate template parameter {key:?} specified");
        }
        cfg.template_params.insert(key.to_owned(), value.to_owned());
    }
    if let Some(conf) = &args.conf
        && let Some(colors) = load_colors_if_present(conf)?
    {
        cfg.colors = colors;
    }

    let pd = load_definition(&args.file, &cfg.template_vars())
        .with_context(|| format!("load plot definition '{}'", args.file.display()))?;

    if args.validate {
        print!("{}", pd.summary());
        return Ok(());
    }

    tracing::info!(filename = %args.file.display(), "generating figure");
    let doc = generate_figure(&pd, &cfg, &CancelToken::new()).context("failed to generate plot")?;
    let data = doc.to_json_bytes(args.compact)?;

    match &args.output {
        Some(path) => {
            plotsmith::organize::write_output(path, &data)
                .with_context(|| format!("write output '{}'", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => println!("{}", String::from_utf8_lossy(&data)),
    }
    Ok(())
}

fn cmd_batch(args: BatchArgs) -> anyhow::Result<()> {
    let mut cfg = base_config(&args.basis, &args.sources)?;
    if let Some(colors) = load_colors_if_present(&args.conf)? {
        cfg.colors = colors;
    }
    let profiles = load_profiles(&args.conf)
        .with_context(|| format!("load profiles from '{}'", args.conf.display()))?;

    let mut opts = BatchOptions::new(&args.out);
    opts.force = args.force;
    opts.compact = args.compact;
    opts.validate = args.validate;
    opts.concurrency = args.concurrency;
    opts.matcher = args
        .matcher
        .as_deref()
        .map(plotsmith::config::glob_to_regex)
        .transpose()
        .context("invalid --match glob")?;

    let report = BatchRunner::new(cfg, profiles, opts).run()?;
    for outcome in &report.outcomes {
        if let JobOutcome::Validated { report, .. } = outcome {
            println!("{report}");
        }
    }
    tracing::info!(
        written = report.written().count(),
        up_to_date = report.up_to_date(),
        "batch complete"
    );
    Ok(())
}
