use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use concert_finder_core::{
    resolve_origin, BandsintownClient, BatchSource, FinderConfig, GlobBatchSource,
    HtmlRenderer, MergeMode, NominatimGeocoder, Pipeline, PipelineSettings, StaticBatchSource,
};
use tracing_subscriber::EnvFilter;

fn main() -> concert_finder_core::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.resolve_config()?;

    match &cli.command {
        Commands::Find { bands_glob } => {
            let pattern = bands_glob.as_deref().unwrap_or(config.bands_glob.as_str());
            run(&config, &GlobBatchSource::new(pattern))
        }
        Commands::Single { file } => {
            run(&config, &StaticBatchSource::from_files(vec![file.clone()]))
        }
    }
}

fn run(config: &FinderConfig, batches: &dyn BatchSource) -> concert_finder_core::Result<()> {
    tracing::info!(
        location = %config.location,
        radius = config.radius_miles,
        eps = config.merge_eps_miles,
        mode = ?config.merge_mode,
        "searching for concerts"
    );

    let geocoder = NominatimGeocoder::new(&config.user_agent)?;
    let source = BandsintownClient::new(&config.app_id)?;
    let origin = resolve_origin(&geocoder, &config.location)?;

    let mut renderer = HtmlRenderer::new(&config.output_dir)?;
    if let Some(template) = &config.template {
        renderer = renderer.with_template(template)?;
    }
    if let Some(stylesheet) = &config.stylesheet {
        renderer = renderer.with_stylesheet(stylesheet)?;
    }

    let pipeline = Pipeline::new(
        PipelineSettings::from_config(config, origin),
        &source,
        &geocoder,
    );
    let summary = pipeline.run(batches, &renderer)?;

    for path in &summary.rendered {
        println!("{}", path.display());
    }
    for (batch, error) in &summary.failed {
        eprintln!("{batch}: {error}");
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = if verbose > 0 { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Find concerts of your favourite bands around you", long_about = None)]
struct Cli {
    /// TOML configuration file; command line flags override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Location to search around, e.g. "State College, PA".
    #[arg(short, long, global = true)]
    location: Option<String>,
    /// Search radius in miles.
    #[arg(short = 'd', long = "distance", global = true)]
    radius: Option<f64>,
    /// Same-day shows closer than this many miles are merged.
    #[arg(long, global = true)]
    eps: Option<f64>,
    /// Merge every co-located same-day show, not only sorted neighbours.
    #[arg(long, global = true)]
    cluster: bool,
    /// Directory reports are written to.
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,
    /// Number of bands fetched concurrently.
    #[arg(short, long, global = true)]
    workers: Option<usize>,
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn resolve_config(&self) -> concert_finder_core::Result<FinderConfig> {
        let mut config = match &self.config {
            Some(path) => FinderConfig::load(path)?,
            None => FinderConfig::default(),
        };

        if let Some(location) = &self.location {
            config.location = location.clone();
        }
        if let Some(radius) = self.radius {
            config.radius_miles = radius;
        }
        if let Some(eps) = self.eps {
            config.merge_eps_miles = eps;
        }
        if self.cluster {
            config.merge_mode = MergeMode::Cluster;
        }
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }

        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Process every bands file matched by the batch pattern, one report each.
    Find {
        /// Glob selecting the bands files, e.g. "data/*.txt".
        #[arg(long)]
        bands_glob: Option<String>,
    },
    /// Process a single bands file.
    Single {
        /// File with one band name per line.
        file: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "concert-finder",
            "-l",
            "State College, PA",
            "-d",
            "250",
            "--cluster",
            "find",
        ]);
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.location, "State College, PA");
        assert_eq!(config.radius_miles, 250.0);
        assert_eq!(config.merge_mode, MergeMode::Cluster);
        assert_eq!(config.merge_eps_miles, 0.5);
    }

    #[test]
    fn rejects_zero_workers() {
        let cli = Cli::parse_from(["concert-finder", "single", "bands.txt", "-w", "0"]);
        assert!(cli.resolve_config().is_err());
    }
}
