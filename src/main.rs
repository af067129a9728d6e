use std::{path::PathBuf, process::ExitCode, time::Duration};

use clap::Parser;
use idswap::{
    config::ReplaceConfig,
    directory::{Columns, IdPair},
    engine::{LogProgress, ProgressReporter, Strategy, SubstitutionStats},
    pipeline::{replace_product_ids, Paths},
    protected::DEFAULT_PROTECTED_PREFIX,
};
use indicatif::{ProgressBar, ProgressStyle};

/// Replace old product ids with new ones in a catalog document.
#[derive(Debug, clap::Parser)]
#[command(version)]
struct CommandLine {
    /// Document to rewrite.
    #[arg(short, long, default_value = "data/ncfCatalogIdSwitch.xml")]
    input: PathBuf,
    /// CSV directory of old and new ids.
    #[arg(long, default_value = "data/productIdDirectory.csv")]
    directory: PathBuf,
    /// Destination of the rewritten document.
    #[arg(short, long, default_value = "data/ncfCatalogIdSwitch-fixed.xml")]
    output: PathBuf,
    /// Substitution algorithm: sequential, alternation or mark-restore.
    #[arg(short, long, default_value_t = Strategy::default())]
    strategy: Strategy,
    /// Occurrences directly after this prefix are left unchanged.
    #[arg(long, default_value = DEFAULT_PROTECTED_PREFIX)]
    protected_prefix: String,
    #[arg(long, default_value = "oldID")]
    old_column: String,
    #[arg(long, default_value = "newID")]
    new_column: String,
    /// Print more debug info (disables the spinner).
    #[arg(short, long)]
    debug: bool,
}

/// Spinner with elapsed time, plus the usual periodic log lines.
struct SpinnerProgress {
    bar: ProgressBar,
    log: LogProgress,
}

impl SpinnerProgress {
    fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.green} {msg:.bold.green} • {elapsed_precise}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message("Replacing old product-id ...");
        bar.enable_steady_tick(Duration::from_millis(100));
        Self {
            bar,
            log: LogProgress::default(),
        }
    }
}

impl ProgressReporter for SpinnerProgress {
    fn pair_applied(&mut self, index: usize, pair: &IdPair) {
        self.bar.suspend(|| self.log.pair_applied(index, pair));
    }

    fn finished(&mut self, stats: &SubstitutionStats) {
        self.bar.finish_and_clear();
        self.log.finished(stats);
    }
}

fn main() -> ExitCode {
    let args = CommandLine::parse();

    let default_filter = if args.debug { "idswap=debug" } else { "idswap=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let paths = Paths {
        input: args.input,
        directory: args.directory,
        output: args.output,
    };
    let config = ReplaceConfig {
        strategy: args.strategy,
        protected_prefix: args.protected_prefix,
        columns: Columns {
            old: args.old_column,
            new: args.new_column,
        },
    };

    let result = if args.debug {
        replace_product_ids(&paths, &config, &mut LogProgress::default())
    } else {
        let mut spinner = SpinnerProgress::new();
        let result = replace_product_ids(&paths, &config, &mut spinner);
        // failures before the substitution never reach `finished`
        if result.is_err() {
            spinner.bar.finish_and_clear();
        }
        result
    };

    match result {
        Ok(stats) => {
            tracing::info!(
                replaced = stats.replaced,
                protected = stats.protected,
                "done"
            );
            ExitCode::SUCCESS
        }
        Err(error) => {
            let error = anyhow::Error::from(error).context("failed to replace product ids");
            tracing::error!("{error:#}");
            ExitCode::FAILURE
        }
    }
}
