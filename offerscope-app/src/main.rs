use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use offerscope_common::display::{format_label, format_salary, length_label};
use offerscope_common::{Format, Offer};
use offerscope_common::observability::{
    LogConfig, LogFormat, default_data_dir, expand_home, init_logging,
};
use offerscope_config::{DEFAULT_CONFIG_FILE, LogFormatConfig, OffersConfig, OffersConfigLoader};
use offerscope_runtime::OfferscopeRuntime;
use pipeline::build_from_config;
use std::path::PathBuf;
use std::time::Duration;
use store::JsonOfferStore;

mod pipeline;
mod store;

const APP_NAME: &str = "offerscope";

#[derive(Parser, Debug)]
#[command(author, version, about = "Scrape, normalize and store university job board offers")]
struct Cli {
    /// YAML config file (defaults to ./offerscope.yaml when present)
    #[arg(short, long, env = "OFFERSCOPE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print ids on the board that are not stored yet
    Detect,
    /// Scrape new offers into the pending batch
    Scrape {
        /// Scrape every offer on the board, not only new ones
        #[arg(long)]
        all: bool,
    },
    /// Normalize the pending batch and append it to the store
    Normalize,
    /// Detect, scrape, normalize and store in one go
    Run,
    /// Print stored offers
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (env wins)
    let loader = OffersConfigLoader::new();
    let loader = match &cli.config {
        Some(path) => loader.with_file(path),
        None => loader.with_optional_file(DEFAULT_CONFIG_FILE),
    };
    let cfg: OffersConfig = loader.load().context("loading configuration")?;

    // 2) Logging from the `logging` section
    let log_path = init_logging(LogConfig {
        app_name: APP_NAME,
        log_dir: cfg.logging.dir.clone(),
        emit_stderr: cfg.logging.emit_stderr,
        format: match cfg.logging.format {
            LogFormatConfig::Text => LogFormat::Text,
            LogFormatConfig::Json => LogFormat::Json,
        },
        default_filter: cfg.logging.filter.clone(),
    })?;
    tracing::debug!(log = %log_path.display(), command = ?cli.command, "app.start");

    // 3) Run the command; Ctrl-C cancels it
    let runtime = OfferscopeRuntime::build(APP_NAME, None)?;
    runtime.run(Duration::from_secs(2), |cancel| async move {
        execute(cli.command, &cfg, &cancel).await
    })
}

async fn execute(
    command: Command,
    cfg: &OffersConfig,
    cancel: &tokio_util::sync::CancellationToken,
) -> Result<()> {
    let store_path = store_path(cfg);
    let mut store = JsonOfferStore::open(&store_path)
        .with_context(|| format!("opening offer store {}", store_path.display()))?;

    if let Command::List = command {
        list(&store);
        return Ok(());
    }

    let pipeline = build_from_config(cfg)?;
    match command {
        Command::Detect => {
            let ids = pipeline.detect(&store).await?;
            for id in &ids {
                println!("{id}");
            }
            eprintln!("{} new offer(s)", ids.len());
        }
        Command::Scrape { all } => {
            let staged = pipeline.scrape(&mut store, all, cancel).await?;
            eprintln!("{staged} offer(s) pending normalization");
        }
        Command::Normalize => {
            let appended = pipeline.normalize(&mut store, cancel).await?;
            eprintln!("{appended} offer(s) stored");
        }
        Command::Run => {
            let summary = pipeline.run(&mut store, cancel).await?;
            eprintln!(
                "{} new offer(s) scraped, {} stored",
                summary.scraped, summary.appended
            );
        }
        Command::List => {}
    }
    Ok(())
}

fn store_path(cfg: &OffersConfig) -> PathBuf {
    match &cfg.store.path {
        Some(path) => expand_home(path),
        None => default_data_dir(APP_NAME).join("offers.json"),
    }
}

fn list(store: &JsonOfferStore) {
    for offer in store.offers() {
        println!("{}", offer_line(offer));
    }
    match store.last_updated() {
        Some(at) => eprintln!("{} offer(s), last updated {at}", store.offers().len()),
        None => eprintln!("no offers stored yet in {}", store.path().display()),
    }
    if !store.pending().is_empty() {
        eprintln!("{} offer(s) pending normalization", store.pending().len());
    }
}

fn offer_line(offer: &Offer) -> String {
    let places: Vec<String> = offer
        .location
        .iter()
        .map(|loc| match &loc.country {
            Some(country) => format!("{}, {country}", loc.city),
            None => loc.city.clone(),
        })
        .collect();
    let formats: Vec<&str> = Format::ALL
        .into_iter()
        .filter(|f| offer.has_format(*f))
        .map(format_label)
        .collect();
    format!(
        "{}\t{} | {} | {} | {} | {} | {}",
        offer.id,
        offer.title,
        offer.company,
        places.join(" / "),
        format_salary(offer.salary.as_ref()),
        formats.join(", "),
        length_label(&offer.length),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use offerscope_common::{Location, Salary};

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn scrape_all_flag_parses() {
        let cli =
            Cli::try_parse_from(["offerscope", "--config", "x.yaml", "scrape", "--all"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("x.yaml")));
        assert!(matches!(cli.command, Command::Scrape { all: true }));
    }

    #[test]
    fn offer_line_uses_display_labels() {
        let mut offer = store::tests::scraped("9").map_normalized(
            |_| {
                vec![
                    Location {
                        city: "Zurich".into(),
                        country: Some("Switzerland".into()),
                    },
                    Location::unresolved("Remote"),
                ]
            },
            |_| Some(Salary::Amount(0.0)),
        );
        offer.format = vec![Format::Internship, Format::Project];

        assert_eq!(
            offer_line(&offer),
            "9\tOffer 9 | Acme | Zurich, Switzerland / Remote | Unpaid | Internship, Master Project | 4 - 6 months"
        );
    }

    #[test]
    fn offer_line_lists_formats_in_display_order() {
        let mut offer = store::tests::scraped("3").map_normalized(|_| Vec::new(), |_| None);
        offer.format = vec![Format::Project, Format::Internship, Format::Project];
        assert!(offer_line(&offer).contains("| Internship, Master Project |"));

        offer.format.clear();
        assert_eq!(offer_line(&offer), "3\tOffer 3 | Acme |  | Unspecified |  | 4 - 6 months");
    }

    #[test]
    fn store_path_expands_home() {
        let mut cfg = OffersConfig::default();
        cfg.store.path = Some(PathBuf::from("/var/lib/offerscope/offers.json"));
        assert_eq!(store_path(&cfg), PathBuf::from("/var/lib/offerscope/offers.json"));
        cfg.store.path = None;
        assert!(store_path(&cfg).ends_with("offerscope/offers.json"));
    }
}
