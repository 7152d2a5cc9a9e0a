//! Load a medicine list into the configured database.
//!
//! Usage: `load-medicines [--clear] [PATH]`
//!
//! Without PATH the bundled catalogue is loaded. The database location comes
//! from `MEDGUIDE_DB_PATH`.

use anyhow::{bail, Context, Result};
use tracing::info;

use medguide_core::catalogue::{load_seed_file, Catalogue, SeedOptions};
use medguide_core::{telemetry, CoreConfig, Database};

fn main() -> Result<()> {
    let config = CoreConfig::from_env().context("invalid configuration")?;
    telemetry::init(config.json_logs);

    let mut options = SeedOptions::default();
    let mut path = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--clear" => options.clear = true,
            "-h" | "--help" => {
                println!("usage: load-medicines [--clear] [PATH]");
                return Ok(());
            }
            flag if flag.starts_with('-') => bail!("unknown option {}", flag),
            _ if path.is_some() => bail!("only one seed file may be given"),
            other => path = Some(other.to_string()),
        }
    }

    let db = Database::open_with_config(&config)
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;
    let catalogue = Catalogue::new(&db);

    let report = match &path {
        Some(path) => {
            let records = load_seed_file(path).with_context(|| format!("failed to read {}", path))?;
            info!(path = %path, records = records.len(), "loading seed file");
            catalogue.seed(&records, options)?
        }
        None => catalogue.seed_default(options)?,
    };

    for failure in &report.failures {
        eprintln!("record {}: {}", failure.id, failure.reason);
    }
    println!(
        "loaded {} medicines ({} created, {} updated, {} deleted, {} failed)",
        report.loaded(),
        report.created,
        report.updated,
        report.deleted,
        report.failed()
    );

    if report.failed() > 0 {
        bail!("{} records failed to load", report.failed());
    }
    Ok(())
}
