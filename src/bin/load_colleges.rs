//! Import cutoff CSV exports into the college database.
//!
//! Usage: load-colleges [--db <path>] <MCA|MBA|MTECH> <csv-path> [<TYPE> <csv-path> ...]

use college_predictor::config::Settings;
use college_predictor::models::CollegeType;
use college_predictor::services::CsvLoader;
use std::path::PathBuf;
use tracing::{error, info, warn};

struct Args {
    db: Option<PathBuf>,
    imports: Vec<(CollegeType, PathBuf)>,
}

fn parse_args() -> Result<Args, Box<dyn std::error::Error>> {
    let mut db = None;
    let mut imports = Vec::new();
    let mut args = std::env::args().skip(1);

    while let Some(a) = args.next() {
        match a.as_str() {
            "--db" => db = Some(PathBuf::from(args.next().ok_or("Missing value for --db")?)),
            "-h" | "--help" => {
                return Err("usage: load-colleges [--db <path>] <MCA|MBA|MTECH> <csv-path> ...".into())
            }
            other => {
                let college_type = CollegeType::parse(other)
                    .ok_or_else(|| format!("Unknown college type: {}", other))?;
                let path = args.next().ok_or_else(|| format!("Missing CSV path for {}", other))?;
                imports.push((college_type, PathBuf::from(path)));
            }
        }
    }

    if imports.is_empty() {
        return Err("Nothing to import: pass <MCA|MBA|MTECH> <csv-path>".into());
    }

    Ok(Args { db, imports })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let settings = Settings::load()?;
    college_predictor::logging::init(&settings.logging);

    let args = parse_args()?;
    let db_path = args.db.unwrap_or_else(|| PathBuf::from(&settings.database.path));

    info!("Opening database at {}", db_path.display());
    let loader = CsvLoader::open(&db_path).await?;

    let mut failures = 0;
    for (college_type, path) in &args.imports {
        if !path.exists() {
            warn!("File {} not found, creating empty table for {}", path.display(), college_type);
            loader.ensure_table(*college_type).await?;
            continue;
        }

        match loader.load_file(*college_type, path).await {
            Ok(summary) => info!(
                "Loaded {} records into {} ({} rows written)",
                summary.rows_read, summary.table, summary.rows_written
            ),
            Err(e) => {
                error!("Failed to load {}: {}", path.display(), e);
                failures += 1;
            }
        }
    }

    for (college_type, count) in loader.table_counts().await? {
        match count {
            Some(count) => info!("{}: {} records", college_type.table_name(), count),
            None => info!("{}: not created", college_type.table_name()),
        }
    }

    if failures > 0 {
        return Err(format!("{} import(s) failed", failures).into());
    }

    Ok(())
}
