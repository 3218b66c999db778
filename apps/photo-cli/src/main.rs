use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::TryStreamExt;
use photo_store::{
    instance, PhotoBlob, PhotoRecord, PhotoStoreConfig, SyncOperation, EXPIRATION_DELTA_MS,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect and maintain a local photo store", long_about = None)]
struct Cli {
    /// Path to the SQLite database
    #[arg(short, long, default_value = "photo-store.db")]
    db: PathBuf,

    /// Rows fetched per cursor step during scans
    #[arg(long, default_value_t = 100)]
    page_size: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import an image file under a file name
    Import {
        /// Image file to read
        path: PathBuf,

        /// Key to store it under (defaults to the file's name)
        #[arg(short, long)]
        name: Option<String>,

        /// Days until the photo may be evicted
        #[arg(long, default_value_t = 7, value_parser = clap::value_parser!(i64).range(0..=36_500))]
        retain_days: i64,

        /// Also derive a thumbnail companion
        #[arg(long)]
        thumbnail: bool,

        /// Downscale and re-encode before storing
        #[arg(long)]
        compress: bool,

        /// Mark the photo as kept by the user
        #[arg(long)]
        keep: bool,
    },
    /// Write a stored photo's payload to disk
    Get {
        name: String,

        /// Output file (defaults to printing metadata only)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Read the thumbnail companion instead
        #[arg(long)]
        thumbnail: bool,
    },
    /// List photos whose file name starts with a prefix
    Query {
        #[arg(default_value = "")]
        prefix: String,

        /// Stream results in batches
        #[arg(long)]
        lazy: bool,
    },
    /// Delete one photo
    Delete {
        name: String,

        /// Also delete its thumbnail companion
        #[arg(long)]
        thumbnail: bool,
    },
    /// Delete every photo under a prefix
    BulkDelete { prefix: String },
    /// Evict expired photos
    Sweep {
        /// Evaluation time in epoch milliseconds (defaults to now)
        #[arg(long)]
        now: Option<i64>,

        /// Only list what would be evicted
        #[arg(long)]
        dry_run: bool,
    },
    /// List photos waiting for a sync operation
    Pending {
        #[arg(default_value = "insert")]
        operation: SyncOperation,
    },
    /// Record the outcome of a sync pass
    Mark {
        name: String,

        /// Next declared operation
        operation: SyncOperation,

        /// Whether the remote now holds a copy
        #[arg(long)]
        on_s3: bool,
    },
    /// Count photos per sync operation
    Summary,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();

    let cli = Cli::parse();

    let config = PhotoStoreConfig {
        db_path: cli.db.clone(),
        cursor_page_size: cli.page_size,
        ..Default::default()
    };
    let store = instance::init(config)
        .await
        .with_context(|| format!("Failed to open photo store at {}", cli.db.display()))?;

    match cli.command {
        Commands::Import {
            path,
            name,
            retain_days,
            thumbnail,
            compress,
            keep,
        } => {
            let file_name = match name {
                Some(name) => name,
                None => path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(str::to_string)
                    .context("Cannot derive a file name from the path")?,
            };
            let mime = mime_guess::from_path(&path)
                .first_or_octet_stream()
                .to_string();
            let expiration_date =
                expiration_after(chrono::Utc::now().timestamp_millis(), retain_days)?;

            let record = PhotoRecord::new(
                file_name.as_str(),
                PhotoBlob::from_file(&path, mime),
                expiration_date,
            )
            .stored_by_user(keep);

            match (compress, thumbnail) {
                (true, true) => {
                    store
                        .thumbnails()
                        .insert_compressed_with_thumbnail(&record)
                        .await?
                }
                (true, false) => store.insert_compressed(&record).await?,
                (false, true) => store.thumbnails().insert_with_thumbnail(&record).await?,
                (false, false) => {
                    store.insert(&record).await?;
                }
            }
            info!("Imported {} as {}", path.display(), file_name);
            println!("{file_name}");
        }
        Commands::Get {
            name,
            out,
            thumbnail,
        } => {
            let record = if thumbnail {
                store.thumbnails().get_thumbnail(&name).await?
            } else {
                store.get_by_file_name(&name).await?
            };
            let record = record.with_context(|| format!("No photo named {name}"))?;

            match out {
                Some(out) => {
                    let bytes = record.payload.read_all().await?;
                    tokio::fs::write(&out, &bytes)
                        .await
                        .with_context(|| format!("Failed to write {}", out.display()))?;
                    println!("Wrote {} bytes to {}", bytes.len(), out.display());
                }
                None => println!("{}", serde_json::to_string_pretty(&record.summary())?),
            }
        }
        Commands::Query { prefix, lazy } => {
            if lazy {
                let mut batches = store.query_prefix_lazy(&prefix);
                let mut index = 0;
                while let Some(batch) = batches.try_next().await? {
                    println!("# batch {} ({} photos)", index, batch.len());
                    for record in &batch {
                        println!("{}", serde_json::to_string(&record.summary())?);
                    }
                    index += 1;
                }
            } else {
                for record in store.query_prefix(&prefix).await? {
                    println!("{}", serde_json::to_string(&record.summary())?);
                }
            }
        }
        Commands::Delete { name, thumbnail } => {
            if thumbnail {
                store.thumbnails().delete_with_thumbnail(&name).await?;
                println!("Deleted {name} and its thumbnail");
            } else if store.delete_by_file_name(&name).await? {
                println!("Deleted {name}");
            } else {
                println!("No photo named {name}");
            }
        }
        Commands::BulkDelete { prefix } => {
            let deleted = store.reaper().bulk_delete_by_prefix(&prefix).await?;
            println!("Deleted {deleted} photos");
        }
        Commands::Sweep { now, dry_run } => {
            let now = now.unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
            if dry_run {
                for name in store.reaper().expired_file_names(now).await? {
                    println!("{name}");
                }
            } else {
                let deleted = store.reaper().sweep_expired(now).await?;
                println!("Evicted {deleted} photos");
            }
        }
        Commands::Pending { operation } => {
            for record in store.sync().pending(operation).await? {
                println!("{}", serde_json::to_string(&record.summary())?);
            }
        }
        Commands::Mark {
            name,
            operation,
            on_s3,
        } => {
            if !store.sync().record_outcome(&name, on_s3, operation).await? {
                anyhow::bail!("No photo named {name}");
            }
            println!("{name}: on_s3={on_s3}, next={operation}");
        }
        Commands::Summary => {
            let counts = store.sync().summary().await?;
            let total = store.count().await?;
            let json = serde_json::json!({
                "total": total,
                "insert": counts.get(&SyncOperation::Insert).copied().unwrap_or(0),
                "delete": counts.get(&SyncOperation::Delete).copied().unwrap_or(0),
                "stay": counts.get(&SyncOperation::Stay).copied().unwrap_or(0),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(())
}

/// Expiration timestamp `retain_days` days (of `EXPIRATION_DELTA_MS` each) after `now`
fn expiration_after(now: i64, retain_days: i64) -> Result<i64> {
    retain_days
        .checked_mul(EXPIRATION_DELTA_MS)
        .and_then(|retention| now.checked_add(retention))
        .with_context(|| format!("Retention of {retain_days} days is out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiration_after_adds_whole_days() {
        assert_eq!(expiration_after(1_000, 0).unwrap(), 1_000);
        assert_eq!(expiration_after(1_000, 2).unwrap(), 1_000 + 2 * EXPIRATION_DELTA_MS);
    }

    #[test]
    fn test_expiration_after_rejects_overflow() {
        assert!(expiration_after(0, i64::MAX).is_err());
        assert!(expiration_after(i64::MAX - 1, 1).is_err());
    }

    #[test]
    fn test_retain_days_is_bounded() {
        let parsed =
            Cli::try_parse_from(["photo-cli", "import", "a.jpg", "--retain-days", "1000000"]);
        assert!(parsed.is_err());

        let parsed =
            Cli::try_parse_from(["photo-cli", "import", "a.jpg", "--retain-days", "30"]).unwrap();
        assert!(matches!(parsed.command, Commands::Import { retain_days: 30, .. }));
    }
}
