use clap::{Parser, Subcommand};
use verdant_store::migrate;
use verdant_store::store::{self, Backend, FlatStore, IndexedStore};
use verdant_store::GardenStore;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "data")]
    data_dir: String,

    /// Operate on the legacy flat blob backend instead of the indexed store.
    #[arg(long)]
    flat: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Clone)]
enum Commands {
    /// Print a collection as pretty JSON (areas, plants, seedlings, events).
    Dump { collection: String },
    /// Print the resolved settings singleton.
    Settings,
    /// Run the flat-to-indexed migration and print its report.
    Migrate,
    /// Wipe every collection and the settings singleton.
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let backend = if cli.flat { Backend::Flat } else { Backend::Indexed };

    match cli.command {
        Commands::Migrate => {
            let flat = FlatStore::open(&cli.data_dir)?;
            let indexed = IndexedStore::new(&cli.data_dir);
            indexed.ready().await?;
            let report = migrate::migrate(&flat, &indexed).await?;
            if report.skipped {
                println!("Migration already completed; nothing to do.");
            } else {
                println!(
                    "Migrated {} areas, {} plants, {} seedlings, {} events.",
                    report.areas, report.plants, report.seedlings, report.events
                );
            }
        }
        Commands::Dump { collection } => {
            let store = store::open(&cli.data_dir, backend).await?;
            match collection.as_str() {
                "areas" => {
                    println!("{}", serde_json::to_string_pretty(&store.get_areas().await?)?)
                }
                "plants" | "customPlants" => {
                    println!("{}", serde_json::to_string_pretty(&store.get_plants().await?)?)
                }
                "seedlings" => {
                    println!("{}", serde_json::to_string_pretty(&store.get_seedlings().await?)?)
                }
                "events" => {
                    println!("{}", serde_json::to_string_pretty(&store.get_events().await?)?)
                }
                other => anyhow::bail!("unknown collection: {}", other),
            }
        }
        Commands::Settings => {
            let store = store::open(&cli.data_dir, backend).await?;
            println!("{}", serde_json::to_string_pretty(&store.get_settings().await?)?);
        }
        Commands::Clear => {
            let store = store::open(&cli.data_dir, backend).await?;
            store.clear_all().await?;
            println!("OK");
        }
    }

    Ok(())
}
