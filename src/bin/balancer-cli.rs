use clap::{Parser, Subcommand};
use sdk_rust::client::{AdminClient, Error};

#[derive(Parser)]
#[command(name = "balancer-cli")]
#[command(about = "Management CLI for the reverse-balancer admin API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show pool members, liveness and connections
    Status,
    /// Add a backend to the pool
    Add {
        /// Backend URL, e.g. http://localhost:9001
        backend: String,
    },
    /// Remove a backend from the pool
    Remove {
        /// Backend URL, exactly as added
        backend: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let cli = Cli::parse();
    let client = AdminClient::new(&cli.url);

    match cli.command {
        Commands::Status => {
            let status = client.status().await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Commands::Add { backend } => {
            client.add_backend(&backend).await?;
            println!("Added {}", backend);
        }
        Commands::Remove { backend } => {
            if client.remove_backend(&backend).await? {
                println!("Removed {}", backend);
            } else {
                eprintln!("Error: backend {} not found", backend);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
