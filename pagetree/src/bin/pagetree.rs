//! CLI for pagetree: serve an app directory or print its route tree.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pagetree::{init_logging, Application, ListenAddr};

#[derive(Parser)]
#[command(name = "pagetree")]
#[command(about = "Serve file-routed pages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the route tree and serve it until ctrl-c.
    Serve {
        /// Config file (default: pagetree.config.json)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Overrides HOST
        #[arg(long)]
        host: Option<String>,
        /// Overrides PORT
        #[arg(long)]
        port: Option<u16>,
        /// Directories under the app root served as static files
        #[arg(long = "static", value_name = "DIR")]
        static_dirs: Vec<String>,
    },
    /// Print the route tree built from the routes directory.
    Routes {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_logging();
    match Cli::parse().command {
        Commands::Serve {
            config,
            host,
            port,
            static_dirs,
        } => {
            let mut app = Application::from_config(config.as_deref());
            for dir in &static_dirs {
                app.add_static_files(dir);
            }
            let router = app.build()?;
            let addr = ListenAddr::from_env().with_overrides(host, port);
            router.serve(&addr)
        }
        Commands::Routes { config } => {
            let router = Application::from_config(config.as_deref()).build()?;
            println!("{}", router.tree());
            Ok(())
        }
    }
}
