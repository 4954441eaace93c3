use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use xfn::commands::{functions, run};
use xfn::GlobalOpts;

#[derive(Parser)]
#[command(name = "xfn")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Manifest-driven dispatcher for external function scripts",
    long_about = "xfn builds a dynamic input form from a function manifest, marshals \
parameters and binary attachments to external scripts and decodes their results."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available functions and their dynamic form
    Functions(functions::FunctionsArgs),

    /// Run a function over a batch of items
    Run(run::RunArgs),
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.global);

    let result = match cli.command {
        Commands::Functions(args) => functions::handle_functions(args),
        Commands::Run(args) => run::handle_run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_logging(global: &GlobalOpts) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| global.env_filter_directive().into()),
        )
        .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}
