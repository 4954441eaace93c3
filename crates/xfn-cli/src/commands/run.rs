//! `xfn run` - execute one function over a batch of items

use anyhow::Context;
use clap::Args;
use std::path::PathBuf;
use tracing::debug;

use xfn_runner::Dispatcher;

use crate::commands::build_dispatcher_config;
use crate::config::XfnConfig;
use crate::json_host::JsonHost;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Function id to run (the manifest entry's `value`)
    pub function: String,

    /// Items file (JSON: parameters and base64 binary attachments per item)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Functions root directory (contains functions.json)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Script timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Interpreter to run scripts with (e.g. python3); scripts are
    /// executed directly when unset
    #[arg(long)]
    pub interpreter: Option<String>,

    /// Write output records to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn handle_run(args: RunArgs) -> anyhow::Result<()> {
    let config = XfnConfig::load()?;
    let dispatcher_config =
        build_dispatcher_config(&config, args.root, args.timeout, args.interpreter);

    let host = JsonHost::load_from_path(&args.input)?;

    let mut dispatcher = Dispatcher::new(dispatcher_config);
    let registered = dispatcher.initialize();
    debug!("Form initialized with {registered} properties");

    let records = dispatcher
        .run(&args.function, &host)
        .with_context(|| format!("batch aborted while running '{}'", args.function))?;

    let serialized = serde_json::to_string_pretty(&records)?;
    match args.output {
        Some(path) => std::fs::write(&path, serialized)
            .with_context(|| format!("cannot write output to {}", path.display()))?,
        None => println!("{serialized}"),
    }

    Ok(())
}
