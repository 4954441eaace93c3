//! `xfn functions` - list the registry and its dynamic form

use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use xfn_manifest::{FunctionRegistry, ManifestError};
use xfn_runner::FormRegistry;

use crate::commands::build_dispatcher_config;
use crate::config::XfnConfig;

#[derive(Args, Debug)]
pub struct FunctionsArgs {
    /// Functions root directory (contains functions.json)
    #[arg(long)]
    pub root: Option<PathBuf>,
}

pub fn handle_functions(args: FunctionsArgs) -> anyhow::Result<()> {
    let config = XfnConfig::load()?;
    let dispatcher_config = build_dispatcher_config(&config, args.root, None, None);

    let registry = match FunctionRegistry::load_from_path(&dispatcher_config.manifest_path) {
        Ok(registry) => registry,
        Err(ManifestError::Missing { path }) => {
            println!("No functions available (no manifest at {}).", path.display());
            println!("Point --root at a directory containing functions.json.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if registry.is_empty() {
        println!("The manifest declares no functions.");
        return Ok(());
    }

    let mut form = FormRegistry::new();
    form.build(
        &dispatcher_config.manifest_path,
        &dispatcher_config.functions_root,
    );

    println!("Available functions:\n");
    for entry in registry.functions() {
        let parameters = form.visible_for(&entry.value);
        println!(
            "{} ({}) - {} parameters",
            entry.name.bold(),
            entry.value,
            parameters.len()
        );
        for property in parameters {
            println!(
                "  - {} [{}]",
                property.descriptor.name, property.descriptor.param_type
            );
        }
    }

    println!("\nRun a function with:\n  xfn run <function-id> --input items.json");
    Ok(())
}
