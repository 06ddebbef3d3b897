use angular_change_detection::{ChangeDetectorDefinition, ChangeDetectorJitGenerator};
use anyhow::Context;
use clap::{Arg, ArgAction, Command};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let matches = Command::new("ngcd")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Angular Change Detector Generator")
        .arg(
            Arg::new("definitions")
                .value_name("FILE")
                .help("Change detector definition JSON files")
                .required(true)
                .num_args(1..),
        )
        .arg(
            Arg::new("out-dir")
                .short('o')
                .long("out-dir")
                .value_name("DIR")
                .help("Write one <type name>.js file per definition instead of printing"),
        )
        .arg(
            Arg::new("check")
                .long("check")
                .action(ArgAction::SetTrue)
                .help("Only validate the definitions"),
        )
        .get_matches();

    let definitions: Vec<PathBuf> = matches
        .get_many::<String>("definitions")
        .map(|paths| paths.map(PathBuf::from).collect())
        .unwrap_or_default();
    let out_dir = matches.get_one::<String>("out-dir").map(PathBuf::from);
    let check_only = matches.get_flag("check");

    let results: Vec<(PathBuf, anyhow::Result<(String, String)>)> = definitions
        .par_iter()
        .map(|path| (path.clone(), generate(path)))
        .collect();

    let mut failed = false;
    for (path, result) in results {
        match result {
            Ok((type_name, source)) => {
                if check_only {
                    println!("{}: ok ({})", path.display(), type_name);
                } else if let Err(e) = emit(out_dir.as_deref(), &type_name, &source) {
                    eprintln!("Error: {}: {:#}", path.display(), e);
                    failed = true;
                }
            }
            Err(e) => {
                eprintln!("Error: {}: {:#}", path.display(), e);
                failed = true;
            }
        }
    }

    if failed {
        process::exit(1);
    }
}

fn generate(path: &Path) -> anyhow::Result<(String, String)> {
    let definition = ChangeDetectorDefinition::load(path)
        .with_context(|| format!("Failed to load definition {}", path.display()))?;
    // Runtime values in the error are not `Send`, so only its message crosses threads.
    let program = ChangeDetectorJitGenerator::new(&definition)
        .generate()
        .map_err(|e| anyhow::anyhow!("Failed to generate change detector '{}': {}", definition.id, e))?;
    Ok((program.type_name.clone(), program.source()))
}

fn emit(out_dir: Option<&Path>, type_name: &str, source: &str) -> anyhow::Result<()> {
    match out_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            let file = dir.join(format!("{}.js", type_name));
            std::fs::write(&file, source).with_context(|| format!("Failed to write {}", file.display()))?;
            println!("Change detector written to {:?}", file);
        }
        None => println!("{}\n", source),
    }
    Ok(())
}
