use clap::Parser;
use modloader::utils::logger;
use modloader::{LoaderError, ModulePathBuilder, LIB_DIR, MODULE_SUFFIX};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "modpath")]
#[command(about = "Print the module path the launcher would build")]
struct Args {
    /// Install directory holding the library folder
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Extra entries, in platform path-list form
    #[arg(short, long)]
    extra: Option<String>,

    /// Print a JSON array of locations instead of a path list
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct Entry<'a> {
    module: &'a str,
    path: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let lib_dir = args.root.join(LIB_DIR);
    if !lib_dir.is_dir() {
        let err = LoaderError::LibDirMissing {
            path: Path::new(".").join(LIB_DIR),
        };
        eprintln!("{}", err);
        std::process::exit(err.exit_code());
    }

    let mut builder = ModulePathBuilder::new();
    let found = builder.scan_directory(&lib_dir);
    tracing::info!(
        "{} {} archives under {}",
        found,
        MODULE_SUFFIX,
        lib_dir.display()
    );

    if let Some(extra) = &args.extra {
        builder.add_from_separated_list(extra);
    }

    if args.json {
        let entries: Vec<Entry<'_>> = builder
            .as_loader_path()
            .iter()
            .map(|location| Entry {
                module: location.module_name(),
                path: location.path().to_string_lossy().into_owned(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        println!("{}", builder.render());
    }

    Ok(())
}
