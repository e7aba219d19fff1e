use modloader::utils::logger;
use modloader::{Dispatcher, Environment, LoaderConfig};

fn print_version(_args: &[String]) -> anyhow::Result<()> {
    println!("modloader {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}

modloader::export_symbol!(name = "modloader.Version", main = print_version);

fn main() {
    let config = LoaderConfig::from_env();

    if config.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }
    tracing::debug!("Loader config: {:?}", config);

    // Everything after the program name belongs to the application.
    let args: Vec<String> = std::env::args_os()
        .skip(1)
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();

    let working_dir = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            println!("Cannot determine the working directory: {}", e);
            std::process::exit(1);
        }
    };

    let mut env = Environment::from_process();

    let dispatcher = Dispatcher::new(config, working_dir);
    let report = dispatcher.run(&mut env, &args);

    if let Some(message) = &report.message {
        println!("{}", message);
    }
    std::process::exit(report.exit_code);
}
