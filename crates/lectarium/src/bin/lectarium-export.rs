use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

use clap::Parser;
use lectarium::{Config, Error, ExportArgs};
use tracing::error;

fn main() -> ExitCode {
    let args = ExportArgs::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(1);
        }
    };
    lectarium::tracing::init_with_filter(&config.log_filter);

    match export(&args, &config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, client = e.is_client_error(), "export failed");
            eprintln!("error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn export(args: &ExportArgs, config: &Config) -> Result<usize, Error> {
    let out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };
    lectarium::run(args, config, out)
}
