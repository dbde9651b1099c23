use clap::Parser;
use cli::{Args, Commands};
use commands::{create_client, exec_operation, exec_raw, render_operation, write_default_config};
use error::CliResult;
use logging::setup_logging;
use quill_config::set_config_path;

mod cli;
mod commands;
mod error;
mod logging;
mod operation;
mod utils;

fn handle_cli() -> CliResult<()> {
    let args = Args::parse();

    setup_logging(&args);

    if args.no_color {
        utils::set_color(false);
    }

    if let Some(path) = &args.config {
        set_config_path(path);
    }

    match &args.command {
        Commands::Render {
            file,
            kind,
            name,
        } => render_operation(file, *kind, name.clone())?,
        Commands::Exec {
            file,
            kind,
            name,
        } => {
            let client = create_client(&args)?;
            exec_operation(&client, file, *kind, name.clone())?;
        }
        Commands::Raw {
            document,
            variables,
        } => {
            let client = create_client(&args)?;
            exec_raw(&client, document, variables.as_deref())?;
        }
        Commands::DefConfig => write_default_config()?,
    }

    Ok(())
}

fn main() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    if let Err(err) = handle_cli() {
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(1);
    }
}
