mod cli;
mod paths;
mod run;
mod settings;
mod shaders;

use anyhow::{Context, Result};
use cli::{Command, ConfigAction, RunArgs};
use paths::AppPaths;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Config(config_cmd)) => handle_config_command(config_cmd.action, &cli.run),
        None => run::run(cli.run),
    }
}

fn handle_config_command(action: ConfigAction, args: &RunArgs) -> Result<()> {
    match action {
        ConfigAction::Where => {
            let paths = AppPaths::discover()?;
            println!("{}", paths.config_file().display());
            Ok(())
        }
        ConfigAction::Show => {
            let config = run::effective_config(args)?;
            let rendered =
                toml::to_string_pretty(&config).context("failed to encode render settings")?;
            print!("{rendered}");
            Ok(())
        }
    }
}
