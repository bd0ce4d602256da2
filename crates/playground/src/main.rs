mod bootstrap;
mod cli;
mod host;
mod paths;
mod run;
mod script;

use anyhow::Result;

fn main() -> Result<()> {
    let args = cli::parse();
    run::run(args)
}
