use std::io::IsTerminal;

use bucketsh::{
    cli::BucketshCLI, commands::CommandTable, level::Level, repl, session::Session, store::Database,
};
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use tracing::warn;

fn main() -> Result<()> {
    let cli = match BucketshCLI::try_parse() {
        Ok(cli) => cli,
        Err(err) if err.use_stderr() => {
            let _ = err.print();
            std::process::exit(1);
        }
        Err(err) => err.exit(),
    };

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .init();

    let mut db = Database::open(&cli.path, &cli.open_options())?;
    let commands = CommandTable::builtin();

    println!("Type 'help' for list of commands");

    let tx = db.begin();
    let outcome = {
        let mut session = Session::new(Level::root(&tx), &commands, cli.options());
        if std::io::stdin().is_terminal() {
            repl::run(&mut session)
        } else {
            session
                .run(std::io::stdin().lock(), std::io::stdout().lock())
                .into_diagnostic()
        }
    };

    match outcome {
        Ok(()) => tx.commit()?,
        Err(err) => {
            warn!("session failed, discarding changes");
            tx.rollback();
            return Err(err.wrap_err("Problem viewing database"));
        }
    }

    Ok(())
}
