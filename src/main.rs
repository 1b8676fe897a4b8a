use error_stack::{Result, ResultExt};
use std::process;
use thiserror::Error;

use verifix::{config::Config, reconcile, App};

#[derive(Debug, Error)]
#[error("verifix did not complete")]
struct StartError;

fn main() {
    if let Err(error) = start() {
        eprintln!("{error:?}");
        process::exit(1);
    }
}

fn start() -> Result<(), StartError> {
    let config = Config::load().change_context(StartError)?;
    verifix::logging::init(&config.logging).change_context(StartError)?;

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .change_context(StartError)
        .attach_printable("could not build tokio runtime")?
        .block_on(run(config))
}

async fn run(config: Config) -> Result<(), StartError> {
    let app = App::new(config).await.change_context(StartError)?;
    let mut store = app.user_store().await.change_context(StartError)?;

    let result = reconcile::run(&mut store).await;
    drop(store);
    app.db.close().await;

    let summary = result.change_context(StartError)?;
    summary.log();

    Ok(())
}
