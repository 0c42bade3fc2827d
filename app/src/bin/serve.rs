use std::net::SocketAddr;
use std::path::PathBuf;

use actix_web::{middleware::Logger, App, HttpServer};
use anyhow::{Context, Result};
use log::*;
use structopt::StructOpt;

use infra::persistence::DocumentConnectionManager;
use rustaurant::config::Settings;
use rustaurant::Rustaurant;

#[derive(Debug, StructOpt)]
#[structopt(name = "serve", about = "Serve Rustaurant.")]
struct Opt {
    /// TOML config file; the environment is read when absent
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let opt = Opt::from_args();
    let settings = Settings::load(opt.config.as_deref())?;
    settings.init_logging();
    debug!("Options: {:?}", opt);

    let config = settings.rustaurant;
    let app = Rustaurant::new(config.build()?, config.auth(), config.customer_match);
    app.setup()?;

    actix_web::rt::System::new().block_on(serve(app, config.listen_addr))
}

async fn serve(app: Rustaurant<DocumentConnectionManager>, addr: SocketAddr) -> Result<()> {
    let srv = HttpServer::new(move || {
        let app = app.clone();
        App::new()
            .wrap(Logger::default())
            .wrap(rustaurant::cors())
            .configure(move |cfg| app.configure(cfg))
    })
    .bind(addr)
    .context("bind")?;
    info!("Listening on: {:?}", srv.addrs());

    srv.run().await?;
    Ok(())
}
