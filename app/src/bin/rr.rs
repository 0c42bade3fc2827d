use std::path::PathBuf;

use anyhow::Result;
use structopt::StructOpt;

use infra::documents::HasMeta;
use rustaurant::catalog::{Canonical, Critique, Customer, ListAll, Menu, Register};
use rustaurant::config::Settings;
use rustaurant::restaurants::ListRestaurants;
use rustaurant::services::{Commandable, Queryable};

#[derive(Debug, StructOpt)]
#[structopt(name = "rr", about = "Rustaurant CLI")]
struct Opt {
    /// TOML config file; the environment is read when absent
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,
    #[structopt(subcommand)]
    command: Commands,
}

#[derive(Debug, StructOpt)]
enum Commands {
    #[structopt(name = "setup", about = "Initialize")]
    Setup,
    #[structopt(name = "add-menu", about = "Register a menu")]
    AddMenu { name: String },
    #[structopt(name = "add-customer", about = "Register a customer")]
    AddCustomer { name: String },
    #[structopt(name = "add-critique", about = "Register a critique")]
    AddCritique { name: String },
    #[structopt(name = "show-menus", about = "Show registered menus")]
    ShowMenus,
    #[structopt(name = "show-customers", about = "Show registered customers")]
    ShowCustomers,
    #[structopt(name = "show-critiques", about = "Show registered critiques")]
    ShowCritiques,
    #[structopt(name = "show-restaurants", about = "Show restaurants")]
    ShowRestaurants,
}

fn main() -> Result<()> {
    let opt = Opt::from_args();
    let settings = Settings::load(opt.config.as_deref())?;
    settings.init_logging();

    let config = settings.rustaurant;
    let rr = rustaurant::Rustaurant::new(config.build()?, config.auth(), config.customer_match);

    match opt.command {
        Commands::Setup => {
            rr.setup()?;
        }
        Commands::AddMenu { name } => {
            let id = rr.catalog().execute(Register::<Menu>::named(&name))?;
            println!("{}: {}", id, name);
        }
        Commands::AddCustomer { name } => {
            let id = rr.catalog().execute(Register::<Customer>::named(&name))?;
            println!("{}: {}", id, name);
        }
        Commands::AddCritique { name } => {
            let id = rr.catalog().execute(Register::<Critique>::named(&name))?;
            println!("{}: {}", id, name);
        }
        Commands::ShowMenus => show(rr.catalog().query(ListAll::<Menu>::new())?),
        Commands::ShowCustomers => show(rr.catalog().query(ListAll::<Customer>::new())?),
        Commands::ShowCritiques => show(rr.catalog().query(ListAll::<Critique>::new())?),
        Commands::ShowRestaurants => {
            let list = rr.restaurants().query(ListRestaurants)?;
            for restaurant in list {
                println!(
                    "{}: {} ({} overview entries)",
                    restaurant.meta().id,
                    restaurant.name,
                    restaurant.overview.len()
                );
            }
        }
    }

    Ok(())
}

fn show<T: Canonical>(records: Vec<T>) {
    for record in records {
        println!("{}: {}", record.meta().id, record.name());
    }
}
