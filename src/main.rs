use std::io;

use anyhow::Result;
use env_logger::Env;
use pktstat::cli::Cli;
use pktstat::{Config, Interrupts, LineInput, Menu, PcapBackend};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();
    env_logger::Builder::from_env(Env::default().default_filter_or(cli.log_level())).init();

    let config = Config::from(&cli);
    log::debug!("Starting with {:?}", config);

    let interrupts = Interrupts::new();
    interrupts.listen_for_ctrl_c();

    let input = LineInput::spawn(io::BufReader::new(io::stdin()));
    let mut menu =
        Menu::new(&PcapBackend, &config, input, io::stdout()).with_interrupts(&interrupts);
    menu.run().await?;
    Ok(())
}
