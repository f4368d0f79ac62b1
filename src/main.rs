use anyhow::Result;
use argh::FromArgs;
use dmsh::cache::keys;
use dmsh::campaign::{CampaignDate, CampaignStore, TomlStore};
use dmsh::config::Config;
use dmsh::console::SharedConsole;
use dmsh::croaker::CroakerClient;
use dmsh::{builtin, Cache, RustylineConsole, Services, Session, Shell};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

#[derive(FromArgs)]
/// interactive shell for running a tabletop campaign.
struct Cli {
    #[argh(option)]
    /// config file to read instead of ~/.dnd/dmsh.toml.
    config: Option<PathBuf>,

    #[argh(option)]
    /// directory holding campaign saves.
    data_path: Option<PathBuf>,

    #[argh(option)]
    /// name of the campaign to load.
    campaign: Option<String>,

    #[argh(option)]
    /// date a new campaign starts on, e.g. 2.1125.5.25.
    start_date: Option<CampaignDate>,

    #[argh(option)]
    /// host of the croaker music server.
    croaker_host: Option<String>,

    #[argh(option)]
    /// port of the croaker music server.
    croaker_port: Option<u16>,

    #[argh(positional, greedy)]
    /// command to run before the first prompt.
    command: Vec<String>,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.data_path {
            config.data_path = path.clone();
        }
        if let Some(name) = &self.campaign {
            config.campaign_name = name.clone();
        }
        if let Some(date) = self.start_date {
            config.campaign_start_date = date;
        }
        if let Some(host) = &self.croaker_host {
            config.croaker.host = host.clone();
        }
        if let Some(port) = self.croaker_port {
            config.croaker.port = port;
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli: Cli = argh::from_env();
    let mut config = Config::load_or_default(cli.config.as_deref())?;
    cli.apply(&mut config);

    let data_dir = config.data_dir();
    let store = TomlStore;
    let campaign = store.load(&data_dir, &config.campaign_name, config.campaign_start_date)?;
    log::info!(
        "Starting dmsh: campaign {} on {} ({})",
        campaign.name,
        campaign.date,
        data_dir.display()
    );

    let cache = Cache::new();
    cache.set(keys::DATA_PATH, data_dir);
    campaign.store_in(&cache);

    let console: SharedConsole = Rc::new(RefCell::new(RustylineConsole::new()?));
    let services = Services {
        croaker: CroakerClient::new(config.croaker.host.clone(), config.croaker.port),
        store: Box::new(store),
    };
    let mut shell = Shell::root(Session::new(builtin::registry(), console, services), cache);

    let initial = (!cli.command.is_empty()).then(|| cli.command.join(" "));
    shell.start(initial)?;
    Ok(())
}
