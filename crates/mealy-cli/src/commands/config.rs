use clap::Subcommand;
use mealy_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the config file as TOML
    Show {
        /// Only this table: remote, poller, schedule or session
        section: Option<String>,
    },
    /// Print one value
    Get {
        /// Dotted key, e.g. "poller.reconcile_interval_secs"
        key: String,
    },
    /// Change one value; the whole file is validated before it is written
    Set {
        /// Dotted key
        key: String,
        value: String,
    },
    /// Print where the config file lives
    Path,
    /// Overwrite the config file with defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show { section } => {
            let config = toml::Value::try_from(Config::load()?)?;
            let shown = match section.as_deref() {
                None => &config,
                Some(name) => config
                    .get(name)
                    .filter(|v| v.is_table())
                    .ok_or_else(|| format!("no such section: {name}"))?,
            };
            print!("{}", toml::to_string_pretty(shown)?);
        }
        ConfigAction::Get { key } => {
            let value = Config::load()?
                .get(&key)
                .ok_or_else(|| format!("unknown key: {key}"))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            // Echo the stored form ("015" is stored as 15).
            println!("{key} = {}", config.get(&key).unwrap_or(value));
        }
        ConfigAction::Path => {
            println!("{}", Config::path()?.display());
        }
        ConfigAction::Reset => {
            Config::default().save()?;
            eprintln!("wrote defaults to {}", Config::path()?.display());
        }
    }
    Ok(())
}
