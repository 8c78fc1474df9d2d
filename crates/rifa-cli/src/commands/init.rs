use anyhow::Context;
use clap::Args;
use rifa_core::EngineConfig;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Data directory for the store.
    #[arg(long, default_value = "./data")]
    pub data_dir: String,

    /// Reservation TTL in seconds.
    #[arg(long, default_value_t = 300)]
    pub reservation_ttl: u64,

    /// Overwrite an existing configuration file.
    #[arg(long)]
    pub force: bool,
}

pub fn run(config_path: &str, args: &InitArgs) -> anyhow::Result<()> {
    if std::path::Path::new(config_path).exists() && !args.force {
        anyhow::bail!("{config_path} already exists; pass --force to overwrite");
    }

    let config = EngineConfig {
        data_dir: args.data_dir.clone(),
        reservation_ttl_secs: args.reservation_ttl,
        ..EngineConfig::default()
    };
    let rendered = toml::to_string_pretty(&config).context("could not render configuration")?;
    std::fs::write(config_path, rendered)
        .with_context(|| format!("could not write {config_path}"))?;

    println!("wrote {config_path}");
    Ok(())
}
