use clap::Args;

#[derive(Args, Debug)]
pub struct CloseArgs {
    /// Raffle id or slug.
    pub raffle: String,
}

pub fn run(config_path: &str, args: &CloseArgs) -> anyhow::Result<()> {
    let workspace = super::open(config_path)?;
    let raffle_id = super::resolve_raffle(&workspace, &args.raffle)?;

    let raffle = workspace.engine.catalog.close(raffle_id)?;
    super::persist(&workspace)?;

    println!(
        "raffle {} closed with {}/{} tickets sold",
        raffle.id, raffle.tickets_sold, raffle.total_tickets
    );
    Ok(())
}
