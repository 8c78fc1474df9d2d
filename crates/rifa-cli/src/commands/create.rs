use chrono::{DateTime, Duration, Utc};
use clap::Args;
use rifa_core::Amount;
use rifa_engine::RaffleDefinition;

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Raffle title.
    #[arg(long)]
    pub title: String,

    /// Unique URL slug.
    #[arg(long)]
    pub slug: Option<String>,

    /// Ticket price in centavos.
    #[arg(long)]
    pub price: u64,

    /// Number of tickets in the pool.
    #[arg(long)]
    pub tickets: u32,

    /// End of the sale window (RFC 3339); defaults to 30 days from now.
    #[arg(long)]
    pub sale_ends_at: Option<DateTime<Utc>>,

    /// Payment destination identifier (e.g. a PIX key).
    #[arg(long)]
    pub payout_key: String,
}

pub fn run(config_path: &str, args: &CreateArgs) -> anyhow::Result<()> {
    let workspace = super::open(config_path)?;
    let engine = &workspace.engine;

    let now = Utc::now();
    let raffle = engine.catalog.create(RaffleDefinition {
        title: args.title.clone(),
        slug: args.slug.clone(),
        ticket_price: Amount::from_centavos(args.price),
        total_tickets: args.tickets,
        sale_starts_at: now,
        sale_ends_at: args.sale_ends_at.unwrap_or(now + Duration::days(30)),
        payout_key: args.payout_key.clone(),
    })?;
    let count = engine
        .inventory
        .initialize(raffle.id, raffle.total_tickets, raffle.ticket_price)?;

    super::persist(&workspace)?;
    println!(
        "created raffle {} ({} tickets at {})",
        raffle.id, count, raffle.ticket_price
    );
    Ok(())
}
