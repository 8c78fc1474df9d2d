use chrono::Utc;
use clap::Args;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Args, Debug)]
pub struct DrawArgs {
    /// Raffle id or slug (must be closed).
    pub raffle: String,

    /// Seed for the random source; defaults to OS entropy.
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn run(config_path: &str, args: &DrawArgs) -> anyhow::Result<()> {
    let workspace = super::open(config_path)?;
    let raffle_id = super::resolve_raffle(&workspace, &args.raffle)?;
    let engine = &workspace.engine;

    engine.orchestrator.verify_integrity(raffle_id)?;

    let draw = engine.draws.schedule(raffle_id, Utc::now())?;
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let realized = engine.draws.execute(draw.id, &mut rng)?;

    super::persist(&workspace)?;

    let winning_ticket = realized
        .winning_ticket
        .and_then(|id| engine.inventory.ticket(raffle_id, id));
    let winner = winning_ticket
        .as_ref()
        .and_then(|t| t.participant_id)
        .and_then(|id| engine.registry.get(id).ok());

    match (realized.winning_number, winner) {
        (Some(number), Some(participant)) => {
            println!("winning number: {number} — {}", participant.name);
        }
        (Some(number), None) => println!("winning number: {number}"),
        _ => println!("draw {} realized", realized.id),
    }
    Ok(())
}
