use clap::Args;
use rifa_core::PaymentStatus;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Show only this raffle (id or slug).
    pub raffle: Option<String>,
}

pub fn run(config_path: &str, args: &StatusArgs) -> anyhow::Result<()> {
    let workspace = super::open(config_path)?;
    let engine = &workspace.engine;

    let raffles = match &args.raffle {
        Some(reference) => {
            let id = super::resolve_raffle(&workspace, reference)?;
            vec![engine.catalog.get(id)?]
        }
        None => engine.catalog.list(),
    };

    if raffles.is_empty() {
        println!("no raffles");
        return Ok(());
    }

    for raffle in raffles {
        let available = engine.inventory.available_count(raffle.id);
        let payments = engine.ledger.payments_for_raffle(raffle.id);
        let pending = payments
            .iter()
            .filter(|p| p.status == PaymentStatus::Pending)
            .count();

        println!(
            "{} [{}] {} — sold {}/{}, available {}, pending payments {}",
            raffle.id,
            raffle.status,
            raffle.title,
            raffle.tickets_sold,
            raffle.total_tickets,
            available,
            pending
        );
        for draw in engine.draws.draws_for_raffle(raffle.id) {
            match draw.winning_number {
                Some(number) => println!("  draw {} [{}] winner: {}", draw.id, draw.status, number),
                None => println!("  draw {} [{}]", draw.id, draw.status),
            }
        }
    }
    Ok(())
}
