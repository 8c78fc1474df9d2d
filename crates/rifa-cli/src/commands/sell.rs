use clap::{Args, ValueEnum};
use rifa_core::PaymentMethod;
use rifa_engine::{ParticipantDraft, TicketSelection};

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Method {
    Cash,
    Card,
    Pix,
    Transfer,
}

impl From<Method> for PaymentMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Cash => PaymentMethod::Cash,
            Method::Card => PaymentMethod::Card,
            Method::Pix => PaymentMethod::Pix,
            Method::Transfer => PaymentMethod::Transfer,
        }
    }
}

#[derive(Args, Debug)]
pub struct SellArgs {
    /// Raffle id or slug.
    pub raffle: String,

    /// Buyer name.
    #[arg(long)]
    pub name: String,

    /// Buyer contact (phone or e-mail).
    #[arg(long)]
    pub contact: String,

    /// Buyer identity document.
    #[arg(long)]
    pub document: Option<String>,

    /// How many tickets to reserve (any numbers).
    #[arg(long, conflicts_with = "numbers")]
    pub quantity: Option<usize>,

    /// Specific ticket numbers to reserve.
    #[arg(long, value_delimiter = ',', conflicts_with = "quantity")]
    pub numbers: Option<Vec<u32>>,

    /// Payment method.
    #[arg(long, value_enum, default_value_t = Method::Pix)]
    pub method: Method,
}

pub fn run(config_path: &str, args: &SellArgs) -> anyhow::Result<()> {
    let workspace = super::open(config_path)?;
    let raffle_id = super::resolve_raffle(&workspace, &args.raffle)?;

    let selection = match (&args.quantity, &args.numbers) {
        (Some(quantity), None) => TicketSelection::Quantity(*quantity),
        (None, Some(numbers)) => TicketSelection::Numbers(numbers.clone()),
        _ => anyhow::bail!("pass exactly one of --quantity or --numbers"),
    };

    let receipt = workspace.engine.orchestrator.start_purchase(
        raffle_id,
        ParticipantDraft {
            name: args.name.clone(),
            contact: args.contact.clone(),
            document: args.document.clone(),
        },
        &selection,
        args.method.into(),
    )?;

    super::persist(&workspace)?;
    println!(
        "payment {} pending: tickets {:?} for {} (reservation expires {})",
        receipt.payment.id, receipt.ticket_numbers, receipt.payment.amount, receipt.reserved_until
    );
    Ok(())
}
