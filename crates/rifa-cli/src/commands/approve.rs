use anyhow::Context;
use clap::Args;
use rifa_core::PaymentId;

#[derive(Args, Debug)]
pub struct ApproveArgs {
    /// Payment id.
    pub payment: String,

    /// External transaction id from the gateway.
    #[arg(long)]
    pub txn: Option<String>,

    /// Proof-of-payment reference.
    #[arg(long)]
    pub proof: Option<String>,
}

pub fn run(config_path: &str, args: &ApproveArgs) -> anyhow::Result<()> {
    let workspace = super::open(config_path)?;
    let payment_id = PaymentId::from_uuid(
        uuid::Uuid::parse_str(&args.payment).context("invalid payment id")?,
    );

    workspace
        .engine
        .ledger
        .approve(payment_id, args.txn.clone(), args.proof.clone())?;
    let settled = workspace.engine.orchestrator.on_payment_approved(payment_id);

    // Persist either outcome — a forced rejection is state too.
    super::persist(&workspace)?;
    let payment = settled?;

    println!("payment {} is {}", payment.id, payment.status);
    Ok(())
}
