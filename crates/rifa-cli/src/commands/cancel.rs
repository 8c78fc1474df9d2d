use anyhow::Context;
use clap::Args;
use rifa_core::PaymentId;

#[derive(Args, Debug)]
pub struct CancelArgs {
    /// Payment id of the open purchase.
    pub payment: String,
}

pub fn run(config_path: &str, args: &CancelArgs) -> anyhow::Result<()> {
    let workspace = super::open(config_path)?;
    let payment_id = PaymentId::from_uuid(
        uuid::Uuid::parse_str(&args.payment).context("invalid payment id")?,
    );

    let payment = workspace.engine.orchestrator.cancel_purchase(payment_id)?;
    super::persist(&workspace)?;

    println!("payment {} is {}", payment.id, payment.status);
    Ok(())
}
