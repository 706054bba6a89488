// ============================================================================
// Basic Usage Example
// ============================================================================
//
// Run with: cargo run --example basic_usage --features logging
// Set RUST_LOG=compact_money=debug to see registry activity.

use compact_money::prelude::*;
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), MoneyError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Compact Money Example ===\n");

    let usd = CurrencyCode::new("USD")?;
    let mga = CurrencyCode::new("MGA")?;
    println!("USD encodes to {:#06x}, XXX to {:#06x}", usd.raw(), CurrencyCode::NO_CURRENCY.raw());
    println!("size_of::<Money>() = {} bytes\n", std::mem::size_of::<Money>());

    // Default context: half to even, currency digits
    let price = Money::new(Decimal::new(10235, 3), usd)?;
    println!("10.235 USD (half to even)      -> {price}");

    // Non-decimal minor unit: 1/5 ariary
    let ariary = Money::new(Decimal::new(1022, 2), mga)?;
    println!("10.22 MGA (1/5 minor unit)     -> {ariary}");

    // Scoped override
    let registry = RoundingContextRegistry::global();
    {
        let _scope = registry.create_scope_with(RoundingContextConfig::commercial())?;
        let tip = Money::new(Decimal::new(2665, 3), usd)?;
        println!("2.665 USD (half away from zero) -> {tip}");
    }

    // Named context with a scale cap
    let fx = registry.create_named(RoundingContextConfig::bankers().with_max_scale(6), "fx")?;
    let rate_applied = Money::with_context(Decimal::new(1_234_567_891, 9), usd, &fx)?;
    println!("1.234567891 USD (max scale 6)  -> {rate_applied} [context {}]", fx.index());

    // Allocation
    println!("\n=== Allocation ===");
    let pot = Money::new(Decimal::new(100, 0), usd)?;
    let even = pot.split_even(3, MidpointRounding::ToEven)?;
    println!("{pot} / 3         -> {}", join(&even));

    let bill = Money::new(Decimal::new(100, 2), usd)?;
    let weighted = bill.split_by_ratio(&[2, 3, 3], MidpointRounding::ToEven)?;
    println!("{bill} by [2,3,3] -> {}", join(&weighted));

    println!("\nRegistered contexts: {}", registry.context_count());
    Ok(())
}

fn join(shares: &[Money]) -> String {
    shares
        .iter()
        .map(|share| share.amount().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
