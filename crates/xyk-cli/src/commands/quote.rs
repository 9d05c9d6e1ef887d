// SPDX-License-Identifier: AGPL-3.0-only
use super::format_scaled;
use colored::*;
use xyk_core::math;
use xyk_runtime::registry::quote_amounts;

pub fn handle(reserve_in: u128, reserve_out: u128, amount_in: u128) -> Result<(), Box<dyn std::error::Error>> {
    let q = quote_amounts(amount_in, reserve_in, reserve_out)?;

    println!("{}", "Swap Quote".cyan().bold());
    println!("{}", "─".repeat(40));
    println!("  Amount In:       {}", amount_in);
    println!("  Amount Out:      {}", q.amount_out.to_string().green());
    println!("  Fee:             {}", q.fee);
    println!(
        "  Price Impact:    {}.{:02}%",
        q.price_impact_bps / 100,
        q.price_impact_bps % 100
    );
    if let Ok(spot) = math::spot_price(reserve_in, reserve_out) {
        println!("  Spot Price:      {}", format_scaled(spot));
    }
    if q.amount_out > 0 {
        // Smallest input that still buys the quoted output
        let needed = math::get_amount_in(q.amount_out, reserve_in, reserve_out)?;
        println!("  Min Input:       {}", needed);
    } else {
        crate::print_info("Input too small to buy a single unit");
    }
    println!("{}", "─".repeat(40));
    Ok(())
}
