// SPDX-License-Identifier: AGPL-3.0-only
use super::{print_pool_info, print_position, Labels};
use colored::*;
use std::path::Path;
use xyk_core::Address;
use xyk_runtime::{GenesisConfig, Runtime};

pub fn handle(state: &Path, genesis: Option<&Path>, holders: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::deserialize_state(&std::fs::read_to_string(state)?)?;
    let labels = match genesis {
        Some(path) => Labels::from_genesis(&GenesisConfig::load_from_file(path)?),
        None => Labels::default(),
    };

    let info = rt.pool_info();
    print_pool_info(&info);
    println!("{}", "LP Positions".cyan().bold());
    for holder in select_holders(&rt, &labels, holders) {
        print_position(&labels.account(&holder), &info, &rt.lp_position(&holder));
    }
    println!();
    crate::print_info(&format!("{} events recorded, clock at {}", rt.events().len(), rt.now()));
    Ok(())
}

/// Requested holders, or every current holder when none were named.
fn select_holders(rt: &Runtime, labels: &Labels, requested: &[String]) -> Vec<Address> {
    if requested.is_empty() {
        rt.pool().holders().map(|(holder, _)| *holder).collect()
    } else {
        requested.iter().map(|text| labels.parse_account(text)).collect()
    }
}
