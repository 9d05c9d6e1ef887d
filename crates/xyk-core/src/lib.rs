// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// XYK - CORE MODULE
//
// Constant-product (x·y=k) pool ledger for a single token pair.
// - Reserves, LP-share supply and per-holder share balances
// - 0.3% input fee (997/1000), locked MINIMUM_LIQUIDITY on first deposit
// - Slippage minimums and deadlines on every mutating operation
// - All arithmetic is integer-only: u128 amounts, U256 intermediates
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub mod error;
pub mod events;
pub mod host;
pub mod math;
pub mod params;
pub mod pool;
pub mod types;

pub use error::{PoolError, TransferError};
pub use events::PoolEvent;
pub use host::{EventSink, ExecutionContext, PoolHost, TokenTransfer};
pub use math::U256;
pub use params::{
    AddLiquidityOutcome, AddLiquidityParams, RemoveLiquidityOutcome, RemoveLiquidityParams,
    SwapParams,
};
pub use pool::Pool;
pub use types::{Address, IdParseError, Side, TokenId};

/// Shares permanently assigned to the null holder on the first deposit
pub const MINIMUM_LIQUIDITY: u128 = 1_000;
/// Fee multiplier applied to swap input (997/1000 = 0.3% fee)
pub const FEE_NUMERATOR: u128 = 997;
pub const FEE_DENOMINATOR: u128 = 1_000;
/// Swap fee in basis points, for display
pub const FEE_BPS: u128 = 30;
/// Fixed-point scale of prices returned by `get_price` (18 decimals)
pub const PRICE_SCALE: u128 = 1_000_000_000_000_000_000;
