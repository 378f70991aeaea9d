use std::cmp::Ordering;

use tracing::trace;

use crate::gym::trading::{config::EnvConfig, cursor::TradeAccumulator, portfolio::Portfolio};

/// Applies one trade-intensity vector to the portfolio.
///
/// Execution order is fixed: the action is scaled by `hmax`, asset indices
/// are argsorted by scaled intensity, sells run first in ascending order,
/// buys second in descending order. Sells therefore free cash that buys in
/// the same step may spend, and a buy can never consume cash that only
/// materializes later in the step.
///
/// The engine never fails. Oversized sells clamp to current holdings,
/// oversized buys clamp to what cash affords, and halted assets no-op; the
/// requested action degrades to the nearest feasible trade.
pub(crate) struct ExecutionEngine<'a> {
    cfg: &'a EnvConfig,
    portfolio: &'a mut Portfolio,
    friction: &'a mut TradeAccumulator,
}

impl<'a> ExecutionEngine<'a> {
    pub fn new(
        cfg: &'a EnvConfig,
        portfolio: &'a mut Portfolio,
        friction: &'a mut TradeAccumulator,
    ) -> Self {
        Self {
            cfg,
            portfolio,
            friction,
        }
    }

    pub fn execute(&mut self, action: &[f64]) {
        let scaled: Vec<f64> = action.iter().map(|a| a * self.cfg.hmax()).collect();
        let (sells, buys) = plan(&scaled);

        for asset in sells {
            self.sell(asset, scaled[asset].abs());
        }
        for asset in buys {
            self.buy(asset, scaled[asset]);
        }
    }

    /// Sells up to `requested` shares. Returns the shares actually sold.
    ///
    /// A trade is recorded only when the asset was actually held; selling
    /// out of an empty position is a silent no-op.
    fn sell(&mut self, asset: usize, requested: f64) -> f64 {
        if self.portfolio.is_halted(asset) {
            trace!(asset, "sell skipped: asset halted");
            return 0.0;
        }
        if self.portfolio.holding(asset) <= 0.0 {
            return 0.0;
        }

        let shares = requested.min(self.portfolio.holding(asset));
        let price = self.portfolio.price(asset);
        let fee_pct = self.cfg.sell_cost_pct()[asset];
        let proceeds = price * shares * (1.0 - fee_pct);

        self.portfolio.add_cash(proceeds);
        self.portfolio.add_holding(asset, -shares);
        self.friction.record(price * shares * fee_pct);

        trace!(asset, shares, proceeds, "sell filled");
        shares
    }

    /// Buys up to `requested` shares, limited by available cash including
    /// the buy-side fee. Returns the shares actually bought.
    ///
    /// An attempted buy is recorded as a trade even when cash affords zero
    /// shares; only the halt gate suppresses the attempt entirely.
    fn buy(&mut self, asset: usize, requested: f64) -> f64 {
        if self.portfolio.is_halted(asset) {
            trace!(asset, "buy skipped: asset halted");
            return 0.0;
        }

        let price = self.portfolio.price(asset);
        let fee_pct = self.cfg.buy_cost_pct()[asset];
        let unit_cost = price * (1.0 + fee_pct);

        let affordable = if unit_cost > 0.0 {
            (self.portfolio.cash() / unit_cost).floor().max(0.0)
        } else {
            0.0
        };
        let shares = affordable.min(requested);

        self.portfolio.add_cash(-price * shares * (1.0 + fee_pct));
        self.portfolio.add_holding(asset, shares);
        self.friction.record(price * shares * fee_pct);

        trace!(asset, shares, affordable, "buy filled");
        shares
    }
}

/// Splits scaled intensities into execution order:
/// sell indices ascending by intensity, buy indices descending.
/// Zero and non-finite entries trade nothing and appear in neither list.
fn plan(scaled: &[f64]) -> (Vec<usize>, Vec<usize>) {
    let mut order: Vec<usize> = (0..scaled.len()).collect();
    order.sort_by(|&a, &b| scaled[a].partial_cmp(&scaled[b]).unwrap_or(Ordering::Equal));

    let sells: Vec<usize> = order.iter().copied().filter(|&i| scaled[i] < 0.0).collect();
    let buys: Vec<usize> = order
        .iter()
        .rev()
        .copied()
        .filter(|&i| scaled[i] > 0.0)
        .collect();
    (sells, buys)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::data::{
        domain::{MarketDay, MarketRow},
        indicator::TechnicalIndicator,
    };

    fn market_day(prices: &[f64]) -> MarketDay {
        MarketDay {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            turbulence: None,
            rows: prices
                .iter()
                .map(|&price| MarketRow {
                    price,
                    indicators: vec![0.0],
                })
                .collect(),
        }
    }

    fn setup(cfg: &EnvConfig, prices: &[f64]) -> (Portfolio, TradeAccumulator) {
        (
            Portfolio::initiate(cfg, &market_day(prices)),
            TradeAccumulator::default(),
        )
    }

    fn zero_cost_cfg(dim: usize, cash: f64) -> EnvConfig {
        EnvConfig::new(dim, cash, vec![TechnicalIndicator::sma(2)])
            .with_flat_cost_pct(0.0)
            .with_hmax(10.0)
    }

    #[test]
    fn plan_orders_sells_ascending_buys_descending() {
        let (sells, buys) = plan(&[-5.0, 9.0, -10.0, 3.0]);
        assert_eq!(sells, vec![2, 0]);
        assert_eq!(buys, vec![1, 3]);
    }

    #[test]
    fn plan_drops_zero_and_non_finite_entries() {
        let (sells, buys) = plan(&[0.0, f64::NAN, 2.0]);
        assert_eq!(sells, Vec::<usize>::new());
        assert_eq!(buys, vec![2]);
    }

    #[test]
    fn buy_clamps_to_affordable_shares() {
        let cfg = zero_cost_cfg(1, 55.0);
        let (mut portfolio, mut friction) = setup(&cfg, &[10.0]);

        let mut engine = ExecutionEngine::new(&cfg, &mut portfolio, &mut friction);
        // Full intensity asks for 10 shares; cash affords 5.
        engine.execute(&[1.0]);

        assert_eq!(portfolio.holding(0), 5.0);
        assert_eq!(portfolio.cash(), 5.0);
        assert_eq!(friction.trades(), 1);
    }

    #[test]
    fn buy_with_fee_never_overdraws_cash() {
        let cfg = EnvConfig::new(1, 101.0, vec![TechnicalIndicator::sma(2)])
            .with_flat_cost_pct(0.01)
            .with_hmax(10.0);
        let (mut portfolio, mut friction) = setup(&cfg, &[10.0]);

        ExecutionEngine::new(&cfg, &mut portfolio, &mut friction).execute(&[1.0]);

        // floor(101 / 10.1) = 10 shares, total cost exactly 101.
        assert_eq!(portfolio.holding(0), 10.0);
        assert!(portfolio.cash() >= 0.0);
        assert!((friction.cost() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn unaffordable_buy_records_an_attempt() {
        let cfg = zero_cost_cfg(1, 5.0);
        let (mut portfolio, mut friction) = setup(&cfg, &[10.0]);

        ExecutionEngine::new(&cfg, &mut portfolio, &mut friction).execute(&[1.0]);

        assert_eq!(portfolio.holding(0), 0.0);
        assert_eq!(portfolio.cash(), 5.0);
        assert_eq!(friction.trades(), 1);
    }

    #[test]
    fn sell_of_empty_position_records_nothing() {
        let cfg = zero_cost_cfg(1, 100.0);
        let (mut portfolio, mut friction) = setup(&cfg, &[10.0]);

        ExecutionEngine::new(&cfg, &mut portfolio, &mut friction).execute(&[-1.0]);

        assert_eq!(portfolio.holding(0), 0.0);
        assert_eq!(friction.trades(), 0);
    }

    #[test]
    fn sell_clamps_to_holdings_no_short_sales() {
        let cfg = zero_cost_cfg(1, 0.0).with_initial_holdings(vec![3.0]);
        let (mut portfolio, mut friction) = setup(&cfg, &[10.0]);

        ExecutionEngine::new(&cfg, &mut portfolio, &mut friction).execute(&[-1.0]);

        assert_eq!(portfolio.holding(0), 0.0);
        assert_eq!(portfolio.cash(), 30.0);
        assert_eq!(friction.trades(), 1);
    }

    #[test]
    fn sell_fee_reduces_proceeds_and_accrues_cost() {
        let cfg = EnvConfig::new(1, 0.0, vec![TechnicalIndicator::sma(2)])
            .with_flat_cost_pct(0.1)
            .with_hmax(10.0)
            .with_initial_holdings(vec![10.0]);
        let (mut portfolio, mut friction) = setup(&cfg, &[10.0]);

        ExecutionEngine::new(&cfg, &mut portfolio, &mut friction).execute(&[-1.0]);

        assert_eq!(portfolio.cash(), 90.0);
        assert!((friction.cost() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn sell_proceeds_fund_same_step_buy() {
        // No cash, 5 shares of asset 1 at 20. Buying asset 0 at 10 is only
        // possible with the sell's proceeds.
        let cfg = zero_cost_cfg(2, 0.0)
            .with_hmax(5.0)
            .with_initial_holdings(vec![0.0, 5.0]);
        let (mut portfolio, mut friction) = setup(&cfg, &[10.0, 20.0]);

        ExecutionEngine::new(&cfg, &mut portfolio, &mut friction).execute(&[1.0, -1.0]);

        assert_eq!(portfolio.holding(1), 0.0);
        assert_eq!(portfolio.holding(0), 5.0);
        assert_eq!(portfolio.cash(), 50.0);
        assert_eq!(friction.trades(), 2);
    }

    #[test]
    fn halted_asset_is_frozen_both_ways() {
        let cfg = zero_cost_cfg(2, 1_000.0).with_initial_holdings(vec![4.0, 4.0]);
        let (mut portfolio, mut friction) = setup(&cfg, &[10.0, 20.0]);
        portfolio.set_halted(0, true);

        ExecutionEngine::new(&cfg, &mut portfolio, &mut friction).execute(&[1.0, -1.0]);

        // Asset 0 untouched, asset 1 sold normally.
        assert_eq!(portfolio.holding(0), 4.0);
        assert_eq!(portfolio.holding(1), 0.0);
        assert_eq!(portfolio.cash(), 1_000.0 + 80.0);
        assert_eq!(friction.trades(), 1);
    }

    #[test]
    fn fractional_request_below_affordability_fills_exactly() {
        let cfg = zero_cost_cfg(1, 1_000.0);
        let (mut portfolio, mut friction) = setup(&cfg, &[10.0]);

        ExecutionEngine::new(&cfg, &mut portfolio, &mut friction).execute(&[0.25]);

        assert_eq!(portfolio.holding(0), 2.5);
        assert_eq!(portfolio.cash(), 975.0);
    }

    #[test]
    fn zero_price_asset_trades_nothing() {
        let cfg = zero_cost_cfg(1, 100.0);
        let (mut portfolio, mut friction) = setup(&cfg, &[0.0]);

        ExecutionEngine::new(&cfg, &mut portfolio, &mut friction).execute(&[1.0]);

        assert_eq!(portfolio.holding(0), 0.0);
        assert_eq!(portfolio.cash(), 100.0);
    }
}
