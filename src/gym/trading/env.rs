use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::info;

use crate::{
    agent::Agent,
    data::frame::MarketFrame,
    error::{EnvError, TradegymResult},
    gym::{
        EnvStatus,
        trading::{
            Env, StepInfo, Transition,
            action::ActionVector,
            config::{EnvConfig, StartMode},
            cursor::EpisodeCursor,
            execution::ExecutionEngine,
            history::EpisodeHistory,
            observation::Observation,
            portfolio::{Portfolio, PortfolioSnapshot},
            reward,
        },
    },
    report::{
        journal::Journal,
        leaderboard::{Leaderboard, LeaderboardEntry},
    },
};

/// Daily multi-asset trading environment.
///
/// One instance owns one episode's state — portfolio, day cursor, history —
/// with no sharing across instances. `step`/`reset` run synchronously to
/// completion; for parallel rollouts, clone the environment (the market
/// frame is shared behind an `Arc`, everything else is private per clone),
/// which is exactly what [`Environment::evaluate_agents`] does.
#[derive(Debug, Clone)]
pub struct Environment {
    cfg: EnvConfig,
    data: Arc<MarketFrame>,
    portfolio: Portfolio,
    cursor: EpisodeCursor,
    history: EpisodeHistory,
    status: EnvStatus,
    last_reward: f64,
    episode: u32,
}

impl Environment {
    /// Validates the configuration against the frame and starts the first
    /// episode. Misconfiguration fails here, never inside `step`.
    pub fn new(cfg: EnvConfig, data: Arc<MarketFrame>) -> TradegymResult<Self> {
        cfg.validate_against(&data)?;

        let day0 = data.get_day(0)?;
        let portfolio = Portfolio::initiate(&cfg, day0);

        let mut env = Self {
            cfg,
            data,
            portfolio,
            cursor: EpisodeCursor::default(),
            history: EpisodeHistory::default(),
            status: EnvStatus::Running,
            last_reward: 0.0,
            episode: 0,
        };
        env.start_episode()?;
        Ok(env)
    }

    pub fn status(&self) -> EnvStatus {
        self.status
    }

    pub fn config(&self) -> &EnvConfig {
        &self.cfg
    }

    pub fn history(&self) -> &EpisodeHistory {
        &self.history
    }

    /// Episode counter, starting at 1 for the episode opened by `new`.
    pub fn episode(&self) -> u32 {
        self.episode
    }

    /// Trading cost accumulated since the episode started.
    pub fn total_cost(&self) -> f64 {
        self.cursor.friction().cost()
    }

    /// Trades recorded since the episode started.
    pub fn total_trades(&self) -> u64 {
        self.cursor.friction().trades()
    }

    pub fn day(&self) -> usize {
        self.cursor.day()
    }

    /// Current net worth of the portfolio.
    pub fn valuation(&self) -> f64 {
        self.portfolio.total_valuation()
    }

    /// Cash and holdings in a form a follow-up run can resume from.
    pub fn snapshot(&self) -> PortfolioSnapshot {
        self.portfolio.snapshot()
    }

    /// Manually trips (or clears) the circuit breaker for one asset,
    /// overriding the turbulence gate until the next day advance.
    pub fn set_asset_halted(&mut self, asset: usize, halted: bool) -> TradegymResult<()> {
        if asset >= self.cfg.stock_dim() {
            return Err(EnvError::AssetIndex {
                index: asset,
                assets: self.cfg.stock_dim(),
            }
            .into());
        }
        self.portfolio.set_halted(asset, halted);
        Ok(())
    }

    /// The current episode's account curve as a report.
    pub fn journal(&self) -> TradegymResult<Journal> {
        Journal::new(&self.history)
    }

    /// Runs `agent` through one full episode and reports its account curve.
    #[tracing::instrument(skip(self, agent))]
    pub fn evaluate_agent<A: Agent>(&mut self, agent: &mut A) -> TradegymResult<Journal> {
        self.run_episode(agent)?;
        self.journal()
    }

    /// Evaluates a stream of `(uid, agent)` pairs in parallel and returns
    /// the `top_k` performers by final account value.
    ///
    /// Each rayon worker drives its own clone of this environment, so no
    /// state is shared between concurrent rollouts. `stream_len` only sizes
    /// the progress bar.
    pub fn evaluate_agents<A>(
        &self,
        agents: impl IntoParallelIterator<Item = (usize, A)>,
        top_k: usize,
        stream_len: u64,
    ) -> TradegymResult<Leaderboard>
    where
        A: Agent + Send,
    {
        let pb = progress_bar(stream_len)?;
        pb.set_message("Evaluating agents...");

        let entries = agents
            .into_par_iter()
            .map(|(uid, mut agent)| {
                let mut env = self.clone();
                env.run_episode(&mut agent)?;

                let entry = LeaderboardEntry {
                    agent_uid: uid as u64,
                    identifier: agent.identifier(),
                    final_value: env.history.final_value().unwrap_or(0.0),
                    cumulative_reward: env.history.cumulative_reward(),
                };
                pb.inc(1);
                Ok(entry)
            })
            .collect::<TradegymResult<Vec<_>>>()?;

        pb.finish_with_message("Evaluation complete.");
        Ok(Leaderboard::from_entries(entries, top_k))
    }

    fn run_episode<A: Agent>(&mut self, agent: &mut A) -> TradegymResult<()> {
        let (mut obs, _) = self.reset()?;
        loop {
            let action = agent.act(&obs)?;
            let transition = self.step(&action)?;
            obs = transition.observation;
            if transition.terminal {
                break;
            }
        }
        agent.reset();
        Ok(())
    }

    fn observe(&self) -> Observation {
        Observation::new(
            self.portfolio.flatten(),
            self.cfg.stock_dim(),
            self.cfg.indicator_list().len(),
        )
    }

    /// Common reset path: day 0, fresh portfolio, reseeded history.
    fn start_episode(&mut self) -> TradegymResult<()> {
        let day0 = self.data.get_day(0)?;

        self.cursor.reset();
        self.cursor.sync_terminal(self.data.last_day());
        self.portfolio = Portfolio::initiate(&self.cfg, day0);

        // Continuation mode seeds the curve with the carried-over portfolio
        // marked at today's prices, so the first return compares against a
        // live valuation rather than a stale one.
        let seed_value = match self.cfg.start() {
            StartMode::Fresh => self.cfg.initial_amount(),
            StartMode::Resume(_) => self.portfolio.total_valuation(),
        };
        self.history.reseed(seed_value, day0.date);

        if let Some(threshold) = self.cfg.turbulence_threshold() {
            self.portfolio.apply_turbulence_gate(day0.turbulence, threshold);
        }

        self.last_reward = 0.0;
        self.status = if self.cursor.is_terminal() {
            EnvStatus::Terminal
        } else {
            EnvStatus::Running
        };
        self.episode += 1;

        info!(episode = self.episode, seed_value, "Episode started");
        Ok(())
    }
}

impl Env for Environment {
    #[tracing::instrument(skip(self), fields(episode = self.episode + 1))]
    fn reset(&mut self) -> TradegymResult<(Observation, StepInfo)> {
        self.start_episode()?;
        Ok((self.observe(), StepInfo::default()))
    }

    fn step(&mut self, action: &ActionVector) -> TradegymResult<Transition> {
        if action.len() != self.cfg.stock_dim() {
            return Err(EnvError::ActionDimension {
                expected: self.cfg.stock_dim(),
                actual: action.len(),
            }
            .into());
        }

        // Sticky terminal: once the day range is exhausted, keep answering
        // without touching portfolio or history.
        if self.cursor.is_terminal() {
            self.status = EnvStatus::Terminal;
            return Ok(Transition {
                observation: self.observe(),
                reward: self.last_reward,
                terminal: true,
                truncated: false,
                info: StepInfo::default(),
            });
        }

        ExecutionEngine::new(&self.cfg, &mut self.portfolio, self.cursor.friction_mut())
            .execute(action.as_slice());

        self.cursor.advance(self.data.last_day());
        let day = self.data.get_day(self.cursor.day())?;
        self.portfolio.roll_forward(day);
        if let Some(threshold) = self.cfg.turbulence_threshold() {
            self.portfolio.apply_turbulence_gate(day.turbulence, threshold);
        }

        self.history
            .push_valuation(self.portfolio.total_valuation(), day.date);
        let reward = reward::step_reward(
            self.history.asset_values(),
            self.cursor.friction().cost(),
            self.cfg.reward_weights(),
            self.cfg.reward_scaling(),
        );
        self.history.push_reward(reward);
        self.history.push_action(action.as_slice().to_vec());
        self.last_reward = reward;

        let terminal = self.cursor.is_terminal();
        if terminal {
            self.status = EnvStatus::Terminal;
            info!(
                episode = self.episode,
                final_value = self.portfolio.total_valuation(),
                trades = self.total_trades(),
                cost = self.total_cost(),
                "Episode finished"
            );
        }

        Ok(Transition {
            observation: self.observe(),
            reward,
            terminal,
            truncated: false,
            info: StepInfo::default(),
        })
    }
}

fn progress_bar(capacity: u64) -> TradegymResult<ProgressBar> {
    let bar = ProgressBar::new(capacity);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta_precise}) {msg}")
            .map_err(EnvError::ProgressBar)?
            .progress_chars("#>-"),
    );
    Ok(bar)
}
