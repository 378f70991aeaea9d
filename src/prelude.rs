// 1. Traits
pub use crate::agent::Agent;
pub use crate::gym::trading::Env;
pub use crate::math::indicator::StreamingIndicator;

// 2. The Core "Loop" Types
pub use crate::gym::EnvStatus;
pub use crate::gym::trading::{
    StepInfo, Transition,
    action::{ActionSpace, ActionVector},
    config::{EnvConfig, StartMode},
    env::Environment,
    observation::Observation,
    portfolio::PortfolioSnapshot,
    reward::RewardWeights,
};

// 3. Market Data Types
pub use crate::data::{
    domain::{Candle, MarketDay, MarketRow, Ticker},
    features::FeatureEngineer,
    frame::MarketFrame,
    indicator::{EmaWindow, RsiWindow, SmaWindow, TechnicalIndicator},
    loader::read_candles_csv,
};

// 4. Agents & Search
pub use crate::agent::{AgentIdentifier, GridAxis, crossover::SmaCrossoverAgent, random::RandomAgent};

// 5. Reports
pub use crate::report::{
    journal::{Journal, JournalCol, PerformanceSummary},
    leaderboard::{Leaderboard, LeaderboardEntry},
};

// 6. Errors
pub use crate::error::{
    AgentError, ConfigError, DataError, EnvError, IoError, SystemError, TradegymError,
    TradegymResult,
};
