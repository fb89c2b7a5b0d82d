use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use maze_pursuit::game::PursuitConfig;
use maze_pursuit::modes::{
    PlayConfig, PlayMode, PolicySource, TabularTrainConfig, TabularTrainMode, TrainConfig,
    TrainMode,
};
use maze_pursuit::rl::{
    InferenceBackend, MappoConfig, TabularConfig, TrainingBackend, default_device,
};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "maze_pursuit")]
#[command(version, about = "Hunter/prey pursuit in procedurally generated mazes")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train both roles with the centralized-critic actor-critic
    Train {
        #[command(flatten)]
        env: EnvArgs,

        /// Number of episodes to train
        #[arg(long, default_value = "5000")]
        episodes: usize,

        /// Directory for the final actors and critic
        #[arg(long, default_value = "models/mappo")]
        save_dir: PathBuf,

        /// Save a checkpoint every N episodes
        #[arg(long, default_value = "500")]
        checkpoint_frequency: usize,

        /// Log progress every N episodes
        #[arg(long, default_value = "50")]
        log_frequency: usize,

        /// JSON file with actor-critic hyperparameters
        #[arg(long)]
        hyperparams: Option<PathBuf>,
    },

    /// Train both roles with zero-sum tabular Q-learning
    TrainTabular {
        #[command(flatten)]
        env: EnvArgs,

        /// Number of episodes to train (overrides the hyperparameter file)
        #[arg(long)]
        episodes: Option<usize>,

        /// Output file for both Q-tables
        #[arg(long, default_value = "models/q_tables.json")]
        save_path: PathBuf,

        /// Log progress every N episodes
        #[arg(long, default_value = "100")]
        log_frequency: usize,

        /// JSON file with tabular hyperparameters
        #[arg(long)]
        hyperparams: Option<PathBuf>,
    },

    /// Run inference-only episodes and report outcomes
    Play {
        #[command(flatten)]
        env: EnvArgs,

        /// Number of episodes to play
        #[arg(long, default_value = "10")]
        episodes: usize,

        /// Directory with saved actors
        #[arg(long, conflicts_with = "tabular")]
        model_dir: Option<PathBuf>,

        /// Tabular snapshot file
        #[arg(long)]
        tabular: Option<PathBuf>,
    },
}

/// Environment overrides shared by every subcommand
#[derive(Args)]
struct EnvArgs {
    /// JSON file with the pursuit configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grid width in cells
    #[arg(long)]
    width: Option<usize>,

    /// Grid height in cells
    #[arg(long)]
    height: Option<usize>,

    /// Maze and spawn seed
    #[arg(long)]
    seed: Option<u64>,
}

impl EnvArgs {
    fn pursuit_config(&self) -> Result<PursuitConfig> {
        let mut config = match &self.config {
            Some(path) => PursuitConfig::from_json_file(path)?,
            None => PursuitConfig::default(),
        };
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        config
            .validate()
            .map_err(|e| anyhow!("Invalid pursuit config: {}", e))?;
        Ok(config)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {:?}", path))?;
    serde_json::from_str(&json).with_context(|| format!("Failed to parse config file {:?}", path))
}

/// Tabular hyperparameters from an optional file, then CLI overrides
fn tabular_config(hyperparams: Option<&Path>, episodes: Option<usize>) -> Result<TabularConfig> {
    let mut config = match hyperparams {
        Some(path) => read_json::<TabularConfig>(path)?,
        None => TabularConfig::default(),
    };
    if let Some(episodes) = episodes {
        config.episodes = episodes;
    }
    Ok(config)
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("maze_pursuit=info"));
    fmt().with_env_filter(filter).with_target(false).init();
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Train {
            env,
            episodes,
            save_dir,
            checkpoint_frequency,
            log_frequency,
            hyperparams,
        } => {
            let mut config = TrainConfig::new(episodes, save_dir);
            config.pursuit_config = env.pursuit_config()?;
            config.checkpoint_frequency = checkpoint_frequency;
            config.log_frequency = log_frequency;
            if let Some(path) = hyperparams {
                config.mappo_config = read_json::<MappoConfig>(&path)?;
            }

            let mut train_mode = TrainMode::<TrainingBackend>::new(config, default_device())?;
            train_mode.run()?;
        }
        Command::TrainTabular {
            env,
            episodes,
            save_path,
            log_frequency,
            hyperparams,
        } => {
            let mut config = TabularTrainConfig::new(save_path);
            config.pursuit_config = env.pursuit_config()?;
            config.log_frequency = log_frequency;
            config.tabular_config = tabular_config(hyperparams.as_deref(), episodes)?;

            TabularTrainMode::new(config).run()?;
        }
        Command::Play {
            env,
            episodes,
            model_dir,
            tabular,
        } => {
            let source = match (model_dir, tabular) {
                (Some(dir), _) => PolicySource::Parametric(dir),
                (None, Some(path)) => PolicySource::Tabular(path),
                (None, None) => {
                    info!("No policy requested; playing the random baseline");
                    PolicySource::Random
                }
            };
            let mut config = PlayConfig::new(source, episodes);
            config.pursuit_config = env.pursuit_config()?;

            let mut play_mode = PlayMode::<InferenceBackend>::new(config, default_device())?;
            play_mode.run()?;
        }
    }

    Ok(())
}
