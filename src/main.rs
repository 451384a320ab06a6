//! Binary entrypoint for the LifeVerse CLI.
//!
//! Commands:
//! - `init` - write a starter `config.toml` and seed a fresh game
//! - `status` - print level, coins, quests, creatures and city
//! - `quest add|complete|progress|list` - manage quests
//! - `feed <creature>` - spend coins to feed a creature
//! - `build unlock|upgrade <building>` - grow the city
//! - `world unlock|activate|list` - travel between worlds
//! - `expense add|summary` - track income and spending
//! - `health` - log today's water, sleep, steps, mood and exercise
//! - `clan join|leave` - clan membership
//! - `arena [--mode short|pomodoro|long]` - run a Study Arena battle in real time
//! - `suggest <action> [context]` - ask the assistant for a tip
//! - `reset` - throw away all progress
//!
//! See the library crate docs for module-level details: `lifeverse::`.
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::sync::{Arc, Mutex};

use lifeverse::api::SledRecordService;
use lifeverse::assistant::AssistantClient;
use lifeverse::config::Config;
use lifeverse::game::creature::FEED_COST;
use lifeverse::game::{
    active_quests, ArenaMode, ArenaTicker, EntryKind, Expense, GameStore, GameStoreBuilder,
    HealthUpdate, Quest, QuestCategory, QuestType, WORLDS,
};

#[derive(Parser)]
#[command(name = "lifeverse")]
#[command(about = "Turn real-life habits into game progress")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a default configuration and seed a new game
    Init,
    /// Show player progress
    Status,
    /// Quest management
    Quest {
        #[command(subcommand)]
        action: QuestAction,
    },
    /// Feed a creature
    Feed { creature: String },
    /// City buildings
    Build {
        #[command(subcommand)]
        action: BuildAction,
    },
    /// Worlds
    World {
        #[command(subcommand)]
        action: WorldAction,
    },
    /// Income and expense tracking
    Expense {
        #[command(subcommand)]
        action: ExpenseAction,
    },
    /// Log today's health metrics
    Health {
        #[arg(long)]
        water: Option<u32>,
        #[arg(long)]
        sleep: Option<f32>,
        #[arg(long)]
        steps: Option<u32>,
        #[arg(long)]
        mood: Option<u8>,
        #[arg(long)]
        exercise: Option<u32>,
    },
    /// Clan membership
    Clan {
        #[command(subcommand)]
        action: ClanAction,
    },
    /// Run a Study Arena battle
    Arena {
        #[arg(short, long, default_value = "pomodoro")]
        mode: String,
    },
    /// Ask the assistant for a suggestion
    Suggest {
        /// suggest_quests, budget_tips, study_plan or motivate
        action: String,
        #[arg(default_value = "")]
        context: String,
    },
    /// Reset all progress to a fresh game
    Reset {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum QuestAction {
    Add {
        title: String,
        /// daily, weekly or challenge
        #[arg(long, default_value = "daily")]
        category: String,
        /// habit, study, fitness, finance, social or mental
        #[arg(long = "type", default_value = "habit")]
        quest_type: String,
        #[arg(long, default_value_t = 25)]
        xp: u64,
        #[arg(long, default_value_t = 5)]
        coins: u64,
        /// Steps needed before the quest completes
        #[arg(long, default_value_t = 1)]
        steps: u32,
    },
    Complete { id: String },
    Progress {
        id: String,
        #[arg(default_value_t = 1)]
        amount: u32,
    },
    List {
        #[arg(long)]
        all: bool,
    },
}

#[derive(Subcommand)]
enum BuildAction {
    Unlock { id: String },
    Upgrade { id: String },
}

#[derive(Subcommand)]
enum WorldAction {
    Unlock { id: String },
    Activate { id: String },
    List,
}

#[derive(Subcommand)]
enum ExpenseAction {
    Add {
        /// Amount, e.g. 12.50
        amount: String,
        category: String,
        #[arg(long)]
        income: bool,
        #[arg(long, default_value = "")]
        note: String,
    },
    Summary,
}

#[derive(Subcommand)]
enum ClanAction {
    Join { id: String, name: String },
    Leave,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let command = match cli.command {
        Commands::Init => {
            init_logging(&None, cli.verbose);
            return run_init(&cli.config).await;
        }
        command => command,
    };

    let config = load_config(&cli.config).await?;
    init_logging(&Some(config.clone()), cli.verbose);

    match command {
        Commands::Suggest { action, context } => {
            let client = AssistantClient::new(&config.assistant);
            let reply = client.suggest(&action, &context).await;
            println!("{}", serde_json::to_string_pretty(&reply)?);
        }
        Commands::Arena { mode } => {
            let mode = ArenaMode::parse(&mode)
                .ok_or_else(|| anyhow!("unknown arena mode '{}' (short, pomodoro, long)", mode))?;
            let (store, _) = open_store(&config)?;
            run_arena(store, mode, &config).await?;
        }
        command => {
            let (mut store, records) = open_store(&config)?;
            run_command(&mut store, &records, command)?;
        }
    }
    Ok(())
}

async fn run_init(path: &str) -> Result<()> {
    if Path::new(path).exists() {
        println!("Configuration already exists at {}", path);
    } else {
        Config::create_default(path).await?;
        println!("Created default configuration at {}", path);
    }
    let config = Config::load(path).await?;
    let (store, _) = open_store(&config)?;
    info!("game ready for {}", store.state().user.id);
    println!(
        "Game ready for {} in {}",
        store.state().user.name,
        config.game.store_path().display()
    );
    Ok(())
}

async fn load_config(path: &str) -> Result<Config> {
    if Path::new(path).exists() {
        Config::load(path).await
    } else {
        let config = Config::default();
        config.validate()?;
        Ok(config)
    }
}

fn open_store(config: &Config) -> Result<(GameStore, SledRecordService)> {
    let path = config.game.store_path();
    GameStoreBuilder::new(path.clone())
        .user(&config.game.user_id, &config.game.display_name)
        .open_with_records()
        .with_context(|| format!("failed to open game store at {}", path.display()))
}

fn run_command(store: &mut GameStore, records: &SledRecordService, command: Commands) -> Result<()> {
    match command {
        Commands::Status => print_status(store),
        Commands::Quest { action } => match action {
            QuestAction::Add {
                title,
                category,
                quest_type,
                xp,
                coins,
                steps,
            } => {
                let category = QuestCategory::parse(&category)
                    .ok_or_else(|| anyhow!("unknown quest category '{}'", category))?;
                let quest_type = QuestType::parse(&quest_type)
                    .ok_or_else(|| anyhow!("unknown quest type '{}'", quest_type))?;
                let id = uuid::Uuid::new_v4().simple().to_string();
                let mut quest = Quest::new(&id, &title, category, quest_type).with_rewards(xp, coins);
                if steps > 1 {
                    quest = quest.with_max_progress(steps);
                }
                store.add_quest(quest)?;
                println!("Added quest {} ({})", title, id);
            }
            QuestAction::Complete { id } => match store.complete_quest_synced(records, &id)? {
                Some(done) => println!(
                    "Quest complete: +{} XP, +{} coins, streak {}. Level {}{}",
                    done.xp_awarded,
                    done.coins_awarded,
                    done.streak,
                    done.new_level,
                    if done.levels_gained > 0 { " (level up!)" } else { "" }
                ),
                None => println!("Nothing to do: quest {} is unknown or already complete", id),
            },
            QuestAction::Progress { id, amount } => match store.advance_quest(&id, amount)? {
                Some(done) => println!("Quest complete: +{} XP, +{} coins", done.xp_awarded, done.coins_awarded),
                None => {
                    if let Some(line) = store.state().quest(&id).and_then(progress_line) {
                        println!("{}", line);
                    }
                }
            },
            QuestAction::List { all } => {
                let state = store.state();
                let quests: Vec<&Quest> = if all {
                    state.quests.iter().collect()
                } else {
                    active_quests(state)
                };
                for q in quests {
                    println!(
                        "[{}] {:<16} {} ({}/{}) {}xp {}c streak {}",
                        if q.completed { "x" } else { " " },
                        q.id,
                        q.title,
                        q.category.as_str(),
                        q.quest_type.as_str(),
                        q.xp_reward,
                        q.coin_reward,
                        q.streak
                    );
                }
            }
        },
        Commands::Feed { creature } => {
            let gained = store.feed_creature_synced(records, &creature)?;
            if let Some(c) = store.state().creature(&creature) {
                println!(
                    "{} ate (-{} coins): happiness {} (+{})",
                    c.name, FEED_COST, c.happiness, gained
                );
            }
        }
        Commands::Build { action } => match action {
            BuildAction::Unlock { id } => {
                store.unlock_building_synced(records, &id)?;
                println!("Unlocked {}. Coins left: {}", id, store.state().user.coins);
            }
            BuildAction::Upgrade { id } => {
                let level = store.upgrade_building(&id)?;
                println!("{} is now level {}", id, level);
            }
        },
        Commands::World { action } => match action {
            WorldAction::Unlock { id } => {
                if store.unlock_world(&id)? {
                    println!("Portal to {} opened", id);
                } else {
                    println!("{} is already unlocked", id);
                }
            }
            WorldAction::Activate { id } => {
                store.set_active_world(&id)?;
                println!("Now exploring {}", id);
            }
            WorldAction::List => {
                let user = &store.state().user;
                for w in WORLDS {
                    let marker = if w.id == user.active_world {
                        "*"
                    } else if user.unlocked_worlds.contains(w.id) {
                        "+"
                    } else {
                        " "
                    };
                    println!(
                        "{} {:<8} {:<14} x{}% lvl {} {}c",
                        marker, w.id, w.name, w.xp_multiplier, w.unlock_level, w.unlock_cost
                    );
                }
            }
        },
        Commands::Expense { action } => match action {
            ExpenseAction::Add {
                amount,
                category,
                income,
                note,
            } => {
                let minor = parse_minor_units(&amount)?;
                let kind = if income { EntryKind::Income } else { EntryKind::Expense };
                let id = uuid::Uuid::new_v4().simple().to_string();
                store.add_expense(Expense::new(&id, minor, &category, kind).with_note(&note))?;
                println!("Recorded {} {}", amount, category);
            }
            ExpenseAction::Summary => {
                let summary = store.budget_summary();
                println!("Income:  {}", format_minor_units(summary.total_income));
                println!("Expense: {}", format_minor_units(summary.total_expense));
                println!("Balance: {}", format_minor_units(summary.balance));
                for (category, total) in &summary.by_category {
                    println!("  {:<12} {}", category, format_minor_units(*total));
                }
            }
        },
        Commands::Health {
            water,
            sleep,
            steps,
            mood,
            exercise,
        } => {
            let update = HealthUpdate {
                water,
                sleep,
                steps,
                mood,
                exercise,
            };
            let log = store.log_health(Utc::now().date_naive(), &update)?;
            println!(
                "{}: water {}, sleep {:.1}h, steps {}, mood {}, exercise {}m",
                log.date,
                log.water,
                log.sleep,
                log.steps,
                log.mood.map_or_else(|| "-".to_string(), |m| m.to_string()),
                log.exercise
            );
        }
        Commands::Clan { action } => match action {
            ClanAction::Join { id, name } => {
                store.join_clan(&id, &name)?;
                println!("Joined clan {}", name);
            }
            ClanAction::Leave => match store.leave_clan()? {
                Some(clan) => println!("Left clan {}", clan.name),
                None => println!("You are not in a clan"),
            },
        },
        Commands::Reset { yes } => {
            if !yes {
                return Err(anyhow!("reset discards all progress; rerun with --yes"));
            }
            store.reset_to_seed()?;
            warn!("game reset to seed for {}", store.state().user.id);
            println!("Progress reset");
        }
        Commands::Init | Commands::Arena { .. } | Commands::Suggest { .. } => {}
    }
    Ok(())
}

fn print_status(store: &GameStore) {
    let state = store.state();
    let user = &state.user;
    println!(
        "{} - level {} ({}/{} XP) - {} coins",
        user.name, user.level, user.xp, user.xp_to_next_level, user.coins
    );
    println!(
        "World: {} - quests today: {} - total: {}",
        user.active_world, user.daily.quests_completed, user.total_quests_completed
    );
    println!("Active quests: {}", active_quests(state).len());
    for c in &state.creatures {
        println!(
            "  {:<8} {:<8} happiness {:>3} evolution {:>3} ({})",
            c.name,
            c.creature_type.as_str(),
            c.happiness,
            c.evolution,
            c.stage()
        );
    }
    let unlocked = state.buildings.iter().filter(|b| b.unlocked).count();
    println!("City: {}/{} buildings unlocked", unlocked, state.buildings.len());
    if let Some(clan) = &state.clan {
        println!("Clan: {}", clan.name);
    }
}

async fn run_arena(store: GameStore, mode: ArenaMode, config: &Config) -> Result<()> {
    let shared = Arc::new(Mutex::new(store));
    let token = {
        let mut guard = shared.lock().map_err(|_| anyhow!("store lock poisoned"))?;
        guard.arena_set_mode(mode)?;
        guard
            .arena_start()
            .ok_or_else(|| anyhow!("a battle is already running"))?
    };
    println!("{} minute battle started. Ctrl-C to give up.", mode.minutes());

    let mut ticker = ArenaTicker::spawn(shared.clone(), token, config.arena.tick_period());
    let mut poll = tokio::time::interval(std::time::Duration::from_millis(250));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                ticker.cancel();
                if let Ok(mut guard) = shared.lock() {
                    guard.arena_reset();
                }
                println!("Battle abandoned");
                return Ok(());
            }
            _ = poll.tick() => {
                if ticker.is_finished() {
                    break;
                }
            }
        }
    }

    let guard = shared.lock().map_err(|_| anyhow!("store lock poisoned"))?;
    if let Some(reward) = guard.arena().last_reward() {
        println!(
            "Battle over: {} damage{}. +{} XP, +{} coins",
            reward.total_damage,
            if reward.boss_defeated { ", boss defeated" } else { "" },
            reward.xp,
            reward.coins
        );
    }
    Ok(())
}

/// Parse "12", "12.5" or "12.50" into minor units.
/// `title: progress/max` for multi-step quests, `None` for single-step ones.
fn progress_line(q: &Quest) -> Option<String> {
    q.max_progress
        .map(|max| format!("{}: {}/{}", q.title, q.progress.unwrap_or(0), max))
}

fn parse_minor_units(s: &str) -> Result<i64> {
    let s = s.trim();
    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    if s.starts_with('-') {
        return Err(anyhow!("amount must be positive"));
    }
    let digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    if !digits(whole) || !digits(frac) {
        return Err(anyhow!("invalid amount '{}'", s));
    }
    if frac.len() > 2 || (whole.is_empty() && frac.is_empty()) {
        return Err(anyhow!("invalid amount '{}'", s));
    }
    let whole: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().with_context(|| format!("invalid amount '{}'", s))?
    };
    let cents: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().with_context(|| format!("invalid amount '{}'", s))? * 10,
        _ => frac.parse().with_context(|| format!("invalid amount '{}'", s))?,
    };
    whole
        .checked_mul(100)
        .and_then(|w| w.checked_add(cents))
        .ok_or_else(|| anyhow!("amount '{}' is too large", s))
}

fn format_minor_units(v: i64) -> String {
    let sign = if v < 0 { "-" } else { "" };
    let v = v.unsigned_abs();
    format!("{}{}.{:02}", sign, v / 100, v % 100)
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|c| c.logging.level.parse().ok())
            .unwrap_or(log::LevelFilter::Warn),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let file = config
        .as_ref()
        .and_then(|c| c.logging.file.as_ref())
        .and_then(|path| std::fs::OpenOptions::new().create(true).append(true).open(path).ok());

    if let Some(f) = file {
        let write_mutex = Arc::new(Mutex::new(f));
        let is_tty = atty::is(atty::Stream::Stderr);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
