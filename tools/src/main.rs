//! clicker-runner: headless front end for the clicker economy.
//!
//! Usage:
//!   clicker-runner --seed 12345 --ticks 600 --db save.db
//!   clicker-runner --config data/game_config.json --ipc-mode --instant-wallet

use anyhow::Result;
use clicker_core::{
    click::{ClickPad, TapOutcome},
    clock::wall_clock_ms,
    config::GameConfig,
    daily::DailyClaim,
    drop_game::{CatchOutcome, DropGameSession, ItemKind},
    engine::GameEngine,
    quiz::{AlbumQuiz, GuessOutcome},
    stats::{format_clock, format_countdown, StatsSummary},
    store::GameStore,
    types::Tick,
    upgrade::{Upgrade, UpgradeStage},
    wallet::SimulatedWallet,
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Tick { count: u64 },
    Tap,
    BuyClick { index: usize },
    BuyPassive { index: usize },
    Referral { code: String },
    Task { id: String },
    ClaimAchievement { id: String },
    DailyBonus,
    DailyReward,
    DropStart,
    DropCatch { item_id: u64 },
    DropClaim,
    QuizPoll,
    QuizGuess { album: String },
    ConnectWallet,
    Withdraw { amount: String },
    Quit,
}

#[derive(serde::Serialize)]
struct UpgradeView {
    name:      String,
    level:     u32,
    max_level: u32,
    cost:      f64,
    maxed:     bool,
}

impl From<&Upgrade> for UpgradeView {
    fn from(u: &Upgrade) -> Self {
        Self {
            name:      u.name.clone(),
            level:     u.level,
            max_level: u.max_level,
            cost:      u.cost,
            maxed:     u.stage() == UpgradeStage::Maxed,
        }
    }
}

#[derive(serde::Serialize)]
struct DropGameView {
    score:          u64,
    combo:          u32,
    time_left_secs: u32,
    energy:         f64,
    over:           bool,
    items:          Vec<(u64, &'static str)>,
}

impl From<&DropGameSession> for DropGameView {
    fn from(s: &DropGameSession) -> Self {
        Self {
            score:          s.score,
            combo:          s.combo,
            time_left_secs: s.time_left_secs,
            energy:         s.energy,
            over:           s.is_over(),
            items: s
                .items
                .iter()
                .map(|i| {
                    let kind = match i.kind {
                        ItemKind::Mic  => "mic",
                        ItemKind::Disc => "disc",
                        ItemKind::Bomb => "bomb",
                    };
                    (i.id, kind)
                })
                .collect(),
        }
    }
}

#[derive(serde::Serialize)]
struct UiState {
    tick:                  Tick,
    now_ms:                i64,
    coins:                 f64,
    energy:                f64,
    max_energy:            f64,
    click_upgrades:        Vec<UpgradeView>,
    passive_upgrades:      Vec<UpgradeView>,
    daily_bonus_in:        String,
    daily_reward_in:       String,
    drop_game_in:          String,
    drop_game:             Option<DropGameView>,
    quiz_options:          Option<Vec<String>>,
    claimable_achievements: Vec<String>,
    wallet_address:        Option<String>,
    stats:                 StatsSummary,
    message:               Option<String>,
}

/// Front-end state that lives outside the engine.
struct Session {
    pad:    ClickPad,
    drop:   Option<DropGameSession>,
    quiz:   AlbumQuiz,
    wallet: SimulatedWallet,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let ticks = parse_arg(&args, "--ticks", 600u64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let instant_wallet = args.iter().any(|a| a == "--instant-wallet");
    let db = string_arg(&args, "--db").unwrap_or(":memory:");
    let config_path = string_arg(&args, "--config");

    let mut config = match config_path {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    if instant_wallet {
        config.wallet.connect_latency_ms = 0;
        config.wallet.withdraw_latency_ms = 0;
        config.wallet.balance_latency_ms = 0;
    }

    if !ipc_mode {
        println!("$KNYE Clicker - clicker-runner");
        println!("  seed:    {seed}");
        println!("  ticks:   {ticks}");
        println!("  db:      {db}");
        println!("  config:  {}", config_path.unwrap_or("(built-in)"));
        println!();
    }

    let store = GameStore::open(db)?;
    store.migrate()?;

    let session_id = format!("session-{}", uuid::Uuid::new_v4().simple());
    let mut engine = GameEngine::build(session_id, seed, config, store, wall_clock_ms())?;

    if ipc_mode {
        run_ipc_loop(&mut engine)?;
    } else {
        engine.run_ticks(ticks);
        print_summary(&engine, ticks)?;
    }

    Ok(())
}

fn run_ipc_loop(engine: &mut GameEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    let mut session = Session {
        pad:    ClickPad::new(engine.config.click.clone()),
        drop:   None,
        quiz:   engine.album_quiz(),
        wallet: engine.simulated_wallet(),
    };

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{err_json}")?;
                stdout.flush()?;
                continue;
            }
        };
        if matches!(cmd, IpcCommand::Quit) {
            break;
        }

        let message = handle_command(engine, &mut session, cmd);
        let state = build_ui_state(engine, &session, message);
        writeln!(stdout, "{}", serde_json::to_string(&state)?)?;
        stdout.flush()?;
    }

    engine.save()?;
    Ok(())
}

/// Apply one command. Returns a short message for the player, if any.
fn handle_command(engine: &mut GameEngine, session: &mut Session, cmd: IpcCommand) -> Option<String> {
    match cmd {
        IpcCommand::GetState | IpcCommand::Quit => None,
        IpcCommand::Tick { count } => {
            engine.run_ticks(count);
            if let Some(drop) = session.drop.as_mut() {
                drop.update(engine.now_ms());
            }
            None
        }
        IpcCommand::Tap => match session.pad.tap(engine) {
            TapOutcome::Accepted { earned } => Some(format!("+{earned:.2}")),
            TapOutcome::CoolingDown => None,
            TapOutcome::NoEnergy => Some("Not enough energy".into()),
        },
        IpcCommand::BuyClick { index } => {
            (!engine.purchase_click_upgrade(index)).then(|| "Cannot buy that upgrade".into())
        }
        IpcCommand::BuyPassive { index } => {
            (!engine.purchase_passive_upgrade(index)).then(|| "Cannot buy that upgrade".into())
        }
        IpcCommand::Referral { code } => {
            let code = code.trim();
            if code.is_empty() {
                return Some("Enter a referral code".into());
            }
            engine.add_referral(code);
            Some(format!("Referral reward: {}", engine.config.referral_reward))
        }
        IpcCommand::Task { id } => {
            if !engine.config.tasks.iter().any(|t| t.id == id) {
                return Some(format!("Unknown task '{id}'"));
            }
            engine
                .complete_task(&id)
                .then(|| format!("Task reward: {}", engine.config.task_reward))
        }
        IpcCommand::ClaimAchievement { id } => {
            let unlocked = engine.claimable_achievements().iter().any(|a| a.id == id);
            if !unlocked {
                return Some("Achievement not unlocked".into());
            }
            engine.claim_achievement(&id).then(|| format!("Claimed {id}"))
        }
        IpcCommand::DailyBonus => claim_daily(engine, DailyClaim::Bonus),
        IpcCommand::DailyReward => claim_daily(engine, DailyClaim::Reward),
        IpcCommand::DropStart => {
            if session.drop.as_ref().is_some_and(|d| !d.is_over()) {
                return Some("A game is already running".into());
            }
            match engine.start_drop_game() {
                Some(drop) => {
                    session.drop = Some(drop);
                    None
                }
                None => Some(format!(
                    "Next game in {}",
                    format_countdown(engine.drop_game_remaining_ms())
                )),
            }
        }
        IpcCommand::DropCatch { item_id } => {
            let drop = session.drop.as_mut()?;
            drop.update(engine.now_ms());
            match drop.catch(item_id, engine.now_ms()) {
                CatchOutcome::Scored { points, combo } => Some(format!("+{points} (x{combo})")),
                CatchOutcome::Bomb => Some("Boom! Game over".into()),
                CatchOutcome::NoEnergy => Some("Not enough energy".into()),
                CatchOutcome::Missed | CatchOutcome::NotPlaying => None,
            }
        }
        IpcCommand::DropClaim => {
            let drop = session.drop.take()?;
            match engine.claim_drop_game(drop) {
                Ok(coins) => Some(format!("Drop game reward: {coins}")),
                Err(drop) => {
                    session.drop = Some(drop);
                    Some("The game is still running".into())
                }
            }
        }
        IpcCommand::QuizPoll => {
            let now = engine.now_ms();
            match session.quiz.poll(now) {
                Some(_) => None,
                None => Some(format!(
                    "Next question in {}s",
                    session.quiz.cooldown_remaining_ms(now) / 1000
                )),
            }
        }
        IpcCommand::QuizGuess { album } => match engine.answer_quiz(&mut session.quiz, &album) {
            GuessOutcome::Correct { reward } => Some(format!("Correct! +{reward}")),
            GuessOutcome::Incorrect => Some("Wrong answer".into()),
            GuessOutcome::Closed => Some("No question open".into()),
        },
        IpcCommand::ConnectWallet => match engine.connect_wallet(&mut session.wallet) {
            Ok(address) => Some(format!("Connected {address}")),
            Err(e) => {
                log::error!("Failed to connect wallet: {e}");
                Some("Failed to connect wallet".into())
            }
        },
        IpcCommand::Withdraw { amount } => match engine.withdraw(&mut session.wallet, &amount) {
            Ok(receipt) => Some(format!("Withdrawal sent: {}", receipt.transaction_id)),
            Err(e) => Some(e.to_string()),
        },
    }
}

fn claim_daily(engine: &mut GameEngine, claim: DailyClaim) -> Option<String> {
    match engine.claim_daily(claim) {
        Some(amount) => Some(format!("+{amount} coins")),
        None => Some(format!(
            "Come back in {}",
            format_clock(engine.daily_remaining_ms(claim))
        )),
    }
}

fn build_ui_state(engine: &GameEngine, session: &Session, message: Option<String>) -> UiState {
    let p = engine.progress();
    UiState {
        tick:                  engine.clock.current_tick,
        now_ms:                engine.now_ms(),
        coins:                 p.coins,
        energy:                p.energy,
        max_energy:            p.max_energy,
        click_upgrades:        p.click_upgrades.iter().map(UpgradeView::from).collect(),
        passive_upgrades:      p.passive_upgrades.iter().map(UpgradeView::from).collect(),
        daily_bonus_in:        format_clock(engine.daily_remaining_ms(DailyClaim::Bonus)),
        daily_reward_in:       format_clock(engine.daily_remaining_ms(DailyClaim::Reward)),
        drop_game_in:          format_countdown(engine.drop_game_remaining_ms()),
        drop_game:             session.drop.as_ref().map(DropGameView::from),
        quiz_options:          session.quiz.round().map(|r| r.options.clone()),
        claimable_achievements: engine
            .claimable_achievements()
            .iter()
            .map(|a| a.id.clone())
            .collect(),
        wallet_address:        p.wallet_address.clone(),
        stats:                 StatsSummary::from_progress(p),
        message,
    }
}

fn print_summary(engine: &GameEngine, ticks: u64) -> Result<()> {
    let stats = StatsSummary::from_progress(engine.progress());
    let events = engine.events()?;

    println!("=== RUN SUMMARY ===");
    println!("  session:          {}", engine.session_id);
    println!("  ticks run:        {ticks}");
    println!("  final tick:       {}", engine.clock.current_tick);
    println!("  coins:            {:.2}", engine.progress().coins);
    println!("  energy:           {:.0}/{:.0}", engine.progress().energy, engine.progress().max_energy);
    println!("  coins per click:  {:.2}", stats.coins_per_click);
    println!("  coins per second: {:.2}", stats.coins_per_second);
    println!("  total clicks:     {}", stats.total_clicks);
    println!("  upgrades bought:  {}", stats.total_upgrades_purchased);
    println!("  play time:        {}", stats.play_time);
    println!("  first played:     {}", stats.first_played);
    println!("  events logged:    {}", events.len());
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
