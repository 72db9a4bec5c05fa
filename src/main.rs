//! Survivor Core headless runner
//!
//! Drives a full run with scripted input at a fixed timestep, picks the
//! first offered reward whenever a panel opens and persists the best time,
//! including runs cut short by the time limit.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::path::PathBuf;

    use clap::Parser;
    use glam::Vec2;

    use survivor_core::records::format_time;
    use survivor_core::sim::{GameEvent, SessionPhase, SimulationState, Snapshot, TickInput, choose_reward, step};
    use survivor_core::{BestTime, DifficultyProfile};

    /// Simulation step used by the runner
    const SIM_DT: f32 = 1.0 / 60.0;
    /// Seconds between progress log lines
    const REPORT_EVERY: f32 = 30.0;

    #[derive(Parser, Debug)]
    #[command(author, version, about, long_about = None)]
    struct Args {
        /// Difficulty preset (easy, normal, hard, nightmare) or a JSON profile path
        #[arg(short, long, default_value = "normal")]
        difficulty: String,

        /// Run seed; random when omitted
        #[arg(short, long)]
        seed: Option<u64>,

        /// Stop after this many simulated seconds
        #[arg(short = 't', long, default_value_t = 600.0)]
        max_time: f32,

        /// Best-time file
        #[arg(short, long, default_value = BestTime::FILE_NAME)]
        records: PathBuf,

        /// Print the final snapshot as JSON
        #[arg(long)]
        json: bool,
    }

    /// Slow circle around the origin, with a dash every few seconds
    fn scripted_input(elapsed: f32) -> TickInput {
        let angle = elapsed * 0.35;
        TickInput {
            movement: Vec2::new(-angle.sin(), angle.cos()),
            dash: (elapsed % 4.0) < SIM_DT,
            ..Default::default()
        }
    }

    pub fn run() -> survivor_core::Result<()> {
        let args = Args::parse();
        let profile = DifficultyProfile::resolve(&args.difficulty)?;
        let mut best = BestTime::load_or_default(&args.records);

        let mut state = match args.seed {
            Some(seed) => SimulationState::with_seed(profile, best.seconds, seed),
            None => SimulationState::new(profile, best.seconds),
        };
        log::info!(
            "Difficulty {}, best time {}",
            args.difficulty,
            format_time(best.seconds)
        );

        let mut next_report = REPORT_EVERY;
        while !state.is_over() && state.elapsed < args.max_time {
            let input = scripted_input(state.elapsed);
            step(&mut state, &input, SIM_DT);

            if state.phase == SessionPhase::RewardOpen {
                choose_reward(&mut state, 0)?;
            }

            for event in state.take_events() {
                match event {
                    GameEvent::NewBestTime { seconds } => {
                        best.record(seconds, &args.records)?;
                    }
                    GameEvent::WeaponEvolved { from, to } => {
                        log::debug!("{} evolved into {}", from.name(), to.name());
                    }
                    _ => {}
                }
            }

            if state.elapsed >= next_report {
                log::info!(
                    "{} survived, level {}, {} kills, {} enemies",
                    format_time(state.elapsed),
                    state.player.level,
                    state.kills,
                    state.store.alive_enemy_count()
                );
                next_report += REPORT_EVERY;
            }
        }

        // Runs stopped by the time limit never emit NewBestTime
        best.record(state.elapsed, &args.records)?;

        println!(
            "Survived {} ({} kills, level {}), best {}",
            format_time(state.elapsed),
            state.kills,
            state.player.level,
            format_time(best.seconds)
        );
        if args.json {
            println!("{}", Snapshot::capture(&state).to_json()?);
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    if let Err(e) = headless::run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Hosts embed the library directly; there is no wasm runner
}
