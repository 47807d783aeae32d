use std::io::{self, BufRead, Write};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context};
use chrono::Local;
use console_core::{update, AppState, Msg, SearchQuery};
use console_engine::{EngineHandle, HttpBackend};
use console_logging::{console_info, console_warn};

use super::config::{config_path, ConsoleConfig};
use super::effects::EffectRunner;
use super::input::{parse_command, Command, QueryDefaults, HELP};
use super::logging;
use super::render::render;

/// How long the loop waits for input before draining engine events again.
const TICK: Duration = Duration::from_millis(75);

pub fn run_app() -> anyhow::Result<()> {
    let path = config_path(std::env::args().skip(1));
    let config = ConsoleConfig::load(&path).context("loading console configuration")?;
    logging::initialize(config.log_destination);
    console_info!("Configuration loaded from {:?}", path);

    let backend = HttpBackend::new(config.client_settings())
        .map_err(|err| anyhow!("backend {}: {}", config.base_url, err))?;
    let engine = EngineHandle::new(Arc::new(backend), config.engine_settings());
    let runner = EffectRunner::new(engine);

    let defaults = QueryDefaults {
        module: config.module.clone(),
        page_size: config.page_size,
    };
    let commands = spawn_input_reader(defaults);

    let mut state = AppState::new();
    if config.auto_refresh_ms.is_some() {
        state = dispatch(
            state,
            Msg::AutoRefreshChanged {
                interval_ms: config.auto_refresh_ms,
            },
            &runner,
        );
    }
    if let Some(module) = &config.module {
        let mut query = SearchQuery::new(module.clone());
        query.page_size = config.page_size;
        state = dispatch(state, Msg::SearchSubmitted(query), &runner);
    }

    println!("{HELP}");
    loop {
        match commands.recv_timeout(TICK) {
            Ok(Command::Dispatch(msg)) => state = dispatch(state, msg, &runner),
            Ok(Command::Help) => println!("{HELP}"),
            Ok(Command::Invalid(message)) => eprintln!("{message}"),
            Ok(Command::Quit) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                state = dispatch(state, Msg::Tick, &runner);
            }
        }

        for msg in runner.drain() {
            state = dispatch(state, msg, &runner);
        }

        if state.consume_dirty() {
            let timestamp = Local::now().format("%H:%M:%S").to_string();
            print!("{}", render(&state.view(), &timestamp));
            let _ = io::stdout().flush();
        }
    }

    console_info!("Console closed");
    Ok(())
}

fn dispatch(state: AppState, msg: Msg, runner: &EffectRunner) -> AppState {
    let (state, effects) = update(state, msg);
    runner.enqueue(effects);
    state
}

fn spawn_input_reader(defaults: QueryDefaults) -> mpsc::Receiver<Command> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    console_warn!("Could not read stdin: {}", err);
                    break;
                }
            };
            let command = parse_command(&line, &defaults);
            let quit = command == Command::Quit;
            if tx.send(command).is_err() || quit {
                break;
            }
        }
    });
    rx
}
