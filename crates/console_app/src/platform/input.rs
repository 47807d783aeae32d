//! Line commands typed on stdin.

use console_core::{Msg, ProcessId, SearchQuery};

pub const HELP: &str = "\
commands:
  search [module] [keyword ...] [-- where-sql]   run a new search
  more                                           load the next page
  refresh                                        reload the first page
  auto <ms>|off                                  set or clear auto refresh
  watch <process-id>                             follow a Logstash process task
  unwatch <process-id>                           stop following it
  help                                           show this text
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Dispatch(Msg),
    Help,
    Quit,
    Invalid(String),
}

/// Query defaults taken from configuration.
#[derive(Debug, Clone, Default)]
pub struct QueryDefaults {
    pub module: Option<String>,
    pub page_size: u32,
}

pub fn parse_command(line: &str, defaults: &QueryDefaults) -> Command {
    let line = line.trim();
    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    match verb {
        "" => Command::Dispatch(Msg::NoOp),
        "search" | "s" => parse_search(rest, defaults),
        "more" | "m" => Command::Dispatch(Msg::LoadMoreRequested),
        "refresh" | "r" => Command::Dispatch(Msg::RefreshRequested),
        "auto" => match rest {
            "off" | "0" => Command::Dispatch(Msg::AutoRefreshChanged { interval_ms: None }),
            ms => match ms.parse::<u64>() {
                Ok(interval_ms) => Command::Dispatch(Msg::AutoRefreshChanged {
                    interval_ms: Some(interval_ms),
                }),
                Err(_) => Command::Invalid(format!("not an interval: {ms:?}")),
            },
        },
        "watch" => parse_process_id(rest)
            .map(|process_id| Command::Dispatch(Msg::TaskWatchRequested { process_id }))
            .unwrap_or_else(Command::Invalid),
        "unwatch" => parse_process_id(rest)
            .map(|process_id| Command::Dispatch(Msg::TaskWatchCancelled { process_id }))
            .unwrap_or_else(Command::Invalid),
        "help" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => Command::Invalid(format!("unknown command {other:?}, try help")),
    }
}

fn parse_search(rest: &str, defaults: &QueryDefaults) -> Command {
    let (terms, where_sql) = match rest.split_once("--") {
        Some((terms, sql)) => (terms, Some(sql.trim())),
        None => (rest, None),
    };
    let mut words = terms.split_whitespace().map(str::to_string);

    let module = match (words.next(), &defaults.module) {
        (Some(module), _) => module,
        (None, Some(module)) => module.clone(),
        (None, None) => return Command::Invalid("search needs a module".to_string()),
    };

    let mut query = SearchQuery::new(module);
    query.keywords = words.collect();
    query.where_sqls = where_sql
        .filter(|sql| !sql.is_empty())
        .map(|sql| vec![sql.to_string()])
        .unwrap_or_default();
    if defaults.page_size > 0 {
        query.page_size = defaults.page_size;
    }
    Command::Dispatch(Msg::SearchSubmitted(query))
}

fn parse_process_id(raw: &str) -> Result<ProcessId, String> {
    raw.parse()
        .map_err(|_| format!("not a process id: {raw:?}"))
}
