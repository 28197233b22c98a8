//! Terminal commands typed by the user.

use ul_core::controller::{Command, DisplayMode, ListState};

pub const HELP: &str = "\
Commands:
  more | m          load the next page
  end               scroll to the last row (loads more when idle)
  reload | r        clear the list and start over
  retry             repeat the request that failed
  list | grid       switch layout
  toggle | t        flip between list and grid
  show <n>          open the detail screen for row n
  back | b          leave the detail screen
  help | h          show this text
  quit | q          exit";

#[derive(Debug)]
pub enum Input {
    /// One or more controller commands, sent in order.
    Send(Vec<Command>),
    Help,
    Quit,
    Invalid(String),
}

pub fn parse(line: &str, state: &ListState) -> Input {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Input::Send(Vec::new());
    };

    match verb.to_ascii_lowercase().as_str() {
        "more" | "m" => Input::Send(vec![Command::FetchMore]),
        "end" => match state.profiles.last() {
            Some(last) => Input::Send(vec![Command::ItemDisplayed(last.id)]),
            None => Input::Send(vec![Command::FetchMore]),
        },
        "reload" | "r" => Input::Send(vec![Command::Reload]),
        "retry" => Input::Send(vec![Command::Retry]),
        "list" => Input::Send(vec![Command::SetDisplayMode(DisplayMode::List)]),
        "grid" => Input::Send(vec![Command::SetDisplayMode(DisplayMode::Grid)]),
        "toggle" | "t" => Input::Send(vec![Command::ToggleDisplayMode]),
        "back" | "b" => Input::Send(vec![Command::ClearSelection]),
        "show" | "s" => show(words.next(), state),
        "help" | "h" | "?" => Input::Help,
        "quit" | "q" | "exit" => Input::Quit,
        other => Input::Invalid(format!("unknown command {other:?}, type \"help\"")),
    }
}

/// Rows are numbered from 1 on screen.
fn show(arg: Option<&str>, state: &ListState) -> Input {
    let Some(index) = arg.and_then(|a| a.parse::<usize>().ok()) else {
        return Input::Invalid("usage: show <row number>".into());
    };
    match index.checked_sub(1).and_then(|i| state.profiles.get(i)) {
        Some(profile) => Input::Send(vec![
            Command::Select(profile.clone()),
            Command::ItemDisplayed(profile.id),
        ]),
        None => Input::Invalid(format!("no row {index}, {} loaded", state.profiles.len())),
    }
}
