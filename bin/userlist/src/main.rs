//! # userlist
//!
//! Terminal front-end: wires the HTTP gateway into a list controller task,
//! turns typed commands into controller commands and redraws on every
//! published state change.

mod input;

use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use ul_configs::{init_tracing, AppConfig};
use ul_core::controller::{spawn, Command, ControllerHandle, ListController, ListState};
use ul_gateway_http::{HttpGatewayConfig, HttpProfileGateway};

use crate::input::{parse, Input, HELP};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    init_tracing(&config.log);

    let gateway = HttpProfileGateway::new(HttpGatewayConfig {
        base_url: config.api.base_url.clone(),
        timeout: config.timeout(),
        nationality: config.api.nationality.clone(),
    })
    .context("building HTTP client")?;

    let controller =
        ListController::new(Arc::new(gateway)).with_batch_size(config.list.batch_size);
    let ControllerHandle {
        commands,
        mut state,
        task,
    } = spawn(controller);

    tracing::info!(
        base_url = %config.api.base_url,
        batch_size = config.list.batch_size,
        "userlist started"
    );
    println!("{HELP}\n");

    // First appearance of the list.
    commands.send(Command::FetchMore).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            changed = state.changed() => {
                if changed.is_err() {
                    tracing::warn!("controller stopped unexpectedly");
                    break;
                }
                let snapshot = state.borrow_and_update().clone();
                draw(&snapshot)?;
            }
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    break;
                };
                let input = parse(&line, &state.borrow());
                match input {
                    Input::Send(batch) => {
                        for command in batch {
                            commands.send(command).await?;
                        }
                    }
                    Input::Help => println!("{HELP}"),
                    Input::Quit => break,
                    Input::Invalid(message) => eprintln!("{message}"),
                }
            }
        }
    }

    drop(commands);
    task.await.context("controller task failed")?;
    Ok(())
}

fn draw(state: &ListState) -> anyhow::Result<()> {
    let screen = match &state.selected {
        Some(profile) => ul_ui::render_detail(profile)?,
        None => ul_ui::render(state)?,
    };
    println!("\n{screen}");
    Ok(())
}
