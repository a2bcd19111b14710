use anyhow::Result;
use planchat::api::ChatClient;
use planchat::config::Config;
use planchat::error::SubmitRejected;
use planchat::logging::init_tracing;
use planchat::state::{ConversationController, TurnUpdate};
use planchat::ui::TerminalRenderer;
use std::io::Stdout;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

type Controller = ConversationController<TerminalRenderer<Stdout>>;

enum LoopInput {
    Line(Option<String>),
    Update(Option<TurnUpdate>),
    Interrupt,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::load()?;
    config.validate()?;
    let client = ChatClient::new(&config)?;
    let (mut controller, mut update_rx) =
        ConversationController::new(client, TerminalRenderer::stdout());

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        run_interactive(&mut controller, &mut update_rx).await;
        return Ok(());
    }

    controller.submit(&args.join(" "))?;
    drain_or_interrupt(&mut controller, &mut update_rx).await;
    Ok(())
}

/// Run the active turn to completion; Ctrl-C cancels it instead.
async fn drain_or_interrupt(
    controller: &mut Controller,
    update_rx: &mut mpsc::UnboundedReceiver<TurnUpdate>,
) {
    if controller
        .run_until_idle_or(update_rx, tokio::signal::ctrl_c())
        .await
    {
        controller.renderer_mut().notice("turn cancelled");
    }
}

async fn run_interactive(
    controller: &mut Controller,
    update_rx: &mut mpsc::UnboundedReceiver<TurnUpdate>,
) {
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if input_tx.send(line).is_err() {
                break;
            }
        }
    });

    loop {
        let input = tokio::select! {
            line = input_rx.recv() => LoopInput::Line(line),
            update = update_rx.recv() => LoopInput::Update(update),
            _ = tokio::signal::ctrl_c() => LoopInput::Interrupt,
        };

        match input {
            LoopInput::Line(Some(line)) => match controller.submit(&line) {
                Ok(_) | Err(SubmitRejected::Empty) => {}
                Err(SubmitRejected::Busy) => controller
                    .renderer_mut()
                    .notice("busy - turn in progress, input discarded"),
            },
            LoopInput::Line(None) => {
                drain_or_interrupt(controller, update_rx).await;
                break;
            }
            LoopInput::Update(Some(update)) => controller.handle_update(update),
            LoopInput::Update(None) => break,
            LoopInput::Interrupt => {
                if !controller.cancel() {
                    break;
                }
                controller.renderer_mut().notice("turn cancelled");
            }
        }
    }
}
