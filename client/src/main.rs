use clap::Parser;
use client::game::GameLoop;
use client::input::InputManager;
use client::network::Transport;
use client::rendering::{HudInfo, Renderer};
use client::session::{
    launch, LaunchContext, Mode, OFFLINE_LEFT_PLAYER, OFFLINE_RIGHT_PLAYER,
};
use client::utils::get_timestamp;
use log::{error, info, warn};
use macroquad::prelude::*;
use shared::{ControlAction, GameConfig, Message};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// WebSocket URL of the match server
    #[arg(short = 's', long, default_value = "ws://127.0.0.1:8080")]
    server: String,

    /// Player id of this client
    #[arg(short = 'p', long)]
    player_id: Option<String>,

    /// JSON game configuration; built-in defaults when omitted
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Two players on one keyboard, no server
    #[arg(long)]
    offline: bool,

    /// Simulate network latency in milliseconds
    #[arg(short = 'l', long, default_value = "0")]
    fake_ping: u64,

    /// Window width
    #[arg(short = 'w', long, default_value = "800")]
    width: i32,

    /// Window height (no short flag to avoid conflict with --help)
    #[arg(long, default_value = "600")]
    height: i32,

    /// Seed for ball serves
    #[arg(long)]
    seed: Option<u64>,
}

fn window_conf() -> Conf {
    let args = Args::parse();
    Conf {
        window_title: "Paddle".to_string(),
        window_width: args.width,
        window_height: args.height,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let renderer = Renderer::new(GameConfig::new().world);

    if let Err(e) = run(args).await {
        error!("{}", e);
        let text = format!("Error: {}", e);
        while !is_key_pressed(KeyCode::Escape) {
            renderer.render_message(&text);
            next_frame().await;
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::new(),
    };
    let seed = args.seed.unwrap_or_else(get_timestamp);
    let renderer = Renderer::new(config.world);

    let (context, mut transport, mut input_manager) = if args.offline {
        info!("Controls: W/S for the left paddle, Up/Down for the right paddle");
        let context = LaunchContext::offline(config, get_timestamp() + 3_000, seed);
        let input = InputManager::offline(
            OFFLINE_LEFT_PLAYER.to_string(),
            OFFLINE_RIGHT_PLAYER.to_string(),
        );
        (context, None, input)
    } else {
        info!("Connecting to: {}", args.server);
        if args.fake_ping > 0 {
            info!("Simulating {}ms latency", args.fake_ping);
        }
        let mut transport = Transport::connect(&args.server, args.fake_ping)?;
        let pending_start = wait_for_start(&mut transport, &renderer).await;
        let context = LaunchContext {
            mode: Mode::Networked,
            config: Some(config),
            local_player: args.player_id.clone(),
            pending_start,
            transport_open: transport.is_open(),
            seed,
        };
        let input = InputManager::networked(args.player_id.clone().unwrap_or_default());
        (context, Some(transport), input)
    };

    let mut game = launch(context, get_timestamp())?;
    info!("Controls: H toggles the debug overlay, Escape quits");

    while !is_key_pressed(KeyCode::Escape) {
        if let Some(transport) = transport.as_mut() {
            for message in transport.drain() {
                game.handle_message(message);
            }
        }

        let outgoing = input_manager.update(&mut game);
        if let Some(transport) = &transport {
            for message in outgoing {
                transport.send(message);
            }
        }

        let now = get_timestamp();
        game.advance(now);

        if game.release_if_stopped() {
            info!("Match over, closing connection");
            transport = None;
        }

        let hud = input_manager
            .show_hud()
            .then(|| hud_info(&game, transport.as_ref(), args.fake_ping));
        renderer.render(&game, now, hud.as_ref());

        next_frame().await;
    }

    game.destroy();
    Ok(())
}

/// Shows a waiting screen until the server announces the match.
async fn wait_for_start(
    transport: &mut Transport,
    renderer: &Renderer,
) -> Option<shared::ControlPayload> {
    loop {
        for message in transport.drain() {
            match message {
                Message::Control(control) if control.action == ControlAction::Start => {
                    return Some(control);
                }
                Message::Control(_) | Message::Unrecognized { .. } => {
                    warn!("Match ended before it started");
                    return None;
                }
                Message::Player(player) => info!("{} is here", player.display_name),
                _ => {}
            }
        }

        if !transport.is_open() || is_key_pressed(KeyCode::Escape) {
            return None;
        }

        renderer.render_message("Waiting for the match to start...");
        next_frame().await;
    }
}

fn hud_info(game: &GameLoop, transport: Option<&Transport>, fake_ping_ms: u64) -> HudInfo {
    HudInfo {
        frame: game.get_current_frame(),
        authoritative_frame: game.board().authoritative_frame(),
        transport_open: transport.map(Transport::is_open),
        fake_ping_ms,
    }
}
