use arena_client::app::GameSession;
use arena_client::config::ClientArgs;
use arena_client::network::{ConnectTarget, WsConnector};
use clap::Parser;
use log::{error, info};
use macroquad::window::Conf;

fn window_conf(args: &ClientArgs) -> Conf {
    Conf {
        window_title: format!("Arena - {}", args.room),
        window_width: args.width,
        window_height: args.height,
        window_resizable: true,
        ..Default::default()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = ClientArgs::parse();
    let game_config = args.game_config()?;
    let connection_config = args.connection_config()?;

    info!("Starting client...");
    info!("Server: {}", connection_config.server);
    info!("Room: {} as {}", args.room, args.player);
    info!("Controls: WASD/arrows to move, drag to aim and release to shoot");
    info!("R to respawn, Escape to leave");

    let connector = WsConnector::new()?;
    let session = GameSession::new(connector, game_config, connection_config, args.player.clone());
    let target = ConnectTarget::new(args.room.clone(), args.token.clone());

    macroquad::Window::from_config(window_conf(&args), async move {
        match session.run(target).await {
            Ok(exit) => info!("Session finished: {}", exit.message()),
            Err(e) => error!("Session failed: {}", e),
        }
    });

    Ok(())
}
