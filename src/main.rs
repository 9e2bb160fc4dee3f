use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::{Event, KeyCode, KeyEventKind};
use tracing_subscriber::EnvFilter;

use keywind::{Config, Player, PlayerState, PlayerUpdate, TracingSink};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("keywind=info".parse()?))
        .init();

    let mut args = std::env::args().skip(1).peekable();
    let mut config = Config::default();
    if args.peek().map(String::as_str) == Some("--config") {
        args.next();
        let path = args.next().ok_or("--config requires a path")?;
        config = Config::load(&PathBuf::from(path))?;
    }

    let tracks: Vec<PathBuf> = args.map(PathBuf::from).collect();
    if tracks.is_empty() {
        eprintln!("usage: keywind [--config config.ron] <events.csv> [more.csv ...]");
        std::process::exit(2);
    }

    let mut player = Player::new(Box::new(TracingSink));

    tracing::info!(
        lead_in = config.lead_in,
        "focus the instrument window; playback starts after the lead-in"
    );
    std::thread::sleep(Duration::from_secs_f64(config.lead_in));

    player.play_playlist(tracks, 0, config);

    crossterm::terminal::enable_raw_mode()?;
    let result = control_loop(&mut player);
    crossterm::terminal::disable_raw_mode()?;
    result
}

/// Terminal transport: space pauses/resumes, `q` or Esc stops.
fn control_loop(player: &mut Player) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        while let Ok(update) = player.updates().try_recv() {
            match update {
                PlayerUpdate::TrackStarted { index, path } => {
                    tracing::info!(index, track = %path.display(), "track started");
                }
                PlayerUpdate::Progress { index, elapsed, total } => {
                    tracing::debug!(index, elapsed, total, "progress");
                }
                PlayerUpdate::Finished => {
                    tracing::info!("playback finished");
                    return Ok(());
                }
                PlayerUpdate::Cancelled => {
                    tracing::info!("playback stopped");
                    return Ok(());
                }
            }
        }

        if crossterm::event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = crossterm::event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key.code {
                    KeyCode::Char(' ') => match player.state() {
                        PlayerState::Paused => {
                            tracing::info!("resumed");
                            player.resume();
                        }
                        PlayerState::Running => {
                            tracing::info!("paused");
                            player.pause();
                        }
                        PlayerState::Idle => {}
                    },
                    KeyCode::Char('q') | KeyCode::Esc => {
                        player.stop();
                        return Ok(());
                    }
                    _ => {}
                }
            }
        }
    }
}
