use clap::Parser;
use log::{error, info};
use std::io::{self, BufRead, Write};

use client::api::HttpBackend;
use client::connection::{ConnectionManager, ConnectionState};
use client::views;
use shared::{Player, SortKey};

#[derive(Parser, Debug)]
#[command(author, version, about = "Live leaderboard terminal dashboard", long_about = None)]
struct Args {
    /// Backend base URL
    #[arg(short = 's', long, default_value = "http://127.0.0.1:3001")]
    server: String,

    /// Rows shown in the leaderboard
    #[arg(short = 'n', long, default_value = "10")]
    top: usize,

    /// Rank by "bits" or "wins"
    #[arg(long, default_value = "bits")]
    sort_by: String,
}

#[ntex::main]
async fn main() -> io::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let sort_by = SortKey::parse(&args.sort_by);

    info!("[Client] Connecting to {}", args.server);
    let mut manager = ConnectionManager::new(HttpBackend::new(&args.server));

    loop {
        match manager.connect().await {
            ConnectionState::Connected => {
                info!("[Client] Connected");
                render(manager.players(), manager.last_update(), sort_by, args.top);
                while let Some(update) = manager.next_update().await {
                    manager.apply_update(update);
                    render(manager.players(), manager.last_update(), sort_by, args.top);
                }
                error!("[Client] Push channel closed");
            }
            _ => error!("[Client] Could not reach {}", args.server),
        }
        if !wait_for_retry()? {
            break;
        }
    }
    Ok(())
}

fn render(players: &[Player], last_update: Option<&str>, sort_by: SortKey, depth: usize) {
    let summary = views::home(players);
    println!();
    println!(
        "── spinzone · {} players · {} bits · {} wins ──",
        summary.total_players, summary.total_bits, summary.total_wins
    );
    if let Some(at) = last_update {
        println!("last update: {}", at);
    }
    println!(
        "{:>4}  {:<20} {:>10} {:>6}  {}",
        "#", "player", "bits", "wins", "clan"
    );
    for entry in views::leaderboard(players, sort_by, Some(depth)) {
        println!(
            "{:>4}  {:<20} {:>10} {:>6}  {}",
            entry.rank, entry.player.user_id, entry.player.bits, entry.player.wins, entry.player.clan
        );
    }
}

/// Block until the user asks for a retry. EOF means quit.
fn wait_for_retry() -> io::Result<bool> {
    eprint!("Press enter to retry, ctrl-d to quit: ");
    io::stderr().flush()?;
    let mut line = String::new();
    Ok(io::stdin().lock().read_line(&mut line)? > 0)
}
