mod cli;
mod render;
mod terminal;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use agora_core::{
    AgoraConfig, BoardError, BoardSession, ErrorKind, NewAgendaItem, ShareTtl, SystemClock,
};
use agora_store::StoreChain;

use cli::{Cli, Command};
use terminal::TerminalPassphrase;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Logs go to stderr; stdout carries links and boards
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_filter().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = AgoraConfig::from_env().context("invalid AGORA_* configuration")?;
    let store = StoreChain::standard(&config.db_path, &config.store_dir);
    info!("Board storage: {}", store.available().join(" -> "));

    let mut session = BoardSession::new(config, store, Arc::new(SystemClock));

    if let Err(e) = run(&mut session, cli.command).await {
        match e.kind() {
            ErrorKind::NotFound => {
                eprintln!("{}", e);
                eprintln!("The board may have expired from local storage.");
                eprintln!("Create a new one with `agora create`.");
            }
            ErrorKind::ExpiredLink => eprintln!("{}", e),
            ErrorKind::Crypto => {
                eprintln!("Could not open the link: wrong passphrase or damaged link.")
            }
            ErrorKind::Cancelled => eprintln!("Cancelled."),
            _ => eprintln!("error: {}", e),
        }
        std::process::exit(1);
    }
    Ok(())
}

async fn run(session: &mut BoardSession, command: Command) -> Result<(), BoardError> {
    match command {
        Command::Create { title, creator } => {
            let board = session.create_board(&title, &creator)?;
            println!("{}", board.id);
        }
        Command::Join { board_id, name } => {
            session.join_board(&board_id, &name)?;
            print_board(session)?;
        }
        Command::AddItem(args) => {
            session.load_board(&args.board_id)?;
            session.act_as(&args.name)?;
            let id = session.add_agenda_item(NewAgendaItem {
                item_type: args.item_type,
                title: args.title,
                description: args.description,
                estimated_minutes: args.minutes,
                presenter: args.presenter,
                voting_threshold: args.threshold.map(Into::into),
            })?;
            println!("{}", id);
        }
        Command::Vote { board_id, item_id, option, name } => {
            session.load_board(&board_id)?;
            session.act_as(&name)?;
            let status = session.vote(&item_id, &option)?;
            println!("{}", status.as_str());
        }
        Command::Complete { board_id, item_id, name } => {
            session.load_board(&board_id)?;
            session.act_as(&name)?;
            session.complete_item(&item_id)?;
        }
        Command::Show { board_id, json } => {
            session.load_board(&board_id)?;
            if json {
                let board = session.snapshot()?;
                let out = serde_json::to_string_pretty(&board)
                    .map_err(|e| BoardError::Storage(anyhow::anyhow!(e)))?;
                println!("{}", out);
            } else {
                print_board(session)?;
            }
        }
        Command::Share(args) => {
            session.load_board(&args.board_id)?;
            let ttl = match args.ttl_days {
                Some(days) => ShareTtl::from_days(days)?,
                None => session.config().share_ttl,
            };
            let url = session
                .share_with_prompt(&TerminalPassphrase::new(ttl, args.hint))
                .await?;
            println!("{}", url);
        }
        Command::Open { url, name } => {
            let provider = TerminalPassphrase::new(ShareTtl::default(), None);
            let board_id = session.open_url(&url, &provider).await?.id.clone();
            if let Some(name) = name {
                session.join_board(&board_id, &name)?;
            }
            print_board(session)?;
        }
        Command::Watch { board_id } => {
            session.load_board(&board_id)?;
            print_board(session)?;
            let period = session.config().sync_interval;
            tokio::select! {
                _ = agora_core::run_sync_loop(session, period, |board| {
                    let stats = agora_core::MeetingAnalytics::compute(board);
                    println!("{}", render::board(board, &stats));
                }) => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("Stopped watching {}", board_id);
                }
            }
        }
        Command::Boards => {
            for id in session.cached_board_ids()? {
                println!("{}", id);
            }
        }
        Command::Types => {
            print!("{}", render::type_catalog());
        }
    }
    Ok(())
}

fn print_board(session: &BoardSession) -> Result<(), BoardError> {
    let board = session.snapshot()?;
    let stats = session.analytics()?;
    println!("{}", render::board(&board, &stats));
    Ok(())
}
