mod settings;

use std::{str::FromStr, sync::Arc};

use adapters::{CategoryFactProvider, CommandSpeech, KeywordedFactsClient, RandomFactsClient, WebTranslateClient};
use anyhow::Result;
use clap::Parser;
use session_core::{FactSession, SessionEvent, SessionSnapshot};
use shared::domain::{FactCategory, Language};
use storage::Storage;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

#[derive(Parser, Debug)]
#[command(about = "Interactive trivia fact browser")]
struct Args {
    /// Starting category (random, general, interesting, surprising,
    /// animals, history, science).
    #[arg(long, default_value = "random")]
    category: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();
    let settings = settings::load_settings();

    let generic = Arc::new(RandomFactsClient::new(&settings.generic_facts_url)?);
    let keyworded = Arc::new(KeywordedFactsClient::new(
        &settings.keyworded_facts_url,
        &settings.facts_api_key,
    )?);
    let provider = Arc::new(CategoryFactProvider::new(generic, keyworded));
    let translator = Arc::new(WebTranslateClient::new(&settings.translate_url)?);
    let speech = Arc::new(CommandSpeech::new(&settings.speech_program));
    let store = Arc::new(Storage::new(&settings.database_url).await?);

    let session = FactSession::new_with_dependencies(provider, translator, speech, store);
    session.load_persisted().await?;

    let mut events = session.subscribe_events();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                SessionEvent::SpeechStateChanged(false) => println!("(speech finished)"),
                SessionEvent::Error(message) => println!("(error: {message})"),
                _ => {}
            }
        }
    });

    if let Ok(category) = FactCategory::from_str(&args.category) {
        session.change_category(category).await?;
    } else {
        warn!(category = %args.category, "cli: unknown starting category, using random");
        session.advance().await?;
    }
    print_current(&session.snapshot().await);

    println!("Commands: next, back, fav, unfav <i>, favs, translate <es|ru|sv>, reset, speak, stop, category <name>, clear, color <hex>, quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else {
            continue;
        };
        let argument = parts.next();

        match command {
            "next" => {
                session.advance().await?;
                print_current(&session.snapshot().await);
            }
            "back" => {
                session.retreat().await;
                print_current(&session.snapshot().await);
            }
            "fav" => {
                session.toggle_favorite().await?;
                print_current(&session.snapshot().await);
            }
            "unfav" => match argument.and_then(|raw| raw.parse::<usize>().ok()) {
                Some(index) => {
                    session.remove_favorite(index).await?;
                    print_favorites(&session.snapshot().await);
                }
                None => println!("usage: unfav <index>"),
            },
            "favs" => print_favorites(&session.snapshot().await),
            "translate" => match argument.and_then(Language::from_code) {
                Some(language) => {
                    session.translate_current_fact(language).await?;
                    print_current(&session.snapshot().await);
                }
                None => println!("usage: translate <es|ru|sv>"),
            },
            "reset" => {
                session.reset_translation().await;
                print_current(&session.snapshot().await);
            }
            "speak" => session.speak_current_fact().await?,
            "stop" => session.stop_speaking().await,
            "category" => match argument.map(FactCategory::from_str) {
                Some(Ok(category)) => {
                    session.change_category(category).await?;
                    print_current(&session.snapshot().await);
                }
                _ => println!("categories: random, general, interesting, surprising, animals, history, science"),
            },
            "clear" => {
                session.clear_history().await;
                println!("history cleared");
            }
            "color" => match argument {
                Some(color) => session.set_background_color(color).await?,
                None => println!("usage: color <hex>"),
            },
            "quit" | "exit" => break,
            other => println!("unknown command: {other}"),
        }
    }

    session.stop_speaking().await;
    Ok(())
}

fn print_current(snapshot: &SessionSnapshot) {
    match &snapshot.current_fact {
        Some(fact) => {
            let marker = if fact.is_favorite { " *" } else { "" };
            println!("[{}]{} {}", fact.category, marker, fact.display_text());
        }
        None => match &snapshot.error_message {
            Some(message) => println!("no fact available: {message}"),
            None => println!("no fact loaded yet"),
        },
    }
    if snapshot.can_retreat {
        println!("  (back available)");
    }
}

fn print_favorites(snapshot: &SessionSnapshot) {
    if snapshot.favorites.is_empty() {
        println!("no favorites saved");
        return;
    }
    for (index, fact) in snapshot.favorites.iter().enumerate() {
        println!("{index}: [{}] {}", fact.category, fact.text);
    }
}
