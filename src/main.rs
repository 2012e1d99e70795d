use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;

use drama::catalog::{self, Section, ViewState};
use drama::chapters::clamp_chapter;
use drama::types::{ChapterList, WatchResult};
use drama::{logger, sample, util, DramaClient};

#[derive(Parser, Debug)]
#[command(name = "drama", version, about = "Drama CLI: browse, search and play short-drama episodes", long_about = None)]
struct Cli {
    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging on stderr
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Recommended titles
    #[command(name = "foryou", visible_alias = "fy")]
    ForYou { #[arg(short, long, default_value_t = 1)] page: u32 },

    /// Newest titles
    New {
        #[arg(short, long, default_value_t = 1)]
        page: u32,
        #[arg(short = 'n', long, default_value_t = 10)]
        size: u32,
    },

    /// Ranking list
    Rank { #[arg(short, long, default_value_t = 1)] page: u32 },

    /// Browse a category
    Classify {
        genre: String,
        #[arg(short, long, default_value_t = 1)]
        page: u32,
        #[arg(short, long, default_value_t = 1)]
        sort: u32,
    },

    /// Search titles
    Search {
        query: String,
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },

    /// Autocomplete suggestions
    Suggest { query: String },

    /// For-you, new and trending sections in one go
    Home,

    /// Episode list of a title
    #[command(visible_alias = "ep")]
    Chapters { book_id: String },

    /// Resolve the playable URL of an episode (0-based)
    Watch {
        book_id: String,
        #[arg(default_value_t = 0)]
        chapter: u32,
    },

    /// Details of a title
    Info { book_id: String },

    /// Open an episode in the system player
    #[command(visible_alias = "play")]
    View {
        book_id: String,
        #[arg(default_value_t = 0)]
        chapter: u32,
    },
}

#[derive(Debug, Serialize)]
struct WatchView<'a> {
    watch: &'a WatchResult,
    chapters: &'a ChapterList,
}

fn show_section(name: &str, section: &Section, json: bool) {
    if json {
        util::print_output(section, true);
    } else {
        util::print_section(name, section);
    }
}

/// Watch + chapters for one episode; an index past the end restarts at 0.
async fn resolve_episode(client: &DramaClient, book_id: &str, chapter: u32) -> (WatchResult, ChapterList) {
    let (watch, chapters) = tokio::join!(client.watch(book_id, chapter), client.chapters(book_id));
    let clamped = clamp_chapter(chapter, chapters.total);
    if clamped != chapter && watch.success {
        return (client.watch(book_id, clamped).await, chapters);
    }
    (watch, chapters)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(cli.debug);
    let client = DramaClient::from_env()?;
    let pb = util::spinner("Contacting server...", cli.json);

    match cli.command {
        Commands::ForYou { page } => {
            let section = Section::or_sample("for_you", client.for_you(page).await, sample::items);
            pb.finish_and_clear();
            show_section("For you", &section, cli.json);
        }
        Commands::New { page, size } => {
            let result = client.new_releases(page, size).await;
            let section = Section::or_sample("new", result, || sample::slice(0, size as usize));
            pb.finish_and_clear();
            show_section("New", &section, cli.json);
        }
        Commands::Rank { page } => {
            let section = Section::or_sample("rank", client.ranking(page).await, sample::items);
            pb.finish_and_clear();
            show_section("Ranking", &section, cli.json);
        }
        Commands::Classify { genre, page, sort } => {
            let section = Section::or_sample("classify", client.by_category(&genre, page, sort).await, sample::items);
            pb.finish_and_clear();
            show_section(&genre, &section, cli.json);
        }
        Commands::Search { query, page } => {
            let out = catalog::search(&client, &query, page).await;
            pb.finish_and_clear();
            if cli.json {
                util::print_output(&out, true);
            } else {
                util::print_section(&format!("Search \"{}\"", out.query), &out.section);
            }
        }
        Commands::Suggest { query } => {
            let suggestions = client.suggestions(&query).await.unwrap_or_else(|e| {
                tracing::warn!(error = %format!("{e:#}"), "suggest request failed");
                Vec::new()
            });
            pb.finish_and_clear();
            if cli.json {
                util::print_output(&suggestions, true);
            } else {
                for s in &suggestions {
                    println!("{}", s);
                }
            }
        }
        Commands::Home => {
            let mut view = ViewState::new();
            let applied = catalog::refresh_home(&client, &mut view).await;
            pb.finish_and_clear();
            match view.get().filter(|_| applied) {
                Some(home) if cli.json => util::print_output(home, true),
                Some(home) => util::print_home(home),
                None => println!("{}", "Home view was closed before loading finished".yellow()),
            }
        }
        Commands::Chapters { book_id } => {
            let list = client.chapters(&book_id).await;
            pb.finish_and_clear();
            if cli.json {
                util::print_output(&list, true);
            } else {
                util::print_chapters_table(&list);
            }
        }
        Commands::Watch { book_id, chapter } => {
            let (watch, chapters) = resolve_episode(&client, &book_id, chapter).await;
            pb.finish_and_clear();
            if cli.json {
                util::print_output(&WatchView { watch: &watch, chapters: &chapters }, true);
            } else {
                util::print_watch_human(&watch, &chapters);
            }
        }
        Commands::Info { book_id } => {
            let found = client.find_item(&book_id).await;
            pb.finish_and_clear();
            match found {
                Some(item) if cli.json => util::print_output(&item, true),
                Some(item) => util::print_item_detail(&item),
                None => println!("{} {}", "Title not found:".red().bold(), book_id),
            }
        }
        Commands::View { book_id, chapter } => {
            let (watch, chapters) = resolve_episode(&client, &book_id, chapter).await;
            pb.finish_and_clear();
            match watch.playable() {
                Ok(url) => {
                    println!("Opening episode {} of {}: {}", watch.chapter_index.saturating_add(1), book_id, url);
                    util::open_system_uri(url).await?;
                }
                Err(_) => util::print_watch_human(&watch, &chapters),
            }
        }
    }
    Ok(())
}
