use anyhow::{bail, Context, Result};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io::IsTerminal;
use std::time::Duration;

use crate::catalog::{Home, Section};
use crate::types::{CatalogItem, ChapterList, WatchError, WatchResult};

pub fn print_output<T: Serialize + std::fmt::Debug>(value: &T, json: bool) {
    if json {
        match serde_json::to_string_pretty(value) {
            Ok(s) => println!("{}", s),
            Err(_) => println!("{:?}", value),
        }
    } else {
        println!("{:?}", value);
    }
}

/// Spinner on stderr while a request is in flight; hidden when piping or in JSON mode.
pub fn spinner(msg: &str, json: bool) -> ProgressBar {
    if json || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub fn print_items_table(items: &[CatalogItem]) {
    println!("{} {}", "Total".bold(), items.len());

    let index_header = "#";
    let id_header = "ID";
    let rating_header = "Rating";
    let genre_header = "Genre";
    let title_header = "Title";

    let index_width = std::cmp::max(index_header.len(), format!("{}", items.len()).len());
    let id_width = std::cmp::max(id_header.len(), items.iter().map(|i| i.book_id.len()).max().unwrap_or(0));
    let genre_width = std::cmp::max(genre_header.len(), items.iter().map(|i| i.genre.len()).max().unwrap_or(0));

    println!(
        "{:<iw$}  {:<dw$}  {:<6}  {:<gw$}  {}",
        index_header.bold(),
        id_header.bold(),
        rating_header.bold(),
        genre_header.bold(),
        title_header.bold(),
        iw = index_width,
        dw = id_width,
        gw = genre_width
    );
    println!(
        "{:<iw$}  {:<dw$}  {:<6}  {:<gw$}  {}",
        "-".repeat(index_width),
        "-".repeat(id_width),
        "-".repeat(6),
        "-".repeat(genre_width),
        "-".repeat(10),
        iw = index_width,
        dw = id_width,
        gw = genre_width
    );

    for (idx, item) in items.iter().enumerate() {
        let title = if item.is_new { format!("{} {}", item.title, "NEW".green().bold()) } else { item.title.clone() };
        println!(
            "{:<iw$}  {:<dw$}  {:<6.1}  {:<gw$}  {}",
            idx + 1,
            item.book_id,
            item.rating,
            item.genre,
            title,
            iw = index_width,
            dw = id_width,
            gw = genre_width
        );
    }
}

pub fn print_section(name: &str, section: &Section) {
    let mut header = format!("== {} ==", name).bold().to_string();
    if section.from_sample {
        header.push_str(&format!(" {}", "(sample titles)".yellow()));
    }
    println!("{}", header);
    if let Some(e) = &section.error {
        println!("{}", e.yellow());
    }
    print_items_table(&section.items);
}

pub fn print_home(home: &Home) {
    print_section("For you", &home.for_you);
    println!();
    print_section("New", &home.new_releases);
    println!();
    print_section("Trending", &home.trending);
}

pub fn print_item_detail(item: &CatalogItem) {
    println!("ID:      {}", item.book_id.bold());
    println!("Title:   {}", item.title);
    println!("Genre:   {}", item.genre);
    if !item.tags.is_empty() {
        println!("Tags:    {}", item.tags.join(", "));
    }
    println!("Rating:  {:.1}", item.rating);
    println!("Plays:   {}", item.play_count);
    if item.chapter_count > 0 {
        println!("Episodes: {}", item.chapter_count);
    }
    if let Some(r) = item.rank {
        println!("Rank:    #{}", r);
    }
    println!("Cover:   {}", item.cover);
    println!("Story:\n{}", item.description);
}

pub fn print_chapters_table(list: &ChapterList) {
    if let Some(e) = &list.error {
        println!("{} {}", "Chapters unavailable:".red().bold(), e);
        return;
    }
    if !list.has_chapters {
        println!("{}", "Chapters are still loading or unavailable".yellow());
        return;
    }
    println!(
        "{} {} | free {} | locked {} | ~{} min/episode",
        "Episodes".bold(),
        list.total,
        list.free_count(),
        list.locked_count(),
        list.average_duration_minutes()
    );
    for c in &list.chapters {
        let mut line = format!("{:>4}. {}", c.chapter_no, c.title);
        if let Some(d) = &c.duration {
            line.push_str(&format!(" | {}", d));
        }
        if c.is_locked {
            line.push_str(&format!(" | {}", "locked".red()));
        } else if !c.is_free {
            line.push_str(&format!(" | {}", "paid".yellow()));
        }
        println!("{}", line);
    }
    if list.has_more {
        println!("{}", "... more episodes upstream".dimmed());
    }
}

pub fn print_watch_human(w: &WatchResult, chapters: &ChapterList) {
    match w.playable() {
        Ok(url) => {
            println!("{} {}", "Episode".bold(), w.chapter_index.saturating_add(1));
            println!("Title:    {}", w.title);
            if let Some(d) = &w.description {
                println!("About:    {}", d);
            }
            if let Some(d) = &w.duration {
                println!("Length:   {}", d);
            }
            if let Some(q) = &w.selected_quality {
                let offered: Vec<&str> = w.qualities.iter().map(|q| q.quality.as_str()).collect();
                println!("Quality:  {} (offered: {})", q, offered.join(", "));
            }
            println!("URL:      {}", url.cyan());
            if let Some(prev) = chapters.previous(w.chapter_index) {
                println!("Prev:     drama watch {} {}", w.book_id, prev);
            }
            if let Some(next) = chapters.next(w.chapter_index).filter(|_| w.has_next) {
                println!("Next:     drama watch {} {}", w.book_id, next);
            }
        }
        Err(e) => print_watch_error(w, e),
    }
}

pub fn print_watch_error(w: &WatchResult, e: WatchError) {
    println!("{} {}", e.title().red().bold(), format!("[{}]", e.code()).dimmed());
    println!("{}", e.message());
    for tip in e.tips() {
        println!("  - {}", tip);
    }
    println!("\nRetry: drama watch {} {}", w.book_id, w.chapter_index);
}

pub async fn open_system_uri(uri: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    let mut cmd = {
        let mut c = tokio::process::Command::new("open");
        c.arg(uri);
        c
    };

    #[cfg(target_os = "linux")]
    let mut cmd = {
        let mut c = tokio::process::Command::new("xdg-open");
        c.arg(uri);
        c
    };

    #[cfg(target_os = "windows")]
    let mut cmd = {
        let mut c = tokio::process::Command::new("cmd");
        c.arg("/C").arg("start").arg("").arg(uri);
        c
    };

    let status = cmd.status().await.context("failed to ask the system to open the URI")?;
    if !status.success() {
        bail!("system could not open: {}", uri);
    }
    println!("{} {}", "Handed to the default player".green().bold(), uri);
    Ok(())
}
