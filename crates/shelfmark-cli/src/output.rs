use std::collections::BTreeMap;
use std::io::Write;

use owo_colors::OwoColorize;

use shelfmark_core::{Record, Report};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Render the full library report: summary, books grouped by topic,
/// then resolved duplicates.
pub fn print_report(w: &mut dyn Write, report: &Report, color: ColorMode) -> std::io::Result<()> {
    print_summary(w, report, color)?;
    print_books(w, report, color)?;
    print_duplicates(w, report, color)?;
    Ok(())
}

fn print_summary(w: &mut dyn Write, report: &Report, color: ColorMode) -> std::io::Result<()> {
    let summary = &report.summary;

    if color.enabled() {
        writeln!(w, "{}", "Library summary".bold())?;
    } else {
        writeln!(w, "Library summary")?;
    }
    writeln!(w, "  Books:          {}", summary.total_books)?;
    writeln!(w, "  Total size:     {}", summary.total_size_human)?;
    writeln!(w, "  Total pages:    {}", summary.total_pages)?;
    writeln!(w, "  Unique authors: {}", summary.unique_authors)?;
    writeln!(w, "  Years:          {}", summary.years_range)?;
    writeln!(w)?;

    if !summary.topics.is_empty() {
        if color.enabled() {
            writeln!(w, "{}", "Topics".bold())?;
        } else {
            writeln!(w, "Topics")?;
        }
        for (topic, count) in &summary.topics {
            writeln!(w, "  {topic}: {count}")?;
        }
        writeln!(w)?;
    }
    Ok(())
}

fn print_books(w: &mut dyn Write, report: &Report, color: ColorMode) -> std::io::Result<()> {
    // Group by primary topic/subtopic, keeping the per-group path order.
    let mut groups: BTreeMap<(String, String), Vec<&Record>> = BTreeMap::new();
    for book in &report.books {
        let primary = book.primary_topic();
        groups
            .entry((primary.topic.clone(), primary.subtopic.clone()))
            .or_default()
            .push(book);
    }

    for ((topic, subtopic), books) in &groups {
        if color.enabled() {
            writeln!(w, "{} / {}", topic.bold().cyan(), subtopic.cyan())?;
        } else {
            writeln!(w, "{topic} / {subtopic}")?;
        }
        for book in books {
            print_book_line(w, book, color)?;
        }
        writeln!(w)?;
    }
    Ok(())
}

fn print_book_line(w: &mut dyn Write, book: &Record, color: ColorMode) -> std::io::Result<()> {
    let title = if book.title.is_empty() {
        book.path.as_str()
    } else {
        book.title.as_str()
    };
    let author = if book.author.is_empty() {
        String::new()
    } else {
        format!(" - {}", book.author)
    };
    let year = book
        .year
        .map(|y| format!(" [{y}]"))
        .unwrap_or_default();
    let days = book
        .reading_time_days
        .map(|d| format!(", ~{d}d"))
        .unwrap_or_default();

    if color.enabled() {
        writeln!(
            w,
            "  {:>4.1}  {}  {}{}{}{}",
            book.rating.green(),
            format!("{:^8}", book.difficulty).dimmed(),
            title,
            author.dimmed(),
            year.dimmed(),
            days.dimmed(),
        )?;
    } else {
        writeln!(
            w,
            "  {:>4.1}  {:^8}  {}{}{}{}",
            book.rating, book.difficulty, title, author, year, days,
        )?;
    }
    Ok(())
}

fn print_duplicates(w: &mut dyn Write, report: &Report, color: ColorMode) -> std::io::Result<()> {
    if report.duplicates.is_empty() {
        return Ok(());
    }

    if color.enabled() {
        writeln!(
            w,
            "{} ({})",
            "Duplicates".bold().yellow(),
            report.duplicates.len()
        )?;
    } else {
        writeln!(w, "Duplicates ({})", report.duplicates.len())?;
    }
    for edge in &report.duplicates {
        writeln!(w, "  {} -> kept {}", edge.duplicate_path, edge.original_path)?;
    }
    writeln!(w)?;
    Ok(())
}
