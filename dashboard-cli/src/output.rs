use std::{
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use dashboard_core::{
    ResultView, TempTheme, UiState,
    render::{CurrentCard, DayTile, MetaBar, SeriesView},
};

#[derive(Debug, Clone, Default)]
pub struct OutputOptions {
    pub json: bool,
    pub svg_dir: Option<PathBuf>,
}

impl OutputOptions {
    /// Print whatever the result panel currently shows.
    pub fn print(&self, state: &UiState) -> Result<()> {
        if let Some(view) = state.view() {
            if self.json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print!("{}", format_view(&view));
            }

            if let Some(dir) = &self.svg_dir {
                for path in write_sparklines(&view, dir)? {
                    println!("Wrote {}", path.display());
                }
            }
            return Ok(());
        }

        match (state.error(), state.status_line()) {
            (Some(message), _) => eprintln!("Error: {message}"),
            (None, Some(line)) => println!("{line}"),
            (None, None) => {}
        }
        Ok(())
    }
}

pub fn format_view(view: &ResultView) -> String {
    match view {
        ResultView::Current(card) => format_current(card),
        ResultView::Series(series) => format_series(series),
    }
}

fn format_meta(meta: &MetaBar) -> String {
    meta.segments().join(" · ")
}

fn theme_tag(theme: Option<TempTheme>) -> String {
    theme
        .map(|t| format!(" [{}]", t.css_class()))
        .unwrap_or_default()
}

fn format_current(card: &CurrentCard) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", format_meta(&card.meta));
    let _ = writeln!(out, "{}", card.location);
    let _ = writeln!(out, "  {}{}", card.temperature, theme_tag(card.theme));
    let _ = writeln!(out, "{}", card.status);
    out
}

fn format_series(series: &SeriesView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", format_meta(&series.meta));
    let _ = writeln!(out, "{}{}", series.location, theme_tag(series.theme));
    let _ = writeln!(out, "{}", series.status);

    for tile in &series.tiles {
        out.push('\n');
        out.push_str(&format_tile(tile));
    }
    out
}

fn format_tile(tile: &DayTile) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", tile.title);
    let _ = writeln!(
        out,
        "  Average {}   High {}   Low {}",
        tile.average, tile.high, tile.low
    );

    if let Some(line) = &tile.sparkline {
        let _ = writeln!(out, "  Trend {}", line.to_blocks());
    }

    if !tile.chips.is_empty() {
        let chips: Vec<String> = tile
            .chips
            .iter()
            .map(|chip| format!("{} {}", chip.label, chip.temp))
            .collect();
        let _ = writeln!(out, "  {}", chips.join(" | "));
    }
    out
}

/// One `<n>-<key>.svg` per tile that has a chart, `n` being the tile's
/// position from 1. Returns the written paths.
pub fn write_sparklines(view: &ResultView, dir: &Path) -> Result<Vec<PathBuf>> {
    let ResultView::Series(series) = view else {
        return Ok(Vec::new());
    };

    let charts: Vec<_> = series
        .tiles
        .iter()
        .enumerate()
        .filter_map(|(idx, tile)| tile.sparkline.as_ref().map(|line| (idx, tile, line)))
        .collect();
    if charts.is_empty() {
        return Ok(Vec::new());
    }

    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create SVG directory: {}", dir.display()))?;

    let mut written = Vec::with_capacity(charts.len());
    for (idx, tile, line) in charts {
        // Undated tiles share a key; the position keeps their files apart.
        let name = format!("{}-{}.svg", idx + 1, file_stem(&tile.key));
        let path = dir.join(name);
        fs::write(&path, line.to_svg())
            .with_context(|| format!("Failed to write sparkline: {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

fn file_stem(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
