// ============================================================
// Layer 6 — Summary Writer
// ============================================================
// Step-level summaries for one run, written as plain files so they
// can be inspected or plotted with any tool.
//
//   <runs_dir>/<run_name>/
//     scalars.csv              tag,step,value     (Loss/train, Acc/val, ...)
//     text.jsonl               {"tag","step","text"} per line
//     images/<tag>_<step>.png  logged validation images
//     histogram_<mode>.csv     answer,count        most frequent first
//
// Files are appended to, so a resumed run continues the same log.

use anyhow::{Context, Result};
use image::RgbImage;
use serde::Serialize;
use std::{
    fs::{self, File, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

#[derive(Serialize)]
struct TextEntry<'a> {
    tag:  &'a str,
    step: usize,
    text: &'a str,
}

pub struct SummaryWriter {
    dir:     PathBuf,
    scalars: BufWriter<File>,
    text:    BufWriter<File>,
}

impl SummaryWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(dir.join("images"))
            .with_context(|| format!("Cannot create summary dir '{}'", dir.display()))?;

        let scalars_path = dir.join("scalars.csv");
        let is_new       = !scalars_path.exists();
        let mut scalars  = BufWriter::new(open_append(&scalars_path)?);
        if is_new {
            writeln!(scalars, "tag,step,value")?;
        }
        let text = BufWriter::new(open_append(&dir.join("text.jsonl"))?);

        tracing::info!("Writing summaries to '{}'", dir.display());
        Ok(Self { dir, scalars, text })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> Result<()> {
        writeln!(self.scalars, "{},{},{:.6}", tag, step, value)?;
        Ok(())
    }

    pub fn add_text(&mut self, tag: &str, text: &str, step: usize) -> Result<()> {
        let line = serde_json::to_string(&TextEntry { tag, step, text })?;
        writeln!(self.text, "{}", line)?;
        Ok(())
    }

    pub fn add_image(&mut self, tag: &str, image: &RgbImage, step: usize) -> Result<()> {
        let path = self.dir
            .join("images")
            .join(format!("{}_{}.png", file_safe(tag), step));
        image
            .save(&path)
            .with_context(|| format!("Cannot write image '{}'", path.display()))
    }

    /// Overwrite the prediction histogram of one mode.
    pub fn write_histogram(&self, mode: &str, counts: &[(String, usize)]) -> Result<PathBuf> {
        let path = self.dir.join(format!("histogram_{}.csv", file_safe(mode)));
        let mut f = BufWriter::new(
            File::create(&path)
                .with_context(|| format!("Cannot create '{}'", path.display()))?,
        );
        writeln!(f, "answer,count")?;
        for (answer, count) in counts {
            writeln!(f, "{},{}", csv_field(answer), count)?;
        }
        f.flush()?;
        Ok(path)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.scalars.flush()?;
        self.text.flush()?;
        Ok(())
    }
}

impl Drop for SummaryWriter {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!("Failed to flush summaries: {:#}", e);
        }
    }
}

fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Cannot open '{}'", path.display()))
}

fn file_safe(tag: &str) -> String {
    tag.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Quote a CSV field when it contains a separator or quote.
fn csv_field(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
