use crate::domain::alias::AliasTable;
use crate::domain::history::HistoryEntry;
use colored::Colorize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Where rendered responses go: a file when `-o` is given, stdout otherwise
pub fn destination(path: Option<&Path>) -> Box<dyn Write> {
    match path {
        Some(path) => Box::new(DeferredFile::new(path)),
        None => Box::new(io::stdout().lock()),
    }
}

/// Output file that is only created on the first write or flush, so a
/// request that fails before rendering leaves no file behind
pub struct DeferredFile {
    path: PathBuf,
    file: Option<BufWriter<File>>,
}

impl DeferredFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
        }
    }

    fn open(&mut self) -> io::Result<&mut BufWriter<File>> {
        if self.file.is_none() {
            let file = File::create(&self.path).map_err(|e| {
                io::Error::new(
                    e.kind(),
                    format!("failed to create output file {}: {e}", self.path.display()),
                )
            })?;
            self.file = Some(BufWriter::new(file));
        }
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::other("output file is not open"))
    }
}

impl Write for DeferredFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.open()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.open()?.flush()
    }
}

pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {}", "error:".red().bold(), err);
    for cause in err.chain().skip(1) {
        eprintln!("  {} {}", "caused by:".red(), cause);
    }
}

pub fn print_usage_hint() {
    eprintln!("{}", "Usage: shoot [OPTIONS] <URL>\nTry 'shoot --help' for more information.".yellow());
}

pub fn print_notice(message: &str) {
    eprintln!("{}", message.cyan());
}

pub fn write_aliases<W: Write>(out: &mut W, table: &AliasTable) -> io::Result<()> {
    let width = table.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    for (name, url) in table.iter() {
        writeln!(out, "{}  {}", format!("{name:width$}").bold(), url)?;
    }
    Ok(())
}

/// One line per entry: index, timestamp, method and URL
pub fn write_history_summary<W: Write>(out: &mut W, entries: &[HistoryEntry]) -> io::Result<()> {
    for (index, entry) in entries.iter().enumerate() {
        writeln!(
            out,
            "{:>4}  {}  {} {}",
            index,
            entry.timestamp.to_rfc3339().dimmed(),
            format!("{:<7}", entry.method.as_str()).green(),
            entry.url
        )?;
    }
    Ok(())
}

/// Request line, headers and body of a single history entry
pub fn write_history_entry<W: Write>(out: &mut W, entry: &HistoryEntry) -> io::Result<()> {
    writeln!(out, "{} {}", entry.method.as_str().green().bold(), entry.url)?;
    writeln!(out, "{}", entry.timestamp.to_rfc3339().dimmed())?;
    for (name, values) in &entry.headers {
        for value in values {
            writeln!(out, "{}: {}", name.cyan(), value)?;
        }
    }
    if !entry.body.is_empty() {
        writeln!(out)?;
        out.write_all(&entry.body)?;
        if !entry.body.ends_with(b"\n") {
            writeln!(out)?;
        }
    }
    Ok(())
}
