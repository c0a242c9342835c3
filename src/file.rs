// src/file.rs
//! Standings export: JSON (the canonical shape) or a flat CSV with one line
//! per participant and one column per problem.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::config::options::{ExportFormat, ExportOptions};
use crate::core::sanitize::fmt_number;
use crate::standings::{Place, Standings};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("csv output is not utf-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub fn to_json(st: &Standings, pretty: bool) -> Result<String, ExportError> {
    Ok(if pretty { serde_json::to_string_pretty(st)? } else { serde_json::to_string(st)? })
}

/// Columns: place, member, name, country, solving, penalty, medal, then one
/// per problem (`<verdict> <time>`).
pub fn to_csv(st: &Standings) -> Result<String, ExportError> {
    let mut w = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["place", "member", "name", "country", "solving", "penalty", "medal"];
    header.extend(st.problems.iter().map(|p| p.short.as_str()));
    w.write_record(&header)?;

    for row in st.result.values() {
        let place = match &row.place {
            Some(Place::Rank(n)) => n.to_string(),
            Some(Place::Label(s)) => s.clone(),
            None => s!(),
        };
        let mut rec = vec![
            place,
            s!(row.member()),
            row.name.clone().unwrap_or_default(),
            row.country.clone().unwrap_or_default(),
            fmt_number(row.solving),
            fmt_number(row.penalty),
            row.medal.map(|m| s!(m.as_str())).unwrap_or_default(),
        ];
        for p in &st.problems {
            let cell = row.problems.get(&p.short).map(|r| {
                let verdict = r.result.as_ref().map(ToString::to_string).unwrap_or_default();
                match &r.time {
                    Some(t) if !verdict.is_empty() => join!(&verdict, " ", t),
                    Some(t) => t.clone(),
                    None => verdict,
                }
            });
            rec.push(cell.unwrap_or_default());
        }
        w.write_record(&rec)?;
    }

    let bytes = w
        .into_inner()
        .map_err(|e| ExportError::Io { path: PathBuf::from("<memory>"), source: e.into_error() })?;
    Ok(String::from_utf8(bytes)?)
}

pub fn render(st: &Standings, opts: &ExportOptions) -> Result<String, ExportError> {
    match opts.format {
        ExportFormat::Json => to_json(st, opts.pretty),
        ExportFormat::Csv => to_csv(st),
    }
}

/// Write to `out`, or stdout when `None`. A directory gets
/// `standings.<ext>` inside it. Returns the file written, if any.
pub fn export_standings(
    st: &Standings,
    opts: &ExportOptions,
    out: Option<&Path>,
) -> Result<Option<PathBuf>, ExportError> {
    let text = render(st, opts)?;
    let Some(out) = out else {
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(text.as_bytes())
            .and_then(|_| stdout.write_all(b"\n"))
            .map_err(|source| ExportError::Io { path: PathBuf::from("-"), source })?;
        return Ok(None);
    };

    let path = if out.is_dir() {
        out.join(format!("standings.{}", opts.format.ext()))
    } else {
        out.to_path_buf()
    };
    ensure_parent(&path)?;
    fs::write(&path, text).map_err(|source| ExportError::Io { path: path.clone(), source })?;
    logf!("Export: wrote {}", path.display());
    Ok(Some(path))
}

fn ensure_parent(path: &Path) -> Result<(), ExportError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .map_err(|source| ExportError::Io { path: parent.to_path_buf(), source }),
        _ => Ok(()),
    }
}
