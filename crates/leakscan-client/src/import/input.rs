use std::fs;
use std::io::{IsTerminal, Read};

use crate::import::invalid_input_error;
use crate::{ClientError, ClientResult};

pub(crate) const STDIN_PATH: &str = "-";

#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) enum SourceKind {
    File,
    Stdin,
}

impl SourceKind {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Stdin => "stdin",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ResolvedSource {
    pub(crate) source_kind: SourceKind,
    pub(crate) source_ref: Option<String>,
    pub(crate) content: String,
}

/// Reads the CSV named by `path`; `-` reads stdin instead.
pub(crate) fn resolve_source(
    path: &str,
    stdin_override: Option<String>,
) -> ClientResult<ResolvedSource> {
    if path == STDIN_PATH {
        let Some(content) = read_stdin(stdin_override)? else {
            return Err(invalid_input_error(
                "Path `-` means stdin input, but stdin was empty. Pipe CSV input or pass a file path.",
            ));
        };
        return Ok(ResolvedSource {
            source_kind: SourceKind::Stdin,
            source_ref: None,
            content,
        });
    }

    let bytes = fs::read(path)
        .map_err(|error| ClientError::import_source_unreadable(path, &error.to_string()))?;
    let content = String::from_utf8_lossy(&bytes).into_owned();

    Ok(ResolvedSource {
        source_kind: SourceKind::File,
        source_ref: Some(path.to_string()),
        content,
    })
}

fn read_stdin(stdin_override: Option<String>) -> ClientResult<Option<String>> {
    if let Some(value) = stdin_override {
        return Ok(Some(value).filter(|body| !body.trim().is_empty()));
    }

    if std::io::stdin().is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|error| ClientError::import_source_unreadable("stdin", &error.to_string()))?;

    if buffer.trim().is_empty() {
        return Ok(None);
    }

    Ok(Some(buffer))
}
