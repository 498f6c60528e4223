use std::io::{self, Write};

/// Writes help text verbatim; it already ends with a newline.
pub fn write_stdout_text(text: &str) -> io::Result<()> {
    emit(&mut io::stdout().lock(), text, false)
}

pub fn write_stdout_line(text: &str) -> io::Result<()> {
    emit(&mut io::stdout().lock(), text, true)
}

/// A reader that hung up (`leakscan analyze | head`) is not a failure.
fn emit(writer: &mut impl Write, text: &str, newline: bool) -> io::Result<()> {
    let result = writer
        .write_all(text.as_bytes())
        .and_then(|()| if newline { writer.write_all(b"\n") } else { Ok(()) })
        .and_then(|()| writer.flush());
    match result {
        Err(error) if error.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}
