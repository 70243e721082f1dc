use std::io;

use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use wasm_bindgen::JsValue;

type TryInitError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Buffers one formatted event and hands it to `console.log` on drop.
#[derive(Debug, Default)]
pub struct ConsoleWriter {
    buf: Vec<u8>,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let line = String::from_utf8_lossy(&self.buf);
        web_sys::console::log_1(&JsValue::from_str(line.trim_end()));
    }
}

#[derive(Debug, Default, Copy, Clone)]
pub struct MakeConsoleWriter;

impl<'a> MakeWriter<'a> for MakeConsoleWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter::default()
    }
}

/// Installs the global subscriber. No timestamps: there is no system clock
/// on wasm32-unknown-unknown.
///
/// A second call (or a subscriber installed by the host page) leaves the
/// existing one in place and says so on the console.
pub fn init_logging(max_level: Level) {
    if let Err(err) = try_install(max_level) {
        web_sys::console::warn_1(&JsValue::from_str(&format!(
            "tracing subscriber not installed: {err}"
        )));
    }
}

fn try_install(max_level: impl Into<LevelFilter>) -> Result<(), TryInitError> {
    tracing_subscriber::fmt()
        .with_writer(MakeConsoleWriter)
        .with_max_level(max_level)
        .without_time()
        .try_init()
}
