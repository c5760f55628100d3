use std::io::{self, Write};

use super::config::{OutputConfig, OutputFormat};
use super::types::Envelope;

pub trait Presenter: Send + Sync {
    fn emit(&self, env: &Envelope, w: &mut dyn Write) -> io::Result<()>;
}

pub struct JsonPresenter { pub pretty: bool }
impl Presenter for JsonPresenter {
    fn emit(&self, env: &Envelope, w: &mut dyn Write) -> io::Result<()> {
        if self.pretty { serde_json::to_writer_pretty(&mut *w, env)?; } else { serde_json::to_writer(&mut *w, env)?; }
        writeln!(w)
    }
}

/// One line per payload entry; nested values are printed as JSON.
pub struct TextPresenter { pub pretty: bool }
impl Presenter for TextPresenter {
    fn emit(&self, env: &Envelope, w: &mut dyn Write) -> io::Result<()> {
        let label = if env.apply { "Result" } else { "Plan" };
        writeln!(w, "{}: {}", label, env.op)?;
        if let Some(ms) = env.meta.as_ref().and_then(|m| m.duration_ms) {
            writeln!(w, "  took {ms}ms")?;
        }
        let Some(payload) = env.payload() else { return Ok(()) };
        match payload.as_object() {
            Some(map) if !self.pretty => {
                for (k, v) in map {
                    match v.as_str() {
                        Some(s) => writeln!(w, "  {k}: {s}")?,
                        None => writeln!(w, "  {k}: {v}")?,
                    }
                }
            }
            _ => {
                serde_json::to_writer_pretty(&mut *w, payload)?;
                writeln!(w)?;
            }
        }
        Ok(())
    }
}

pub struct Emitter {
    presenter: Box<dyn Presenter>,
}

impl Emitter {
    pub fn new(cfg: OutputConfig) -> Self {
        let presenter: Box<dyn Presenter> = match cfg.format {
            OutputFormat::Json => Box::new(JsonPresenter { pretty: cfg.pretty }),
            OutputFormat::Text => Box::new(TextPresenter { pretty: cfg.pretty }),
        };
        Emitter { presenter }
    }

    pub fn emit(&self, env: &Envelope) -> io::Result<()> {
        let mut out = io::stdout().lock();
        self.emit_to(env, &mut out)?;
        out.flush()
    }

    pub fn emit_to(&self, env: &Envelope, w: &mut dyn Write) -> io::Result<()> {
        self.presenter.emit(env, w)
    }
}
