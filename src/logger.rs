// Logger for the intake client: one-line records to stderr, warn+ persisted to
// intake.log, and a panic hook that routes panics through the same file.

use lazy_static::lazy_static;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::backtrace::Backtrace;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

const LOG_FILE_NAME: &str = "intake.log";

lazy_static! {
    static ref MIRROR_STDERR: bool = {
        let v = std::env::var("INTAKE_LOG_STDERR").unwrap_or_else(|_| "1".to_string());
        matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
    };
}
lazy_static! {
    static ref LOG_FILE: Mutex<Option<std::fs::File>> = Mutex::new(None);
}

struct IntakeLogger;

impl Log for IntakeLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        if let Some(max) = log::max_level().to_level() {
            metadata.level() <= max
        } else {
            false
        }
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_record(&timestamp_millis(), record.level(), record.target(), &record.args().to_string());

        if *MIRROR_STDERR {
            eprintln!("{}", line);
        }
        if matches!(record.level(), Level::Warn | Level::Error) {
            write_file_line(&line);
        }
    }

    fn flush(&self) {
        if let Ok(mut lf) = LOG_FILE.lock() {
            if let Some(f) = lf.as_mut() {
                let _ = f.flush();
            }
        }
    }
}

fn format_record(ts: &str, level: Level, target: &str, msg: &str) -> String {
    format!("[{}] [{:>5}] {}: {}", ts, level, target, msg)
}

fn level_from_env() -> Option<LevelFilter> {
    let val = std::env::var("RUST_LOG").ok()?;
    parse_level(&val)
}

fn parse_level(val: &str) -> Option<LevelFilter> {
    let v = val.to_lowercase();
    if v.contains("trace") {
        Some(LevelFilter::Trace)
    } else if v.contains("debug") {
        Some(LevelFilter::Debug)
    } else if v.contains("info") {
        Some(LevelFilter::Info)
    } else if v.contains("warn") {
        Some(LevelFilter::Warn)
    } else if v.contains("error") {
        Some(LevelFilter::Error)
    } else if v.contains("off") {
        Some(LevelFilter::Off)
    } else {
        None
    }
}

/// Install the logger, open intake.log and hook panics. Safe to call more than once.
pub fn init() {
    if log::set_boxed_logger(Box::new(IntakeLogger)).is_err() {
        return;
    }

    let level = level_from_env().unwrap_or(LevelFilter::Info);
    log::set_max_level(level);

    {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(LOG_FILE_NAME)
            .ok();
        if let Ok(mut lf) = LOG_FILE.lock() {
            *lf = file;
        }
    }

    install_panic_hook();
    log::debug!("logger initialized at level {}", level);
}

fn timestamp_millis() -> String {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    format!("{}.{:03}", now.as_secs(), now.subsec_millis())
}

fn write_file_line(line: &str) {
    if let Ok(mut lf) = LOG_FILE.lock() {
        if let Some(f) = lf.as_mut() {
            let _ = writeln!(f, "{}", line);
            let _ = f.flush();
        }
    }
}

fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            *s
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.as_str()
        } else {
            "Box<Any>"
        };
        let loc = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());

        let bt = Backtrace::force_capture();
        write_file_line(&format_record(&timestamp_millis(), Level::Error, "panic", &format!("at {loc}: {msg}")));
        for line in format!("{bt:?}").lines() {
            write_file_line(line);
        }
        eprintln!("panic at {loc}: {msg}");
    }));
}
