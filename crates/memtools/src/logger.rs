use log::{LevelFilter, Log, Metadata, Record};

/// Writes log records to stderr, prefixed with the program name.
///
/// Stdout is reserved for data, so nothing here ever goes there.
pub struct StderrLogger {
    program: &'static str,
}

impl StderrLogger {
    pub const fn new(program: &'static str) -> Self {
        Self { program }
    }

    fn format(&self, record: &Record) -> String {
        format!("{}: {} {}", self.program, record.level(), record.args())
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("{}", self.format(record));
        }
    }

    fn flush(&self) {}
}

/// Installs the logger for this process. Later calls only adjust the level.
pub fn init(program: &'static str, level: LevelFilter) {
    // One logger per process, it is never freed
    let logger = Box::leak(Box::new(StderrLogger::new(program)));
    if log::set_logger(logger).is_err() {
        log::debug!("logger already installed");
    }
    log::set_max_level(level);
}

/// Raises `base` by one level for every `-v`.
pub fn verbosity(base: LevelFilter, verbose: u8) -> LevelFilter {
    let levels = [
        LevelFilter::Off,
        LevelFilter::Error,
        LevelFilter::Warn,
        LevelFilter::Info,
        LevelFilter::Debug,
        LevelFilter::Trace,
    ];
    let current = levels.iter().position(|level| *level == base).unwrap_or(2);
    levels[(current + usize::from(verbose)).min(levels.len() - 1)]
}
