use crate::utils::SharedSink;
use std::io;
use std::time::Instant;
use tracing::{debug, error, info, warn, Dispatch};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

pub struct Logger;

impl Logger {
    /// Install the process-wide terminal subscriber.
    pub fn init(verbose: bool) {
        let _ = Registry::default()
            .with(Self::terminal_layer(verbose))
            .try_init();
    }

    /// A subscriber for one pipeline run: the terminal layer plus a plain
    /// text copy of every diagnostic down to DEBUG in `verbose_log`.
    pub fn with_secondary_output(verbose: bool, verbose_log: SharedSink) -> Dispatch {
        let file_layer = fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_writer(move || verbose_log.clone())
            .with_filter(LevelFilter::DEBUG);

        Dispatch::new(
            Registry::default()
                .with(Self::terminal_layer(verbose))
                .with(file_layer),
        )
    }

    fn terminal_layer<S>(verbose: bool) -> impl Layer<S>
    where
        S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    {
        let default_directive = if verbose { "fuzzkit=debug" } else { "fuzzkit=info" };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive));

        fmt::layer()
            .with_target(false)
            .without_time()
            .with_writer(io::stderr)
            .with_filter(filter)
    }

    pub fn info(msg: &str) {
        info!("{}", msg);
    }

    pub fn debug(msg: &str) {
        debug!("{}", msg);
    }

    pub fn error(msg: &str) {
        error!("❌ {}", msg);
    }

    pub fn warn(msg: &str) {
        warn!("⚠️  {}", msg);
    }
}

pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn start(name: &str) -> Self {
        debug!("⏱️  Starting: {}", name);
        Self {
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        debug!("⏱️  Completed: {} in {:.2?}", self.name, self.elapsed());
    }
}
