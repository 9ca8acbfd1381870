use dotenvy::dotenv;
use filmgate::api::{self, AppState, GenreCache, ResponseCache};
use filmgate::config::Settings;
use filmgate::manifest::Manifest;
use filmgate::tmdb::TmdbClient;
use regex::Regex;
use std::io::{self, Write};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Regex patterns for redacting the TMDB API key from log output
struct RedactionPatterns {
    api_key_param: Regex,
    api_key_env: Regex,
}

impl RedactionPatterns {
    /// Initialize all regex patterns
    ///
    /// # Errors
    ///
    /// Returns an error if any regex pattern is invalid
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            api_key_param: Regex::new(r"api_key=[A-Za-z0-9]+")?,
            api_key_env: Regex::new(r"TMDB_API_KEY=[^\s&]+")?,
        })
    }

    fn redact(&self, input: &str) -> String {
        let mut output = input.to_string();
        output = self
            .api_key_param
            .replace_all(&output, "api_key=[MASKED]")
            .to_string();
        output = self
            .api_key_env
            .replace_all(&output, "TMDB_API_KEY=[MASKED]")
            .to_string();
        output
    }
}

struct RedactingWriter<W: Write> {
    inner: W,
    patterns: Arc<RedactionPatterns>,
}

impl<W: Write> RedactingWriter<W> {
    const fn new(inner: W, patterns: Arc<RedactionPatterns>) -> Self {
        Self { inner, patterns }
    }
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        let redacted = self.patterns.redact(&s);
        self.inner.write_all(redacted.as_bytes())?;
        // Report the original length so the caller sees a complete write
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct RedactingMakeWriter<F> {
    make_inner: F,
    patterns: Arc<RedactionPatterns>,
}

impl<F> RedactingMakeWriter<F> {
    const fn new(make_inner: F, patterns: Arc<RedactionPatterns>) -> Self {
        Self {
            make_inner,
            patterns,
        }
    }
}

impl<'a, F, W> tracing_subscriber::fmt::MakeWriter<'a> for RedactingMakeWriter<F>
where
    F: Fn() -> W + 'static,
    W: Write,
{
    type Writer = RedactingWriter<W>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter::new((self.make_inner)(), self.patterns.clone())
    }
}

fn init_logging(patterns: Arc<RedactionPatterns>) {
    let make_writer = RedactingMakeWriter::new(io::stderr, patterns);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(make_writer))
        .init();
}

fn init_settings() -> Settings {
    match Settings::new() {
        Ok(settings) => {
            info!("Configuration loaded successfully.");
            settings
        }
        Err(e) => {
            error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    }
}

/// Parse and summarize the legacy deployment's requirements manifest.
/// Problems are logged and the gateway still starts.
fn report_legacy_manifest(path: &str) {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read legacy manifest {path}: {e}");
            return;
        }
    };
    match Manifest::parse(&content) {
        Ok(manifest) => {
            info!("Legacy manifest {path}: {}", manifest.summary());
            for group in &manifest.groups {
                let label = group.label.as_deref().unwrap_or("(unlabeled)");
                info!("  {label}: {} requirement(s)", group.requirements.len());
            }
        }
        Err(e) => warn!("Failed to parse legacy manifest {path}: {e}"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenv().ok();

    // Compile redaction patterns before any logging happens
    let patterns = Arc::new(RedactionPatterns::new().map_err(|e| {
        eprintln!("Failed to compile redaction patterns: {e}");
        e
    })?);

    init_logging(patterns);

    info!("Starting filmgate...");

    let settings = init_settings();

    if let Some(path) = settings.legacy_manifest_path.as_deref() {
        report_legacy_manifest(path);
    }

    let tmdb = TmdbClient::from_settings(&settings);
    let genres = GenreCache::load(&tmdb).await;
    info!("TMDB client ready.");

    let state = Arc::new(AppState {
        tmdb,
        cache: ResponseCache::new(settings.cache_max_capacity),
        genres,
    });

    let app = api::router(state);

    let addr = format!("{}:{}", settings.bind_address, settings.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Gateway listening at {}", settings.public_url());

    axum::serve(listener, app).await?;

    Ok(())
}
