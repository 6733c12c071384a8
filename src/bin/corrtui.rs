use clap::{Parser, ValueEnum};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use corrtui::config::Config;
use corrtui::core::AnalysisId;
use corrtui::services::{
    load_context, ErrorSink, HttpVectorSource, MatrixFileSource, StatusErrorSink, VectorSource,
};
use corrtui::tui::components::{DrillDown, DrillDownFactory, DrillDownRequest, RowHeatmap, RowResponse};
use corrtui::tui::{App, KeyBindings, Theme};
use crossterm::event::{DisableMouseCapture, EnableMouseCapture, Event, EventStream};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use futures::StreamExt;
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::Terminal;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{error, info, warn};

/// Explore a precomputed correlation matrix one variable at a time
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Analysis to load (falls back to api.analysis_id from the config)
    #[arg(long = "analysis", value_name = "ID")]
    analysis: Option<AnalysisId>,
    /// Dashboard API base URL (overrides api.base_url)
    #[arg(long = "base-url", value_name = "URL", conflicts_with = "matrix")]
    base_url: Option<String>,
    /// Read the catalog and rows from a local matrix file instead of the API
    #[arg(long = "matrix", value_name = "PATH")]
    matrix: Option<PathBuf>,
    /// Path to a config file (overrides ~/.corrtui-config.json5)
    #[arg(long = "config", value_name = "PATH")]
    config: Option<PathBuf>,
    /// Path to a JSON keybindings file
    #[arg(long = "keybindings", value_name = "PATH")]
    keybindings: Option<PathBuf>,
    /// Enable file logging at the given level (overrides RUST_LOG)
    #[arg(long = "logging", value_enum)]
    logging: Option<LogLevel>,
    /// Log file path (defaults to corrtui.log in the working directory)
    #[arg(long = "log-file", value_name = "PATH")]
    log_file: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum LogLevel { Error, Warn, Info, Debug, Trace }

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    corrtui::logging::init_with(args.log_file.clone(), args.logging.map(Into::into))?;

    let config = Config::from_path(args.config.as_ref()).wrap_err("failed to load configuration")?;
    let keybindings = match &args.keybindings {
        Some(path) => KeyBindings::load_from_file(path)
            .wrap_err_with(|| format!("failed to load keybindings from {}", path.display()))?,
        None => KeyBindings::default(),
    };
    for warning in keybindings.validate() {
        warn!("{warning}");
    }

    let (source, analysis) = select_source(&args, &config)?;
    // Load the catalog before touching the terminal so failures print normally
    let context = load_context(source.as_ref(), analysis)
        .await
        .wrap_err_with(|| format!("failed to load analysis {analysis}"))?;
    info!("loaded analysis {analysis} with {} variables", context.catalog.len());

    let sink = Arc::new(StatusErrorSink::new());
    let theme = Theme::from_name(config.ui.theme);
    let factory = heatmap_factory(source.clone(), analysis, sink.clone(), theme);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut app = App::new(context, source, sink, factory, tx, &config);
    app.set_keybindings(keybindings);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let tick_rate = Duration::from_millis(config.ui.tick_rate_ms.max(16));
    let res = run_app(&mut terminal, &mut app, &mut rx, tick_rate).await;

    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    if let Err(e) = &res {
        error!("Error: {e}");
    }
    res
}

fn select_source(args: &Args, config: &Config) -> Result<(Arc<dyn VectorSource>, AnalysisId)> {
    let analysis = args.analysis.or(config.api.analysis_id.map(AnalysisId::new));
    if let Some(path) = &args.matrix {
        let source = MatrixFileSource::open(path)?;
        info!("reading matrix from {}", path.display());
        return Ok((Arc::new(source), analysis.unwrap_or(AnalysisId::new(0))));
    }
    let base_url = args
        .base_url
        .clone()
        .or_else(|| config.api.base_url.clone())
        .ok_or_else(|| eyre!("no data source: pass --matrix or --base-url"))?;
    let analysis = analysis.ok_or_else(|| eyre!("no analysis id: pass --analysis or set api.analysis_id"))?;
    info!("using API at {base_url}");
    Ok((Arc::new(HttpVectorSource::new(base_url)?), analysis))
}

fn heatmap_factory(
    source: Arc<dyn VectorSource>,
    analysis: AnalysisId,
    sink: Arc<StatusErrorSink>,
    theme: Theme,
) -> DrillDownFactory {
    let sink: Arc<dyn ErrorSink> = sink;
    Arc::new(move |request: DrillDownRequest| -> Box<dyn DrillDown> {
        Box::new(RowHeatmap::new(
            request,
            source.clone(),
            analysis,
            sink.clone(),
            theme.clone(),
        ))
    })
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    responses: &mut UnboundedReceiver<RowResponse>,
    tick_rate: Duration,
) -> Result<()> {
    let mut events = EventStream::new();
    let mut ticker = tokio::time::interval(tick_rate);
    app.start();
    loop {
        terminal.draw(|f| app.draw(f))?;
        if app.should_quit() {
            break;
        }
        tokio::select! {
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) => app.handle_key_event(key)?,
                Some(Ok(Event::Mouse(mouse))) => app.handle_mouse_event(mouse)?,
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
            Some(response) = responses.recv() => {
                app.on_response(response);
            }
            // redraw so the drill-down picks up its data
            _ = ticker.tick() => {}
        }
    }
    Ok(())
}
