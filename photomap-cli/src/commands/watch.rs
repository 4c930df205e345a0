//! Watch command - drive a live feed from stdin.
//!
//! Each input line is one of:
//!
//! ```text
//! LAT LON [LAT_SPAN [LON_SPAN]]   map moved to this region (debounced)
//! user LAT LON                    device location changed
//! fetch                           fetch every photo now
//! home                            print where "return to my location" goes
//! quit                            stop
//! ```
//!
//! Feed events are printed as they arrive. At end of input the command waits
//! for the feed to settle and exits.

use clap::Args;
use console::style;
use photomap::app::PhotoMapApp;
use photomap::feed::{FeedEvent, FeedHandle};
use photomap::geo::{Coordinate, ViewportRegion};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::photos::format_photo;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Span used when a region line gives only a center.
const DEFAULT_SPAN: f64 = 0.1;

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Initial device latitude
    #[arg(long, allow_hyphen_values = true, requires = "user_lon")]
    pub user_lat: Option<f64>,

    /// Initial device longitude
    #[arg(long, allow_hyphen_values = true, requires = "user_lat")]
    pub user_lon: Option<f64>,

    /// Fetch every photo immediately on start
    #[arg(long)]
    pub initial_fetch: bool,
}

/// One parsed line of input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WatchInput {
    Region(ViewportRegion),
    User(Coordinate),
    FetchAll,
    Home,
    Quit,
}

/// Parse an input line. Blank lines and `#` comments yield `None`.
pub fn parse_input(line: &str) -> Result<Option<WatchInput>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let words: Vec<&str> = line.split_whitespace().collect();
    let input = match words.as_slice() {
        ["quit"] | ["exit"] => WatchInput::Quit,
        ["fetch"] => WatchInput::FetchAll,
        ["home"] => WatchInput::Home,
        ["user", lat, lon] => WatchInput::User(coordinate(lat, lon)?),
        [lat, lon, spans @ ..] if spans.len() <= 2 => {
            let center = coordinate(lat, lon)?;
            let lat_span = spans.first().map(|s| number(s)).transpose()?.unwrap_or(DEFAULT_SPAN);
            let lon_span = spans.get(1).map(|s| number(s)).transpose()?.unwrap_or(lat_span);
            let region = ViewportRegion::try_new(center, lat_span, lon_span)
                .map_err(|e| e.to_string())?;
            WatchInput::Region(region)
        }
        _ => return Err(format!("unrecognised input '{}'", line)),
    };
    Ok(Some(input))
}

fn number(word: &str) -> Result<f64, String> {
    word.parse()
        .map_err(|_| format!("'{}' is not a number", word))
}

fn coordinate(lat: &str, lon: &str) -> Result<Coordinate, String> {
    Coordinate::try_new(number(lat)?, number(lon)?).map_err(|e| e.to_string())
}

/// Run the watch command.
pub fn run(runner: &CliRunner, args: WatchArgs) -> Result<(), CliError> {
    runner.log_startup("watch");
    let app = runner.start_app()?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    ctrlc::set_handler(move || on_interrupt.cancel())
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;

    runner.block_on(watch(&app, args, cancel))
}

async fn watch(app: &PhotoMapApp, args: WatchArgs, cancel: CancellationToken) -> Result<(), CliError> {
    let feed = app.open_feed();
    let mut events = feed.subscribe_events();

    if let (Some(lat), Some(lon)) = (args.user_lat, args.user_lon) {
        let location = Coordinate::try_new(lat, lon)
            .map_err(|e| CliError::InvalidArgument(e.to_string()))?;
        feed.update_user_location(location).await?;
    }
    if args.initial_fetch {
        feed.fetch_now(None).await?;
    }

    let input = BufReader::new(tokio::io::stdin());
    drive(&feed, &mut events, input, &cancel).await?;

    // Print whatever the last fetch produced before tearing down.
    while let Ok(event) = events.try_recv() {
        print_event(&feed, &event);
    }
    feed.shutdown().await;
    Ok(())
}

/// Apply `input` lines to the feed, printing events as they arrive. Returns
/// on `quit` or cancellation, or once the feed settles after input ends.
async fn drive<R>(
    feed: &FeedHandle,
    events: &mut broadcast::Receiver<FeedEvent>,
    input: R,
    cancel: &CancellationToken,
) -> Result<(), CliError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut reading = true;
    // Not polled, and so sends nothing, until input is exhausted.
    let settle = feed.settled();
    tokio::pin!(settle);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            event = events.recv() => match event {
                Ok(event) => print_event(feed, &event),
                Err(RecvError::Lagged(missed)) => warn!(missed, "Dropped feed events"),
                Err(RecvError::Closed) => break,
            },

            line = lines.next_line(), if reading => match line? {
                Some(line) => match parse_input(&line) {
                    Ok(Some(WatchInput::Quit)) => break,
                    Ok(Some(input)) => apply(feed, input).await?,
                    Ok(None) => {}
                    Err(msg) => eprintln!("{} {}", style("?").yellow(), msg),
                },
                None => reading = false,
            },

            settled = &mut settle, if !reading => {
                settled?;
                break;
            }
        }
    }
    Ok(())
}

async fn apply(feed: &FeedHandle, input: WatchInput) -> Result<(), CliError> {
    match input {
        WatchInput::Region(region) => feed.on_region_changed(region).await?,
        WatchInput::User(location) => feed.update_user_location(location).await?,
        WatchInput::FetchAll => feed.fetch_now(None).await?,
        WatchInput::Home => match feed.return_to_user_location().await? {
            Some(home) => println!("home: ({:.4}, {:.4})", home.latitude, home.longitude),
            None => println!("home: unknown"),
        },
        WatchInput::Quit => {}
    }
    Ok(())
}

fn print_event(feed: &FeedHandle, event: &FeedEvent) {
    match event {
        FeedEvent::PhotosUpdated { .. } => {
            println!("{} {}", style("●").green(), event);
            for photo in feed.state().photos.iter() {
                println!("    {}", format_photo(photo, None));
            }
        }
        FeedEvent::FetchFailed { .. } => println!("{} {}", style("●").red(), event),
        FeedEvent::FetchSuppressed { .. } | FeedEvent::Deviation(_) => {
            println!("{} {}", style("●").yellow(), event)
        }
        FeedEvent::FetchStarted { .. } => println!("{} {}", style("●").dim(), event),
    }
}
