//! Photo listing and upload commands.

use clap::{Args, Subcommand};
use console::style;
use photomap::geo::{Coordinate, ViewportRegion};
use photomap::photo::{NewPhotoInput, Photo};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Photo subcommands.
#[derive(Debug, Subcommand)]
pub enum PhotoCommands {
    /// List every photo, newest first
    All(ListOptions),

    /// List photos uploaded by one user, newest first
    Owner {
        owner_id: String,

        #[command(flatten)]
        list: ListOptions,
    },

    /// List photos inside a rectangle
    Region {
        #[command(flatten)]
        center: CenterArgs,

        /// Height of the rectangle in degrees
        #[arg(long, default_value_t = 0.1)]
        lat_span: f64,

        /// Width of the rectangle in degrees
        #[arg(long, default_value_t = 0.1)]
        lon_span: f64,

        #[command(flatten)]
        list: ListOptions,
    },

    /// List photos near a point, nearest first
    Nearby {
        #[command(flatten)]
        center: CenterArgs,

        /// Search radius in kilometres (default from config)
        #[arg(long)]
        radius_km: Option<f64>,

        #[command(flatten)]
        list: ListOptions,
    },

    /// Create a photo record as the configured user
    Add {
        #[arg(long)]
        title: String,

        #[command(flatten)]
        center: CenterArgs,

        /// Image URL (repeat for several images)
        #[arg(long = "image", required = true)]
        images: Vec<String>,

        #[arg(long)]
        description: Option<String>,

        /// Human-readable place name
        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        thumbnail: Option<String>,
    },
}

/// A point given as `--lat` / `--lon`.
#[derive(Debug, Clone, Copy, Args)]
pub struct CenterArgs {
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,
}

impl CenterArgs {
    pub fn coordinate(&self) -> Result<Coordinate, CliError> {
        Coordinate::try_new(self.lat, self.lon)
            .map_err(|e| CliError::InvalidArgument(e.to_string()))
    }
}

#[derive(Debug, Clone, Args)]
pub struct ListOptions {
    /// Show at most this many photos
    #[arg(long)]
    pub limit: Option<usize>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Run a photo subcommand.
pub fn run(runner: &CliRunner, command: PhotoCommands) -> Result<(), CliError> {
    runner.log_startup("photos");
    let app = runner.start_app()?;
    let repository = app.repository();

    match command {
        PhotoCommands::All(list) => {
            let photos = runner.block_on(repository.fetch_all())?;
            print_photos(&photos, &list, None)
        }
        PhotoCommands::Owner { owner_id, list } => {
            let photos = runner.block_on(repository.fetch_by_owner(&owner_id))?;
            print_photos(&photos, &list, None)
        }
        PhotoCommands::Region {
            center,
            lat_span,
            lon_span,
            list,
        } => {
            let region = ViewportRegion::try_new(center.coordinate()?, lat_span, lon_span)
                .map_err(|e| CliError::InvalidArgument(e.to_string()))?;
            let photos = runner.block_on(repository.fetch_by_region(&region))?;
            print_photos(&photos, &list, None)
        }
        PhotoCommands::Nearby {
            center,
            radius_km,
            list,
        } => {
            let origin = center.coordinate()?;
            let radius = radius_km.unwrap_or(app.config().feed.nearby_radius_km);
            if !(radius.is_finite() && radius > 0.0) {
                return Err(CliError::InvalidArgument(format!(
                    "radius must be positive, got {}",
                    radius
                )));
            }
            let photos = runner.block_on(repository.fetch_nearby(origin, radius))?;
            print_photos(&photos, &list, Some(origin))
        }
        PhotoCommands::Add {
            title,
            center,
            images,
            description,
            location,
            thumbnail,
        } => {
            let mut input = NewPhotoInput::new(title, center.coordinate()?, images);
            if let Some(description) = description {
                input = input.with_description(description);
            }
            if let Some(location) = location {
                input = input.with_location_name(location);
            }
            if let Some(thumbnail) = thumbnail {
                input = input.with_thumbnail(thumbnail);
            }

            let photo = runner.block_on(repository.create(input))?;
            println!("{} {}", style("Created").green().bold(), photo.id);
            Ok(())
        }
    }
}

fn print_photos(
    photos: &[Photo],
    options: &ListOptions,
    origin: Option<Coordinate>,
) -> Result<(), CliError> {
    let shown = &photos[..options.limit.unwrap_or(photos.len()).min(photos.len())];

    if options.json {
        let json = serde_json::to_string_pretty(shown)
            .map_err(|e| CliError::InvalidArgument(format!("Failed to encode JSON: {}", e)))?;
        println!("{}", json);
        return Ok(());
    }

    if shown.is_empty() {
        println!("No photos found.");
        return Ok(());
    }

    for photo in shown {
        println!("{}", format_photo(photo, origin));
    }
    if shown.len() < photos.len() {
        println!(
            "{}",
            style(format!("... {} more", photos.len() - shown.len())).dim()
        );
    }
    Ok(())
}

/// One listing line: date, position, optional distance, title and id.
pub fn format_photo(photo: &Photo, origin: Option<Coordinate>) -> String {
    let mut line = format!(
        "{}  ({:>9.4}, {:>9.4})",
        photo.created_at.format("%Y-%m-%d"),
        photo.coordinate.latitude,
        photo.coordinate.longitude
    );
    if let Some(origin) = origin {
        let km = photomap::geo::distance_km(origin, photo.coordinate);
        line.push_str(&format!("  {:>7.2} km", km));
    }
    line.push_str(&format!("  {}", style(&photo.title).bold()));
    if !photo.location_name.is_empty() {
        line.push_str(&format!(" - {}", photo.location_name));
    }
    if let Some(name) = photo.owner.as_ref().and_then(|o| o.username.as_deref()) {
        line.push_str(&format!(" by @{}", name));
    }
    line.push_str(&format!("  {}", style(&photo.id).dim()));
    line
}
