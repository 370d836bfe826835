use clap::Parser as CliParser;
use itertools::Itertools;
use log::error;
use pharmseek::config::Config;
use pharmseek::coordinates::Coordinate;
use pharmseek::geolocate::{self, PositionError, PositionSource};
use pharmseek::search::gateway::HttpGateway;
use pharmseek::search::rank::{self, SortKey};
use pharmseek::search::{PharmacyRecord, SearchCriteria, SearchOutcome, Searcher};

#[derive(clap::Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
  /// Medication name to search for.
  #[arg(short, long)]
  medication: Option<String>,
  /// Pharmacy name to search for.
  #[arg(short, long)]
  pharmacy: Option<String>,
  /// Sort key. Values: none, distance, price, price-distance.
  #[arg(short, long, default_value = "none")]
  sort: String,
  /// Manual latitude; together with --lon it replaces a live position.
  #[arg(long)]
  lat: Option<f64>,
  /// Manual longitude.
  #[arg(long)]
  lon: Option<f64>,
  /// Backend API base URL, overriding config file and environment.
  #[arg(long)]
  api_url: Option<String>,
}

/// Position source fed from the command line. Without both coordinates the
/// host counts as location-less and the default position applies.
struct ManualPosition(Option<Coordinate>);

#[async_trait::async_trait]
impl PositionSource for ManualPosition {
  fn is_supported(&self) -> bool {
    self.0.is_some()
  }

  async fn current_position(&self) -> Result<Coordinate, PositionError> {
    self.0.ok_or(PositionError::Unavailable)
  }
}

#[tokio::main]
async fn main() {
  let args = Args::parse();

  env_logger::init();

  let config = Config::new();
  let sort = match args.sort.parse::<SortKey>() {
    Ok(key) => key,
    Err(e) => {
      error!("{e}. Falling back to {}.", config.default_sort);
      config.default_sort
    }
  };

  let api_url = args
    .api_url
    .unwrap_or_else(|| config.api_url().to_string());
  let gateway = HttpGateway::new(api_url, config.request_timeout());
  let searcher = Searcher::new(Box::new(gateway));

  let manual = match (args.lat, args.lon) {
    (Some(lat), Some(lon)) => Coordinate::checked(lat, lon),
    _ => config.fixed_position,
  };
  let fix = geolocate::resolve(&ManualPosition(manual)).await;
  if let Some(message) = &fix.error {
    println!("{message} Using the default position.");
  }
  let origin = fix.coordinate();

  let criteria = SearchCriteria {
    medication: args.medication,
    pharmacy: args.pharmacy,
  };

  match searcher.search(&criteria).await {
    SearchOutcome::Empty => {
      println!("Nothing to search for. Pass --medication and/or --pharmacy.");
    }
    SearchOutcome::Failed => {
      println!("No results. The backend could not be reached; try again or check the connection.");
    }
    SearchOutcome::Pharmacies(records) | SearchOutcome::Medications(records) => {
      if records.is_empty() {
        println!("No results. Try different keywords.");
        return;
      }
      for record in rank::rank(&records, sort, origin) {
        print_record(&record, origin);
      }
    }
  }
}

fn print_record(record: &PharmacyRecord, origin: Coordinate) {
  let distance = rank::distance_from(record, origin);
  let distance = if distance.is_finite() {
    format!("{distance:.1} km")
  } else {
    "unknown distance".to_string()
  };

  let price = rank::lowest_price(record);
  let price = if price.is_finite() {
    format!(", from {price:.2}")
  } else {
    String::new()
  };

  if record.medications.is_empty() {
    println!("{} ({distance})", record.name);
  } else {
    let medications = record
      .medications
      .iter()
      .map(|medication| medication.name.as_str())
      .join(", ");
    println!("{} ({distance}{price}): {medications}", record.name);
  }
}
