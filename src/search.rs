pub mod gateway;
pub mod rank;

use crate::coordinates::Coordinate;
use gateway::SearchGateway;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// A pharmacy as returned by the backend. `medications` is only populated
/// when the medication dimension was part of the search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PharmacyRecord {
  pub id: u64,
  pub name: String,
  #[serde(default)]
  pub address: Option<String>,
  #[serde(default)]
  pub latitude: Option<f64>,
  #[serde(default)]
  pub longitude: Option<f64>,
  #[serde(default)]
  pub phone: Option<String>,
  #[serde(default)]
  pub email: Option<String>,
  #[serde(default)]
  pub website: Option<String>,
  #[serde(default)]
  pub operating_hours: Option<String>,
  #[serde(default)]
  pub delivery_available: bool,
  #[serde(default)]
  pub status: Option<String>,
  #[serde(default)]
  pub medications: Vec<MedicationRecord>,
}

impl PharmacyRecord {
  /// The record's position, if the backend supplied a usable one.
  /// Missing or degenerate components yield `None`.
  #[must_use]
  pub fn coordinate(&self) -> Option<Coordinate> {
    match (self.latitude, self.longitude) {
      (Some(lat), Some(lon)) => Coordinate::checked(lat, lon),
      _ => None,
    }
  }
}

/// A medication as returned by the backend. Prices live on the per-pharmacy
/// association, not on the medication itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationRecord {
  pub id: u64,
  pub name: String,
  #[serde(default)]
  pub pharmacies: Vec<PharmacyOffer>,
}

/// One pharmacy's offer of a medication: the pharmacy's own fields plus the
/// price it charges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PharmacyOffer {
  #[serde(flatten)]
  pub pharmacy: PharmacyRecord,
  pub price: f64,
}

/// Free-text search input. A dimension counts as absent when it is `None`
/// or whitespace-only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
  pub medication: Option<String>,
  pub pharmacy: Option<String>,
}

impl SearchCriteria {
  #[must_use]
  pub fn medication(query: impl Into<String>) -> Self {
    Self {
      medication: Some(query.into()),
      pharmacy: None,
    }
  }

  #[must_use]
  pub fn pharmacy(query: impl Into<String>) -> Self {
    Self {
      medication: None,
      pharmacy: Some(query.into()),
    }
  }

  #[must_use]
  pub fn both(medication: impl Into<String>, pharmacy: impl Into<String>) -> Self {
    Self {
      medication: Some(medication.into()),
      pharmacy: Some(pharmacy.into()),
    }
  }

  #[must_use]
  pub fn medication_query(&self) -> Option<&str> {
    Self::non_empty(self.medication.as_deref())
  }

  #[must_use]
  pub fn pharmacy_query(&self) -> Option<&str> {
    Self::non_empty(self.pharmacy.as_deref())
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.medication_query().is_none() && self.pharmacy_query().is_none()
  }

  fn non_empty(query: Option<&str>) -> Option<&str> {
    query.map(str::trim).filter(|q| !q.is_empty())
  }
}

/// The outcome of one search invocation. `Failed` is a distinct render
/// state from a valid-but-empty result list.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
  /// Both queries were empty; the gateway was not contacted.
  Empty,
  /// A gateway call failed; details were logged.
  Failed,
  /// Pharmacy-dimension results, joined with medications when both
  /// dimensions were queried.
  Pharmacies(Vec<PharmacyRecord>),
  /// Medication-dimension results regrouped into pharmacy-centric records.
  Medications(Vec<PharmacyRecord>),
}

impl SearchOutcome {
  #[must_use]
  pub fn records(&self) -> &[PharmacyRecord] {
    match self {
      SearchOutcome::Empty | SearchOutcome::Failed => &[],
      SearchOutcome::Pharmacies(records) | SearchOutcome::Medications(records) => records,
    }
  }
}

/// Runs searches against a gateway and merges the raw responses into a
/// pharmacy-centric result list. Pure over its inputs; sorting is the
/// ranker's job.
pub struct Searcher {
  gateway: Box<dyn SearchGateway>,
}

impl Searcher {
  #[must_use]
  pub fn new(gateway: Box<dyn SearchGateway>) -> Self {
    Self { gateway }
  }

  /// Searches the non-empty dimensions of `criteria`, both concurrently
  /// when both are given. Never panics and never propagates gateway
  /// errors; those collapse into [`SearchOutcome::Failed`].
  pub async fn search(&self, criteria: &SearchCriteria) -> SearchOutcome {
    let medication_query = criteria.medication_query();
    let pharmacy_query = criteria.pharmacy_query();
    if medication_query.is_none() && pharmacy_query.is_none() {
      return SearchOutcome::Empty;
    }

    log::debug!(
      "searching via '{}': medication={medication_query:?} pharmacy={pharmacy_query:?}",
      self.gateway.name()
    );

    let (pharmacies, medications) = tokio::join!(
      async {
        match pharmacy_query {
          Some(query) => Some(self.gateway.search_pharmacies(query).await),
          None => None,
        }
      },
      async {
        match medication_query {
          Some(query) => Some(self.gateway.search_medications(query).await),
          None => None,
        }
      }
    );

    let pharmacies = match pharmacies.transpose() {
      Ok(records) => records,
      Err(e) => {
        log::warn!("pharmacy search failed: {e}");
        return SearchOutcome::Failed;
      }
    };
    let medications = match medications.transpose() {
      Ok(records) => records,
      Err(e) => {
        log::warn!("medication search failed: {e}");
        return SearchOutcome::Failed;
      }
    };

    match (pharmacies, medications, pharmacy_query) {
      (Some(pharmacies), Some(medications), Some(query)) => {
        SearchOutcome::Pharmacies(join_matching(pharmacies, &medications, query))
      }
      // Pharmacy-only trusts the gateway's matching; no local name filter.
      (Some(pharmacies), None, _) => SearchOutcome::Pharmacies(pharmacies),
      (None, Some(medications), _) => {
        SearchOutcome::Medications(group_by_pharmacy(&medications))
      }
      (None, None, _) => SearchOutcome::Empty,
      // Pharmacy results exist only when a pharmacy query was given.
      (Some(_), Some(_), None) => unreachable!("pharmacy results without a pharmacy query"),
    }
  }

  /// Runs [`Searcher::search`] under a [`ResultSlot`] generation so that a
  /// stale response cannot overwrite a newer one. Returns whether the
  /// outcome was committed.
  pub async fn search_latest(&self, criteria: &SearchCriteria, slot: &ResultSlot) -> bool {
    let generation = slot.begin();
    let outcome = self.search(criteria).await;
    let committed = slot.commit(generation, outcome);
    if !committed {
      log::debug!("discarding superseded search response (generation {generation})");
    }
    committed
  }
}

/// Groups medication results by the pharmacies embedded in each offer, in
/// first-seen order. A medication offered by several pharmacies appears
/// once under each of them; the grouped record's fields come from the
/// embedded association.
fn group_by_pharmacy(medications: &[MedicationRecord]) -> Vec<PharmacyRecord> {
  let mut grouped: Vec<PharmacyRecord> = Vec::new();
  for medication in medications {
    for offer in &medication.pharmacies {
      if let Some(entry) = grouped.iter_mut().find(|p| p.id == offer.pharmacy.id) {
        entry.medications.push(medication.clone());
      } else {
        let mut record = offer.pharmacy.clone();
        record.medications = vec![medication.clone()];
        grouped.push(record);
      }
    }
  }
  grouped
}

/// Combined-search join: keep pharmacies whose name contains the query
/// case-insensitively and that carry at least one of the found medications,
/// attaching those medications. Gateway order is preserved.
fn join_matching(
  pharmacies: Vec<PharmacyRecord>,
  medications: &[MedicationRecord],
  pharmacy_query: &str,
) -> Vec<PharmacyRecord> {
  let needle = pharmacy_query.to_lowercase();
  pharmacies
    .into_iter()
    .filter(|pharmacy| pharmacy.name.to_lowercase().contains(&needle))
    .filter_map(|mut pharmacy| {
      let matched: Vec<MedicationRecord> = medications
        .iter()
        .filter(|medication| {
          medication
            .pharmacies
            .iter()
            .any(|offer| offer.pharmacy.id == pharmacy.id)
        })
        .cloned()
        .collect();
      if matched.is_empty() {
        None
      } else {
        pharmacy.medications = matched;
        Some(pharmacy)
      }
    })
    .collect()
}

/// Latest-wins commit cell for concurrent searches.
///
/// Callers draw a generation with [`ResultSlot::begin`] before awaiting the
/// search and [`ResultSlot::commit`] the outcome afterwards; a response
/// whose generation is older than the last committed one is dropped.
pub struct ResultSlot {
  next: AtomicU64,
  committed: Mutex<(u64, SearchOutcome)>,
}

impl Default for ResultSlot {
  fn default() -> Self {
    Self::new()
  }
}

impl ResultSlot {
  #[must_use]
  pub fn new() -> Self {
    Self {
      next: AtomicU64::new(0),
      committed: Mutex::new((0, SearchOutcome::Empty)),
    }
  }

  /// Draws the next request generation.
  pub fn begin(&self) -> u64 {
    self.next.fetch_add(1, Ordering::SeqCst) + 1
  }

  /// Stores `outcome` unless a newer generation has already committed.
  /// Returns whether the outcome was stored.
  pub fn commit(&self, generation: u64, outcome: SearchOutcome) -> bool {
    let mut committed = self.committed.lock().unwrap();
    if generation < committed.0 {
      return false;
    }
    *committed = (generation, outcome);
    true
  }

  /// The most recently committed outcome.
  #[must_use]
  pub fn latest(&self) -> SearchOutcome {
    self.committed.lock().unwrap().1.clone()
  }
}
