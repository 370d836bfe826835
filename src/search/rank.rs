use super::PharmacyRecord;
use crate::coordinates::{Coordinate, distance_in_km};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// User-selected sort key for an aggregated result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortKey {
  /// Keep the gateway's order.
  #[default]
  None,
  /// Ascending distance from the caller's position.
  Distance,
  /// Ascending lowest offered price.
  Price,
  /// Distance first, price as the tie-breaker on equal distance.
  PriceDistance,
}

impl SortKey {
  #[must_use]
  pub fn name(&self) -> &'static str {
    match self {
      SortKey::None => "none",
      SortKey::Distance => "distance",
      SortKey::Price => "price",
      SortKey::PriceDistance => "price-distance",
    }
  }

  #[must_use]
  pub fn all() -> &'static [SortKey] {
    &[
      SortKey::None,
      SortKey::Distance,
      SortKey::Price,
      SortKey::PriceDistance,
    ]
  }
}

impl Display for SortKey {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.name())
  }
}

impl std::str::FromStr for SortKey {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    SortKey::all()
      .iter()
      .find(|key| key.name() == s)
      .copied()
      .ok_or_else(|| format!("unknown sort key: {s}"))
  }
}

/// Sorts a copy of `records` by `key`, measuring distances from `origin`.
/// The input is left untouched and the sort is stable, so `SortKey::None`
/// and exact ties preserve the gateway's order. Records without a usable
/// position or price sort last via infinity sentinels; no NaN ever reaches
/// a comparator.
#[must_use]
pub fn rank(records: &[PharmacyRecord], key: SortKey, origin: Coordinate) -> Vec<PharmacyRecord> {
  let mut ranked = records.to_vec();
  match key {
    SortKey::None => {}
    SortKey::Distance => {
      ranked.sort_by(|a, b| distance_from(a, origin).total_cmp(&distance_from(b, origin)));
    }
    SortKey::Price => {
      ranked.sort_by(|a, b| lowest_price(a).total_cmp(&lowest_price(b)));
    }
    SortKey::PriceDistance => {
      ranked.sort_by(|a, b| {
        distance_from(a, origin)
          .total_cmp(&distance_from(b, origin))
          .then_with(|| lowest_price(a).total_cmp(&lowest_price(b)))
      });
    }
  }
  ranked
}

/// Distance of a record from `origin` in kilometers, infinity when the
/// record carries no usable position.
#[must_use]
pub fn distance_from(record: &PharmacyRecord, origin: Coordinate) -> f64 {
  record
    .coordinate()
    .map_or(f64::INFINITY, |coord| distance_in_km(coord, origin))
}

/// The cheapest price this pharmacy offers among its attached medications,
/// infinity when it offers none. Only offers belonging to the record's own
/// id count.
#[must_use]
pub fn lowest_price(record: &PharmacyRecord) -> f64 {
  record
    .medications
    .iter()
    .flat_map(|medication| &medication.pharmacies)
    .filter(|offer| offer.pharmacy.id == record.id && offer.price.is_finite())
    .map(|offer| offer.price)
    .fold(f64::INFINITY, f64::min)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::search::{MedicationRecord, PharmacyOffer};
  use rstest::rstest;

  fn pharmacy_at(id: u64, name: &str, lat: f64, lon: f64) -> PharmacyRecord {
    PharmacyRecord {
      id,
      name: name.to_string(),
      address: None,
      latitude: Some(lat),
      longitude: Some(lon),
      phone: None,
      email: None,
      website: None,
      operating_hours: None,
      delivery_available: false,
      status: None,
      medications: Vec::new(),
    }
  }

  fn with_price(mut record: PharmacyRecord, price: f64) -> PharmacyRecord {
    let offer = PharmacyOffer {
      pharmacy: pharmacy_at(record.id, &record.name, 0.0, 0.0),
      price,
    };
    record.medications.push(MedicationRecord {
      id: 100 + record.id,
      name: "Paracetamol".to_string(),
      pharmacies: vec![offer],
    });
    record
  }

  #[rstest]
  #[case("none", SortKey::None)]
  #[case("distance", SortKey::Distance)]
  #[case("price", SortKey::Price)]
  #[case("price-distance", SortKey::PriceDistance)]
  fn sort_keys_round_trip_through_strings(#[case] s: &str, #[case] key: SortKey) {
    assert_eq!(s.parse::<SortKey>().unwrap(), key);
    assert_eq!(key.to_string(), s);
  }

  #[test]
  fn unknown_sort_key_is_rejected() {
    assert!("cheapest".parse::<SortKey>().is_err());
  }

  #[test]
  fn none_preserves_input_order() {
    let records = vec![
      pharmacy_at(1, "B", 12.0, 38.0),
      pharmacy_at(2, "A", 11.0, 37.0),
    ];
    let ranked = rank(&records, SortKey::None, Coordinate::new(11.0, 37.0));
    assert_eq!(ranked[0].id, 1);
    assert_eq!(ranked[1].id, 2);
  }

  #[test]
  fn distance_sorts_nearest_first_and_does_not_mutate_input() {
    let origin = Coordinate::new(11.5742, 37.3614);
    let records = vec![
      pharmacy_at(1, "Far", 13.5, 39.5),
      pharmacy_at(2, "Near", 11.58, 37.37),
      pharmacy_at(3, "Mid", 12.0, 38.0),
    ];
    let ranked = rank(&records, SortKey::Distance, origin);
    assert_eq!(
      ranked.iter().map(|r| r.id).collect::<Vec<_>>(),
      vec![2, 3, 1]
    );
    // Original untouched.
    assert_eq!(records.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2, 3]);
  }

  #[test]
  fn records_without_position_sort_last_on_distance() {
    let origin = Coordinate::new(11.5742, 37.3614);
    let mut nowhere = pharmacy_at(1, "Nowhere", 0.0, 0.0);
    nowhere.latitude = None;
    nowhere.longitude = None;
    let records = vec![nowhere, pharmacy_at(2, "Near", 11.58, 37.37)];
    let ranked = rank(&records, SortKey::Distance, origin);
    assert_eq!(ranked[0].id, 2);
    assert_eq!(ranked[1].id, 1);
  }

  #[test]
  fn priceless_records_sort_last_regardless_of_input_order() {
    let origin = Coordinate::new(11.5742, 37.3614);
    let priceless = pharmacy_at(1, "No price", 11.6, 37.4);
    let cheap = with_price(pharmacy_at(2, "Cheap", 11.6, 37.4), 3.0);
    let pricey = with_price(pharmacy_at(3, "Pricey", 11.6, 37.4), 9.0);

    for records in [
      vec![priceless.clone(), pricey.clone(), cheap.clone()],
      vec![cheap.clone(), priceless.clone(), pricey.clone()],
    ] {
      let ranked = rank(&records, SortKey::Price, origin);
      assert_eq!(
        ranked.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![2, 3, 1]
      );
    }
  }

  #[test]
  fn price_breaks_exact_distance_ties() {
    let origin = Coordinate::new(11.5742, 37.3614);
    // Identical positions, different prices.
    let pricey = with_price(pharmacy_at(1, "Pricey", 11.6, 37.4), 9.0);
    let cheap = with_price(pharmacy_at(2, "Cheap", 11.6, 37.4), 3.0);
    let far_cheap = with_price(pharmacy_at(3, "Far cheap", 13.0, 39.0), 1.0);

    let ranked = rank(
      &[pricey, cheap, far_cheap],
      SortKey::PriceDistance,
      origin,
    );
    // Distance dominates; price only decides the tied pair.
    assert_eq!(
      ranked.iter().map(|r| r.id).collect::<Vec<_>>(),
      vec![2, 1, 3]
    );
  }

  #[test]
  fn lowest_price_ignores_offers_of_other_pharmacies() {
    let mut record = pharmacy_at(1, "Green", 11.6, 37.4);
    record.medications.push(MedicationRecord {
      id: 10,
      name: "Paracetamol".to_string(),
      pharmacies: vec![
        PharmacyOffer {
          pharmacy: pharmacy_at(2, "Other", 0.0, 0.0),
          price: 1.0,
        },
        PharmacyOffer {
          pharmacy: pharmacy_at(1, "Green", 0.0, 0.0),
          price: 5.0,
        },
      ],
    });
    assert!((lowest_price(&record) - 5.0).abs() < f64::EPSILON);
  }

  #[test]
  fn toggling_back_to_none_restores_original_order() {
    let origin = Coordinate::new(11.5742, 37.3614);
    let records = vec![
      pharmacy_at(1, "Far", 13.5, 39.5),
      pharmacy_at(2, "Near", 11.58, 37.37),
    ];
    let by_distance = rank(&records, SortKey::Distance, origin);
    assert_eq!(by_distance[0].id, 2);
    let back = rank(&records, SortKey::None, origin);
    assert_eq!(back.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);
  }
}
