/// Distance quoted for every route until real geocoding is wired in
pub const PLACEHOLDER_DISTANCE_KM: f64 = 10.5;

/// Quote the distance between two free-text locations, in kilometres
pub fn quote_distance(_pickup: &str, _dropoff: &str) -> f64 {
    PLACEHOLDER_DISTANCE_KM
}

/// Price of a trip of `distance_km` at `fare_per_km`
pub fn quote_price(distance_km: f64, fare_per_km: f64) -> f64 {
    distance_km * fare_per_km
}

/// Apply a percentage discount to a price
pub fn apply_discount(price: f64, discount_pct: f64) -> f64 {
    price * (1.0 - discount_pct / 100.0)
}

/// Fold one more rating into a running average over `count` ratings
pub fn next_average(average: f64, count: i32, rating: i32) -> f64 {
    (average * count as f64 + rating as f64) / (count as f64 + 1.0)
}
