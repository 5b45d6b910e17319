//! Deterministic synthetic event tables for the demo mode, tests and benches.

use super::{Event, EventTable};

const GROUPS: [&str; 8] = [
    "Shining Path",
    "Red Brigades",
    "Basque Fatherland and Freedom",
    "Tamil Tigers",
    "Abu Sayyaf",
    "Irish Republican Army",
    "FARC",
    "Al-Shabaab",
];

const ATTACK_TYPES: [&str; 6] = [
    "Armed Assault",
    "Assassination",
    "Bombing/Explosion",
    "Facility/Infrastructure Attack",
    "Hijacking",
    "Hostage Taking (Kidnapping)",
];

/// (country, city, lon, lat)
const PLACES: [(&str, &str, f64, f64); 12] = [
    ("Peru", "Lima", -77.0, -12.0),
    ("Italy", "Rome", 12.5, 41.9),
    ("Spain", "Bilbao", -2.9, 43.3),
    ("Sri Lanka", "Colombo", 79.9, 6.9),
    ("Philippines", "Manila", 121.0, 14.6),
    ("United Kingdom", "Belfast", -5.9, 54.6),
    ("Colombia", "Bogota", -74.1, 4.7),
    ("Somalia", "Mogadishu", 45.3, 2.0),
    ("Kenya", "Nairobi", 36.8, -1.3),
    ("India", "Delhi", 77.2, 28.6),
    ("France", "Paris", 2.3, 48.9),
    ("Nigeria", "Lagos", 3.4, 6.5),
];

/// Fast 2-value hash with xorshift
#[inline(always)]
fn hash2(a: u64, b: u64) -> u64 {
    let mut seed = a
        .wrapping_mul(2654435761)
        .wrapping_add(b.wrapping_mul(2246822519));
    seed ^= seed << 13;
    seed ^= seed >> 7;
    seed ^= seed << 17;
    seed
}

/// Splitmix64 mapped to [0, 1)
#[inline(always)]
fn unit(seed: u64) -> f64 {
    let mut x = seed.wrapping_mul(0x9e3779b97f4a7c15);
    x ^= x >> 30;
    x = x.wrapping_mul(0xbf58476d1ce4e5b9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94d049bb133111eb);
    x ^= x >> 31;
    (x >> 11) as f64 / 9007199254740992.0
}

fn pick<T: Copy>(items: &[T], r: f64) -> T {
    items[((r * items.len() as f64) as usize).min(items.len() - 1)]
}

/// A table of `rows` events, identical for identical `seed`s.
///
/// Each group operates in three countries; roughly one row in ten has no
/// coordinates.
pub fn synthetic_table(rows: usize, seed: u64) -> EventTable {
    let events = (0..rows as u64)
        .map(|i| {
            let r = |salt: u64| unit(hash2(seed ^ salt, i));

            let group_idx = (r(1) * GROUPS.len() as f64) as usize % GROUPS.len();
            let place_idx = (group_idx + (r(2) * 3.0) as usize) % PLACES.len();
            let (country, city, lon, lat) = PLACES[place_idx];
            let attack_type = pick(&ATTACK_TYPES, r(3));

            // Heavy tail: most incidents kill nobody.
            let severity = r(4);
            let fatalities = if severity < 0.55 {
                0
            } else {
                (severity.powi(8) * 120.0) as u32
            };
            let wounded = (r(5).powi(4) * 200.0) as u32;
            let year = 1970 + (r(6) * 50.0) as i32;

            let located = r(7) > 0.1;
            Event {
                year,
                group: Some(GROUPS[group_idx].to_owned()),
                country: Some(country.to_owned()),
                city: Some(city.to_owned()),
                attack_type: Some(attack_type.to_owned()),
                fatalities,
                wounded,
                summary: format!("{attack_type} in {city}"),
                latitude: located.then(|| lat + (r(8) - 0.5) * 2.0),
                longitude: located.then(|| lon + (r(9) - 0.5) * 2.0),
            }
        })
        .collect();

    EventTable::new(events, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_table() {
        let a = synthetic_table(200, 42);
        let b = synthetic_table(200, 42);
        assert_eq!(a.events(), b.events());
    }

    #[test]
    fn different_seed_different_table() {
        let a = synthetic_table(200, 1);
        let b = synthetic_table(200, 2);
        assert_ne!(a.events(), b.events());
    }

    #[test]
    fn rows_are_normalized() {
        let table = synthetic_table(1_000, 9);
        assert_eq!(table.len(), 1_000);
        assert!(table.has_geolocation());
        for e in table.events() {
            assert!((1970..2020).contains(&e.year));
            assert!(e.group.is_some() && e.country.is_some() && e.attack_type.is_some());
        }
        assert!(table.events().iter().any(|e| e.coordinates().is_none()));
        assert!(table.events().iter().any(|e| e.fatalities > 0));
    }
}
