//! Cascading filter domains and the combined row predicate.
//!
//! The selected group narrows every other domain; country, year, attack
//! type and fatality choices only narrow the result, never each other's
//! available values.

mod bound;

pub use bound::Bound;

use std::collections::BTreeSet;

use crate::data::{Event, EventTable};

/// Selectable values for every control below the group selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    pub countries: Vec<String>,
    pub years: Bound<i32>,
    pub attack_types: Vec<String>,
    pub fatalities: Bound<u32>,
}

/// Current value of every sidebar control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selections {
    pub group: String,
    /// `None` only when the group has no country at all.
    pub country: Option<String>,
    pub years: Bound<i32>,
    pub attack_types: BTreeSet<String>,
    pub min_fatalities: u32,
    pub keyword: String,
}

/// Rows that passed the filter, in table order.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    rows: Vec<&'a Event>,
    has_geolocation: bool,
}

impl<'a> FilteredView<'a> {
    pub fn rows(&self) -> &[&'a Event] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_geolocation(&self) -> bool {
        self.has_geolocation
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Event> + '_ {
        self.rows.iter().copied()
    }
}

/// Sorted distinct group names.
pub fn groups(table: &EventTable) -> Vec<String> {
    sorted_distinct(table.events().iter().filter_map(|e| e.group.as_deref()))
}

/// Domains derived from the rows of `group`.
///
/// When the group has no rows the year and fatality bounds come from the
/// whole table; an empty table yields `Fixed(0)` for both.
pub fn domain(table: &EventTable, group: &str) -> Domain {
    let in_group: Vec<&Event> = table
        .events()
        .iter()
        .filter(|e| e.group.as_deref() == Some(group))
        .collect();

    let bounds_source: Vec<&Event> = if in_group.is_empty() {
        table.events().iter().collect()
    } else {
        in_group.clone()
    };

    Domain {
        countries: sorted_distinct(in_group.iter().filter_map(|e| e.country.as_deref())),
        years: Bound::spanning(bounds_source.iter().map(|e| e.year)).unwrap_or(Bound::Fixed(0)),
        attack_types: sorted_distinct(in_group.iter().filter_map(|e| e.attack_type.as_deref())),
        fatalities: Bound::spanning(bounds_source.iter().map(|e| e.fatalities))
            .unwrap_or(Bound::Fixed(0)),
    }
}

/// Rows matching every selection.
pub fn apply<'a>(table: &'a EventTable, selections: &Selections) -> FilteredView<'a> {
    let predicate = Predicate::new(selections);
    FilteredView {
        rows: table.events().iter().filter(|e| predicate.matches(e)).collect(),
        has_geolocation: table.has_geolocation(),
    }
}

fn sorted_distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .collect::<BTreeSet<&str>>()
        .into_iter()
        .map(str::to_owned)
        .collect()
}

/// The conjunction of every selection, with the keyword lowered once.
struct Predicate<'s> {
    group: &'s str,
    country: Option<&'s str>,
    years: Bound<i32>,
    attack_types: &'s BTreeSet<String>,
    min_fatalities: u32,
    keyword: Option<String>,
}

impl<'s> Predicate<'s> {
    fn new(selections: &'s Selections) -> Self {
        let keyword = &selections.keyword;
        Self {
            group: &selections.group,
            country: selections.country.as_deref(),
            years: selections.years,
            attack_types: &selections.attack_types,
            min_fatalities: selections.min_fatalities,
            keyword: (!keyword.is_empty()).then(|| keyword.to_lowercase()),
        }
    }

    #[inline]
    fn matches(&self, event: &Event) -> bool {
        event.group.as_deref() == Some(self.group)
            && self.country.is_some()
            && event.country.as_deref() == self.country
            && self.years.contains(event.year)
            && event
                .attack_type
                .as_ref()
                .is_some_and(|t| self.attack_types.contains(t))
            && event.fatalities >= self.min_fatalities
            && self
                .keyword
                .as_deref()
                .map_or(true, |k| event.summary.to_lowercase().contains(k))
    }
}

impl Selections {
    /// First country, the whole year span, every attack type, the lowest
    /// fatality floor and no keyword.
    pub fn defaults(group: &str, domain: &Domain) -> Self {
        Self {
            group: group.to_owned(),
            country: domain.countries.first().cloned(),
            years: domain.years,
            attack_types: domain.attack_types.iter().cloned().collect(),
            min_fatalities: domain.fatalities.min(),
            keyword: String::new(),
        }
    }

    /// Move the lower year end by `delta`, never past the upper end.
    pub fn step_year_from(&mut self, domain: &Domain, delta: i32) {
        if domain.years.is_fixed() {
            return;
        }
        let to = self.years.max();
        let from = domain.years.clamp(self.years.min().saturating_add(delta)).min(to);
        self.years = Bound::new(from, to);
    }

    /// Move the upper year end by `delta`, never past the lower end.
    pub fn step_year_to(&mut self, domain: &Domain, delta: i32) {
        if domain.years.is_fixed() {
            return;
        }
        let from = self.years.min();
        let to = domain.years.clamp(self.years.max().saturating_add(delta)).max(from);
        self.years = Bound::new(from, to);
    }

    pub fn step_min_fatalities(&mut self, domain: &Domain, delta: i64) {
        if domain.fatalities.is_fixed() {
            self.min_fatalities = domain.fatalities.min();
            return;
        }
        let stepped = (self.min_fatalities as i64 + delta).clamp(0, u32::MAX as i64) as u32;
        self.min_fatalities = domain.fatalities.clamp(stepped);
    }

    /// Cycle the selected country through the domain list.
    pub fn cycle_country(&mut self, domain: &Domain, forward: bool) {
        self.country = cycle(&domain.countries, self.country.as_deref(), forward);
    }

    pub fn toggle_attack_type(&mut self, attack_type: &str) {
        if !self.attack_types.remove(attack_type) {
            self.attack_types.insert(attack_type.to_owned());
        }
    }

    pub fn select_all_attack_types(&mut self, domain: &Domain) {
        self.attack_types = domain.attack_types.iter().cloned().collect();
    }
}

/// Next (or previous) entry after `current`, wrapping around.
pub fn cycle(values: &[String], current: Option<&str>, forward: bool) -> Option<String> {
    if values.is_empty() {
        return None;
    }
    let len = values.len();
    let next = match current.and_then(|c| values.iter().position(|v| v == c)) {
        Some(i) if forward => (i + 1) % len,
        Some(i) => (i + len - 1) % len,
        None => 0,
    };
    Some(values[next].clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tests::event;
    use crate::data::synthetic_table;

    /// Group A: 2001 in X (bombing, 5) and 2003 in Y (bombing, 0).
    fn example_table() -> EventTable {
        EventTable::new(
            vec![
                event(2001, "A", "X", "bombing", 5),
                event(2003, "A", "Y", "bombing", 0),
                event(1995, "B", "Z", "hijacking", 40),
            ],
            false,
        )
    }

    fn select(country: &str, years: Bound<i32>, min_fatalities: u32) -> Selections {
        Selections {
            group: "A".into(),
            country: Some(country.into()),
            years,
            attack_types: ["bombing".to_owned()].into_iter().collect(),
            min_fatalities,
            keyword: String::new(),
        }
    }

    #[test]
    fn worked_example_selects_single_row() {
        let table = example_table();
        let view = apply(&table, &select("X", Bound::Fixed(2001), 0));
        assert_eq!(view.len(), 1);
        assert_eq!(view.rows()[0].year, 2001);
        assert_eq!(view.rows()[0].fatalities, 5);
    }

    #[test]
    fn fatality_floor_above_every_row_is_empty() {
        let table = example_table();
        let view = apply(&table, &select("X", Bound::new(2001, 2003), 6));
        assert!(view.is_empty());
    }

    #[test]
    fn domain_follows_selected_group() {
        let table = example_table();
        let d = domain(&table, "A");
        assert_eq!(d.countries, vec!["X", "Y"]);
        assert_eq!(d.years, Bound::Range { min: 2001, max: 2003 });
        assert_eq!(d.attack_types, vec!["bombing"]);
        assert_eq!(d.fatalities, Bound::Range { min: 0, max: 5 });
    }

    #[test]
    fn single_value_domains_are_fixed() {
        let table = example_table();
        let d = domain(&table, "B");
        assert_eq!(d.years, Bound::Fixed(1995));
        assert_eq!(d.fatalities, Bound::Fixed(40));
    }

    #[test]
    fn fatality_floor_starts_at_group_minimum() {
        let table = EventTable::new(
            vec![event(2001, "C", "X", "armed assault", 3), event(2002, "C", "X", "armed assault", 9)],
            false,
        );
        let d = domain(&table, "C");
        assert_eq!(d.fatalities.min(), 3);
        assert_eq!(Selections::defaults("C", &d).min_fatalities, 3);
    }

    #[test]
    fn unknown_group_falls_back_to_table_bounds() {
        let table = example_table();
        let d = domain(&table, "nobody");
        assert!(d.countries.is_empty());
        assert!(d.attack_types.is_empty());
        assert_eq!(d.years, Bound::Range { min: 1995, max: 2003 });
        assert_eq!(d.fatalities, Bound::Range { min: 0, max: 40 });
    }

    #[test]
    fn empty_table_has_fixed_zero_bounds() {
        let d = domain(&EventTable::default(), "A");
        assert_eq!(d.years, Bound::Fixed(0));
        assert_eq!(d.fatalities, Bound::Fixed(0));
    }

    #[test]
    fn groups_are_sorted_and_skip_absent() {
        let mut events = example_table().events().to_vec();
        let mut orphan = event(2000, "ignored", "Q", "bombing", 1);
        orphan.group = None;
        events.push(orphan);
        let table = EventTable::new(events, false);
        assert_eq!(groups(&table), vec!["A", "B"]);
    }

    #[test]
    fn keyword_is_case_insensitive_substring() {
        let mut with_summary = event(2001, "A", "X", "bombing", 5);
        with_summary.summary = "Car BOMB near the embassy".into();
        let table = EventTable::new(vec![with_summary, event(2002, "A", "X", "bombing", 1)], false);

        let mut s = select("X", Bound::new(2001, 2002), 0);
        s.keyword = "bomb".into();
        let view = apply(&table, &s);
        assert_eq!(view.len(), 1);
        assert_eq!(view.rows()[0].year, 2001);

        s.keyword = "embassy car".into();
        assert!(apply(&table, &s).is_empty());
    }

    #[test]
    fn empty_summary_never_matches_a_keyword() {
        let table = example_table();
        let mut s = select("X", Bound::new(2001, 2003), 0);
        s.keyword = "x".into();
        assert!(apply(&table, &s).is_empty());
        s.keyword = "   ".into();
        assert!(apply(&table, &s).is_empty());
    }

    #[test]
    fn keyword_whitespace_is_literal() {
        let mut car_bomb = event(2001, "A", "X", "bombing", 5);
        car_bomb.summary = "car bomb".into();
        let table = EventTable::new(vec![car_bomb], false);

        let mut s = select("X", Bound::Fixed(2001), 0);
        s.keyword = "bomb ".into();
        assert!(apply(&table, &s).is_empty());
        s.keyword = "car ".into();
        assert_eq!(apply(&table, &s).len(), 1);
    }

    #[test]
    fn missing_country_selection_matches_nothing() {
        let table = example_table();
        let mut s = select("X", Bound::new(2001, 2003), 0);
        s.country = None;
        assert!(apply(&table, &s).is_empty());
    }

    #[test]
    fn result_is_sound_and_complete() {
        let table = synthetic_table(2_000, 7);
        for group in groups(&table).iter().take(4) {
            let d = domain(&table, group);
            let mut s = Selections::defaults(group, &d);
            s.step_year_from(&d, 2);
            s.step_min_fatalities(&d, 1);
            if let Some(first) = d.attack_types.first() {
                s.toggle_attack_type(first);
            }

            let view = apply(&table, &s);
            let kept: Vec<*const Event> = view.iter().map(|e| e as *const Event).collect();

            for e in table.events() {
                let expected = e.group.as_deref() == Some(group.as_str())
                    && s.country.is_some()
                    && e.country == s.country
                    && s.years.contains(e.year)
                    && e.attack_type.as_ref().is_some_and(|t| s.attack_types.contains(t))
                    && e.fatalities >= s.min_fatalities;
                assert_eq!(kept.contains(&(e as *const Event)), expected, "row {e:?}");
            }
        }
    }

    #[test]
    fn result_preserves_table_order_and_rows() {
        let table = synthetic_table(500, 3);
        let group = groups(&table).remove(0);
        let d = domain(&table, &group);
        let view = apply(&table, &Selections::defaults(&group, &d));
        let positions: Vec<usize> = view
            .iter()
            .map(|e| {
                table
                    .events()
                    .iter()
                    .position(|t| std::ptr::eq(t, e))
                    .expect("row comes from the table")
            })
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn country_and_attack_type_do_not_narrow_domains() {
        let table = synthetic_table(1_000, 11);
        let group = groups(&table).remove(0);
        let before_groups = groups(&table);
        let d = domain(&table, &group);

        let mut s = Selections::defaults(&group, &d);
        s.cycle_country(&d, true);
        s.attack_types.clear();
        let _ = apply(&table, &s);

        assert_eq!(groups(&table), before_groups);
        assert_eq!(domain(&table, &group), d);
    }

    #[test]
    fn year_ends_never_cross() {
        let d = Domain {
            countries: vec![],
            years: Bound::new(2000, 2005),
            attack_types: vec![],
            fatalities: Bound::Fixed(0),
        };
        let mut s = Selections::defaults("A", &d);
        s.step_year_from(&d, 10);
        assert_eq!(s.years, Bound::Fixed(2005));
        s.step_year_to(&d, -3);
        assert_eq!(s.years, Bound::Fixed(2005));
        s.step_year_from(&d, -2);
        assert_eq!(s.years, Bound::Range { min: 2003, max: 2005 });
        s.step_year_from(&d, -100);
        assert_eq!(s.years.min(), 2000);
    }

    #[test]
    fn fixed_domains_ignore_edits() {
        let d = Domain {
            countries: vec!["X".into()],
            years: Bound::Fixed(1999),
            attack_types: vec![],
            fatalities: Bound::Fixed(4),
        };
        let mut s = Selections::defaults("A", &d);
        s.step_year_from(&d, -1);
        s.step_year_to(&d, 1);
        s.step_min_fatalities(&d, 10);
        assert_eq!(s.years, Bound::Fixed(1999));
        assert_eq!(s.min_fatalities, 4);
    }

    #[test]
    fn attack_type_toggles() {
        let d = Domain {
            countries: vec![],
            years: Bound::Fixed(2000),
            attack_types: vec!["a".into(), "b".into()],
            fatalities: Bound::Fixed(0),
        };
        let mut s = Selections::defaults("G", &d);
        s.toggle_attack_type("a");
        assert!(!s.attack_types.contains("a"));
        s.toggle_attack_type("a");
        assert!(s.attack_types.contains("a"));
        s.attack_types.clear();
        s.select_all_attack_types(&d);
        assert_eq!(s.attack_types.len(), 2);
    }

    #[test]
    fn cycle_wraps_both_ways() {
        let values = vec!["a".to_owned(), "b".to_owned(), "c".to_owned()];
        assert_eq!(cycle(&values, Some("c"), true).as_deref(), Some("a"));
        assert_eq!(cycle(&values, Some("a"), false).as_deref(), Some("c"));
        assert_eq!(cycle(&values, None, true).as_deref(), Some("a"));
        assert_eq!(cycle(&[], Some("a"), true), None);
    }
}
