//! One generational segment per cohort.

use super::portfolio::rank_by;
use super::types::GenerationalPick;
use crate::rotation::{PoolType, RecencyView};
use crate::taxonomy::{Cohort, GenerationalSegment, Labelled, Taxonomy};

/// Pick one segment for every cohort, in cohort order.
///
/// A caller suggestion that resolves to a segment of the cohort wins;
/// otherwise the freshest segment by generational-pool penalty is taken,
/// canon order breaking ties.
pub fn pick_generational<V: RecencyView + ?Sized>(
    taxonomy: &Taxonomy,
    view: &V,
    suggestions: &[String],
) -> Vec<GenerationalPick> {
    let suggested: Vec<&GenerationalSegment> = suggestions
        .iter()
        .filter_map(|s| taxonomy.resolve_segment(s))
        .collect();

    Cohort::all()
        .iter()
        .filter_map(|cohort| {
            let preferred = suggested.iter().find(|s| s.cohort == *cohort).copied();
            let chosen = preferred.or_else(|| {
                let segments: Vec<&GenerationalSegment> = taxonomy.segments(*cohort).iter().collect();
                rank_by(segments, |s| view.penalty(PoolType::Generational, &s.name, false))
                    .into_iter()
                    .next()
            })?;
            Some(GenerationalPick {
                cohort: *cohort,
                name: chosen.name.clone(),
            })
        })
        .collect()
}

/// Generational picks that join the highlight set.
///
/// With requested cohorts, their picks in cohort order; otherwise the single
/// freshest pick.
pub fn generational_highlights<V: RecencyView + ?Sized>(
    view: &V,
    picks: &[GenerationalPick],
    cohorts: &[Cohort],
) -> Vec<GenerationalPick> {
    if !cohorts.is_empty() {
        return picks
            .iter()
            .filter(|p| cohorts.contains(&p.cohort))
            .cloned()
            .collect();
    }
    rank_by(picks.to_vec(), |p| view.penalty(PoolType::Generational, &p.name, false))
        .into_iter()
        .take(1)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RotationSettings;
    use crate::rotation::LedgerSnapshot;

    fn taxonomy() -> Taxonomy {
        Taxonomy::bundled().unwrap()
    }

    #[test]
    fn test_one_pick_per_cohort() {
        let tax = taxonomy();
        let view = LedgerSnapshot::empty(&RotationSettings::default());
        let picks = pick_generational(&tax, &view, &[]);
        assert_eq!(picks.len(), 4);
        for (pick, cohort) in picks.iter().zip(Cohort::all()) {
            assert_eq!(pick.cohort, *cohort);
            assert_eq!(pick.name, tax.segments(*cohort)[0].name);
        }
    }

    #[test]
    fn test_suggestion_honoured_for_its_cohort() {
        let tax = taxonomy();
        let view = LedgerSnapshot::empty(&RotationSettings::default());
        let wanted = tax.segments(Cohort::GenX)[3].name.clone();
        let picks = pick_generational(
            &tax,
            &view,
            &[wanted.replace('\u{2013}', " - "), "Not A Segment".to_string()],
        );
        assert_eq!(picks[2].name, wanted);
        assert_eq!(picks[0].name, tax.segments(Cohort::GenZ)[0].name);
    }

    #[test]
    fn test_rotation_moves_pick() {
        let tax = taxonomy();
        let mut view = LedgerSnapshot::empty(&RotationSettings::default());
        let first = pick_generational(&tax, &view, &[]);
        for pick in &first {
            view.record(PoolType::Generational, &pick.name);
        }
        let second = pick_generational(&tax, &view, &[]);
        for (a, b) in first.iter().zip(&second) {
            assert_ne!(a.name, b.name);
        }
    }

    #[test]
    fn test_highlights_default_to_single_freshest() {
        let tax = taxonomy();
        let mut view = LedgerSnapshot::empty(&RotationSettings::default());
        let picks = pick_generational(&tax, &view, &[]);
        assert_eq!(generational_highlights(&view, &picks, &[]), vec![picks[0].clone()]);

        view.record(PoolType::Generational, &picks[0].name);
        assert_eq!(generational_highlights(&view, &picks, &[]), vec![picks[1].clone()]);
    }

    #[test]
    fn test_highlights_for_requested_cohorts() {
        let tax = taxonomy();
        let view = LedgerSnapshot::empty(&RotationSettings::default());
        let picks = pick_generational(&tax, &view, &[]);
        let chosen = generational_highlights(&view, &picks, &[Cohort::Boomer, Cohort::GenZ]);
        assert_eq!(chosen.len(), 2);
        assert_eq!(chosen[0].cohort, Cohort::GenZ);
        assert_eq!(chosen[1].cohort, Cohort::Boomer);
    }
}
