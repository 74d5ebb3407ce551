use rand::{seq::SliceRandom, Rng};

use crate::{
    error::{Result, ShredError},
    types::{ArrangeMode, ShredPlan, Slice},
};

/// Order the per-track slice lists into one plan.
///
/// `per_track` is indexed by track. An empty plan is an error: a track
/// without slices makes interlacing produce zero rounds.
pub fn arrange<R: Rng + ?Sized>(
    per_track: Vec<Vec<Slice>>,
    mode: ArrangeMode,
    rng: &mut R,
) -> Result<ShredPlan> {
    let slices = match mode {
        ArrangeMode::Shuffle => shuffle_all(per_track, rng),
        ArrangeMode::Interlace => interlace(per_track, rng),
    };

    if slices.is_empty() {
        return Err(ShredError::EmptyPlan);
    }
    Ok(ShredPlan { slices })
}

fn shuffle_all<R: Rng + ?Sized>(per_track: Vec<Vec<Slice>>, rng: &mut R) -> Vec<Slice> {
    let mut all: Vec<Slice> = per_track.into_iter().flatten().collect();
    all.shuffle(rng);
    all
}

/// Shuffle inside each track, then take one slice per track per round.
/// Rounds stop at the shortest track; longer tracks lose their surplus.
fn interlace<R: Rng + ?Sized>(mut per_track: Vec<Vec<Slice>>, rng: &mut R) -> Vec<Slice> {
    for slices in per_track.iter_mut() {
        slices.shuffle(rng);
    }

    let rounds = per_track.iter().map(Vec::len).min().unwrap_or(0);
    let mut out = Vec::with_capacity(rounds * per_track.len());
    for i in 0..rounds {
        for slices in &per_track {
            out.push(slices[i].clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn track(index: usize, count: usize) -> Vec<Slice> {
        (0..count)
            .map(|i| Slice {
                track: index,
                start: i * 10,
                end: i * 10 + 10,
            })
            .collect()
    }

    #[test]
    fn same_seed_same_plan() {
        let input = vec![track(0, 20), track(1, 20)];
        let a = arrange(input.clone(), ArrangeMode::Shuffle, &mut StdRng::seed_from_u64(9)).unwrap();
        let b = arrange(input, ArrangeMode::Shuffle, &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn interlace_truncates_to_shortest_track() {
        let mut rng = StdRng::seed_from_u64(1);
        let plan = arrange(
            vec![track(0, 7), track(1, 3), track(2, 5)],
            ArrangeMode::Interlace,
            &mut rng,
        )
        .unwrap();
        assert_eq!(plan.len(), 9);
        for (i, slice) in plan.slices.iter().enumerate() {
            assert_eq!(slice.track, i % 3);
        }
    }

    #[test]
    fn interlace_with_empty_track_is_an_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = arrange(vec![track(0, 4), Vec::new()], ArrangeMode::Interlace, &mut rng)
            .unwrap_err();
        assert!(matches!(err, ShredError::EmptyPlan));
    }

    #[test]
    fn shuffle_with_no_slices_is_an_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = arrange(vec![Vec::new()], ArrangeMode::Shuffle, &mut rng).unwrap_err();
        assert!(matches!(err, ShredError::EmptyPlan));
    }
}
