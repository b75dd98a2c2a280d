//! Linear-space, divide-and-conquer sequence alignment (Hirschberg's
//! algorithm), generic over the symbol type so the same implementation
//! backs both the geodesic point aligner and the unit tests that exercise
//! it with plain characters.
//!
//! <https://en.wikipedia.org/wiki/Hirschberg%27s_algorithm>

use super::geo::point_to_track;
use super::point::Point;

/// Align `source` against `target`, maximizing score. `cost_fn(symbol,
/// candidates)` returns, for each candidate, the amount *subtracted* from
/// the running score when `symbol` is matched against it — a negative
/// return rewards a match, a positive one penalizes a mismatch.
///
/// Returns `(aligned_source, aligned_target, score)`: two equal-length
/// vectors with `None` standing in for a gap on that side, and the total
/// alignment score.
pub fn hirschberg<T: Copy>(
    source: &[T],
    target: &[T],
    deletion_cost: f64,
    insertion_cost: f64,
    cost_fn: &impl Fn(T, &[T]) -> Vec<f64>,
) -> (Vec<Option<T>>, Vec<Option<T>>, f64) {
    let source_len = source.len();
    let target_len = target.len();

    if source_len == 0 && target_len == 0 {
        return (vec![], vec![], 0.0);
    }

    if target_len == 0 {
        return (
            source.iter().map(|&s| Some(s)).collect(),
            vec![None; source_len],
            source_len as f64 * deletion_cost,
        );
    }

    if source_len == 0 {
        return (
            vec![None; target_len],
            target.iter().map(|&t| Some(t)).collect(),
            target_len as f64 * insertion_cost,
        );
    }

    if target_len == 1 {
        let (index, cost) = linear_search(target[0], source, cost_fn);
        let mut aligned_target = vec![None; source_len];
        aligned_target[index] = Some(target[0]);
        return (
            source.iter().map(|&s| Some(s)).collect(),
            aligned_target,
            deletion_cost * (source_len as f64 - 1.0) - cost,
        );
    }

    if source_len == 1 {
        let (index, cost) = linear_search(source[0], target, cost_fn);
        let mut aligned_source = vec![None; target_len];
        aligned_source[index] = Some(source[0]);
        return (
            aligned_source,
            target.iter().map(|&t| Some(t)).collect(),
            insertion_cost * (target_len as f64 - 1.0) - cost,
        );
    }

    let cut_index = source_len / 2;

    let upper_score = line_score(&source[..cut_index], target, deletion_cost, insertion_cost, cost_fn);

    let rev_source: Vec<T> = source[cut_index..].iter().rev().copied().collect();
    let rev_target: Vec<T> = target.iter().rev().copied().collect();
    let mut lower_score = line_score(&rev_source, &rev_target, deletion_cost, insertion_cost, cost_fn);
    lower_score.reverse();

    // `Iterator::max_by` keeps the *last* tied element; argmax semantics
    // (and dense, gap-free stretches tie often with insertion_cost = 0)
    // require the *first*. Fold with a strict `>` instead.
    let mut max_index = 0;
    let mut max_value = upper_score[0] + lower_score[0];
    for a in 1..target_len + 1 {
        let value = upper_score[a] + lower_score[a];
        if value > max_value {
            max_value = value;
            max_index = a;
        }
    }

    let (left_source, left_target, left_cost) = hirschberg(
        &source[..cut_index],
        &target[..max_index],
        deletion_cost,
        insertion_cost,
        cost_fn,
    );
    let (right_source, right_target, right_cost) = hirschberg(
        &source[cut_index..],
        &target[max_index..],
        deletion_cost,
        insertion_cost,
        cost_fn,
    );

    let mut aligned_source = left_source;
    aligned_source.extend(right_source);
    let mut aligned_target = left_target;
    aligned_target.extend(right_target);

    (aligned_source, aligned_target, left_cost + right_cost)
}

/// The Needleman-Wunsch score line for one half of the split, computed in
/// `O(|source| * |target|)` time but only `O(|target|)` space: `row1`/`row2`
/// alternate as "previous row" / "row being built" and are swapped in place
/// each source step rather than reallocated.
fn line_score<T: Copy>(
    source: &[T],
    target: &[T],
    deletion_cost: f64,
    insertion_cost: f64,
    cost_fn: &impl Fn(T, &[T]) -> Vec<f64>,
) -> Vec<f64> {
    let source_len = source.len();
    let target_len = target.len();

    // Both branches below are dead in practice: `hirschberg` only ever calls
    // this with a full, non-empty target and a non-empty half of `source`
    // (its own base cases handle length 0 and 1 first). Kept for a
    // self-contained, directly testable helper.
    if source_len == 0 {
        let mut acc = 0.0;
        let mut row = vec![0.0];
        row.extend((0..target_len).map(|_| {
            acc += insertion_cost;
            acc
        }));
        return row;
    }

    if target_len == 0 {
        let mut acc = 0.0;
        let mut row = vec![0.0];
        row.extend((0..source_len).map(|_| {
            acc += deletion_cost;
            acc
        }));
        return row;
    }

    let mut full_deletion_column = Vec::with_capacity(source_len + 1);
    full_deletion_column.push(0.0);
    for i in 0..source_len {
        full_deletion_column.push(full_deletion_column[i] + deletion_cost);
    }

    let mut row1 = Vec::with_capacity(target_len);
    let mut acc = 0.0;
    for _ in 0..target_len {
        acc += insertion_cost;
        row1.push(acc);
    }
    let mut row2 = vec![0.0_f64; target_len];

    for (i, &s) in source.iter().enumerate() {
        let costs = cost_fn(s, target);

        for j in 0..target_len {
            let replacement_score = if j == 0 {
                full_deletion_column[i] - costs[0]
            } else {
                row1[j - 1] - costs[j]
            };
            let deletion_score = row1[j] + deletion_cost;
            let replacement_deletion_max = replacement_score.max(deletion_score);

            let insertion_score = insertion_cost
                + if j == 0 {
                    full_deletion_column[i + 1]
                } else {
                    row2[j - 1]
                };

            row2[j] = replacement_deletion_max.max(insertion_score);
        }

        std::mem::swap(&mut row1, &mut row2);
    }

    let mut result = Vec::with_capacity(target_len + 1);
    result.push(full_deletion_column[source_len]);
    result.extend(row1);
    result
}

/// Best single-index match for `subject` within `candidates`, by minimal
/// cost. Returns the winning index and the cost there.
fn linear_search<T: Copy>(
    subject: T,
    candidates: &[T],
    cost_fn: &impl Fn(T, &[T]) -> Vec<f64>,
) -> (usize, f64) {
    let costs = cost_fn(subject, candidates);
    let index = costs
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
        .map(|(i, _)| i)
        .unwrap_or(0);
    (index, costs[index])
}

/// The point-specific entry point: aligns `source` against `target` using
/// the geodesic kernel as the cost function, with the engine's all-`NaN`
/// sentinel standing in for a gap on output (see [`Point::MISSING`]) —
/// the one missing-point convention this aligner exposes to callers.
pub fn align_points(
    source: &[Point],
    target: &[Point],
    deletion_cost: f64,
    insertion_cost: f64,
) -> (Vec<Point>, Vec<Point>, f64) {
    let cost_fn = |p: Point, track: &[Point]| point_to_track(p, track, 0.001);
    let (aligned_source, aligned_target, score) =
        hirschberg(source, target, deletion_cost, insertion_cost, &cost_fn);

    let to_point = |opt: Option<Point>| opt.unwrap_or(Point::MISSING);
    (
        aligned_source.into_iter().map(to_point).collect(),
        aligned_target.into_iter().map(to_point).collect(),
        score,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn char_cost(a: char, candidates: &[char]) -> Vec<f64> {
        candidates
            .iter()
            .map(|&b| if a == b { -2.0 } else { 1.0 })
            .collect()
    }

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn render(aligned: &[Option<char>]) -> String {
        aligned.iter().map(|c| c.unwrap_or('\u{2205}')).collect()
    }

    #[test]
    fn reference_dna_like_alignment() {
        let source = chars("AGTACGCA");
        let target = chars("TATGC");
        let (aligned_source, aligned_target, score) =
            hirschberg(&source, &target, -2.0, -2.0, &char_cost);

        assert_eq!(render(&aligned_source), "AGTACGCA");
        assert_eq!(render(&aligned_target), "∅∅TATGC∅");
        assert_eq!(score, 1.0);
    }

    #[test]
    fn both_empty_yields_zero_score() {
        let (s, t, score): (Vec<Option<char>>, Vec<Option<char>>, f64) =
            hirschberg(&[], &[], -2.0, -2.0, &char_cost);
        assert!(s.is_empty());
        assert!(t.is_empty());
        assert_eq!(score, 0.0);
    }

    #[test]
    fn identity_alignment_scores_zero_with_zero_insertion_and_negative_deletion() {
        // Uses the geodesic cost (plain distance, zero for a perfect match)
        // rather than the char reward scheme above — the zero-score identity
        // only holds when a match costs exactly zero.
        let route = vec![
            Point::new(55.0, 37.0, 0.0, 0.0),
            Point::new(55.1, 37.0, 0.0, 100.0),
            Point::new(55.2, 37.1, 0.0, 250.0),
            Point::new(55.3, 37.2, 0.0, 400.0),
        ];
        let (aligned_source, aligned_target, score) = align_points(&route, &route, -3000.0, 0.0);
        assert_eq!(aligned_source, route);
        assert_eq!(aligned_target, route);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn symmetric_under_swap_with_equal_gap_costs() {
        let a = chars("AGTACGCA");
        let b = chars("TATGC");
        let (_, _, score_ab) = hirschberg(&a, &b, -2.0, -2.0, &char_cost);
        let (_, _, score_ba) = hirschberg(&b, &a, -2.0, -2.0, &char_cost);
        assert_eq!(score_ab, score_ba);
    }

    #[test]
    fn target_longer_than_source_uses_source_len_one_base_case() {
        let source = chars("A");
        let target = chars("AAAA");
        let (aligned_source, aligned_target, _) =
            hirschberg(&source, &target, -1.0, -1.0, &char_cost);
        assert_eq!(aligned_target.len(), target.len());
        assert_eq!(aligned_source.len(), target.len());
        assert_eq!(aligned_source.iter().filter(|c| c.is_some()).count(), 1);
    }
}
