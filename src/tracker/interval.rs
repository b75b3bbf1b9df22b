//! Tolerance-aware comparisons between segments.
//!
//! `existing` is always the segment already recorded and `candidate` the one
//! being tested against it.

use super::Segment;

/// `a < b`, or `a` and `b` closer than `epsilon`.
pub fn is_less_or_equal(a: f64, b: f64, epsilon: f64) -> bool {
    a < b || (a - b).abs() < epsilon
}

pub fn is_start_within(existing: &Segment, candidate: &Segment, epsilon: f64) -> bool {
    is_less_or_equal(existing.start, candidate.start, epsilon)
        && is_less_or_equal(candidate.start, existing.stop, epsilon)
}

pub fn is_end_within(existing: &Segment, candidate: &Segment, epsilon: f64) -> bool {
    is_less_or_equal(existing.start, candidate.stop, epsilon)
        && is_less_or_equal(candidate.stop, existing.stop, epsilon)
}

pub fn does_overlap(existing: &Segment, candidate: &Segment, epsilon: f64) -> bool {
    is_start_within(existing, candidate, epsilon) || is_end_within(existing, candidate, epsilon)
}

/// `candidate` strictly contains `existing`. Exact comparison, no tolerance.
pub fn does_cover(existing: &Segment, candidate: &Segment) -> bool {
    candidate.start < existing.start && candidate.stop > existing.stop
}

pub fn is_within(existing: &Segment, candidate: &Segment, epsilon: f64) -> bool {
    is_start_within(existing, candidate, epsilon) && is_end_within(existing, candidate, epsilon)
}

/// `time` lies inside `segment`, with `epsilon` slack at both ends.
pub fn contains_time(segment: &Segment, time: f64, epsilon: f64) -> bool {
    is_less_or_equal(segment.start, time, epsilon) && is_less_or_equal(time, segment.stop, epsilon)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 0.2;

    fn seg(start: f64, stop: f64) -> Segment {
        Segment::new(start, stop)
    }

    #[test]
    fn less_or_equal_absorbs_jitter() {
        assert!(is_less_or_equal(1.0, 2.0, EPS));
        assert!(is_less_or_equal(2.0, 2.0, EPS));
        assert!(is_less_or_equal(2.15, 2.0, EPS));
        assert!(!is_less_or_equal(2.25, 2.0, EPS));
        assert!(is_less_or_equal(3.5, 2.0, 2.0));
    }

    #[test]
    fn start_and_end_membership() {
        let existing = seg(2.0, 7.0);
        assert!(is_start_within(&existing, &seg(6.9, 12.0), EPS));
        assert!(is_start_within(&existing, &seg(7.1, 12.0), EPS));
        assert!(!is_start_within(&existing, &seg(7.3, 12.0), EPS));
        assert!(is_end_within(&existing, &seg(0.0, 1.85), EPS));
        assert!(!is_end_within(&existing, &seg(0.0, 1.5), EPS));
    }

    #[test]
    fn overlap_requires_one_boundary_inside() {
        let existing = seg(2.0, 7.0);
        assert!(does_overlap(&existing, &seg(1.0, 3.0), EPS));
        assert!(does_overlap(&existing, &seg(6.0, 9.0), EPS));
        assert!(!does_overlap(&existing, &seg(0.0, 10.0), EPS));
        assert!(!does_overlap(&existing, &seg(8.0, 10.0), EPS));
    }

    #[test]
    fn cover_is_strict() {
        let existing = seg(2.0, 7.0);
        assert!(does_cover(&existing, &seg(0.0, 10.0)));
        assert!(!does_cover(&existing, &seg(2.0, 10.0)));
        assert!(!does_cover(&existing, &seg(1.9, 7.0)));
    }

    #[test]
    fn within_is_tolerant_on_both_ends() {
        let existing = seg(1.2, 5.2);
        assert!(is_within(&existing, &seg(2.1, 4.7), EPS));
        assert!(is_within(&existing, &seg(1.2, 5.2), EPS));
        assert!(is_within(&existing, &seg(1.1, 5.3), EPS));
        assert!(!is_within(&existing, &seg(0.5, 5.2), EPS));
    }

    #[test]
    fn contains_time_uses_epsilon() {
        let segment = seg(0.19, 5.67);
        assert!(contains_time(&segment, 0.0, EPS));
        assert!(contains_time(&segment, 5.8, EPS));
        assert!(!contains_time(&segment, 5.9, EPS));
        assert!(!contains_time(&segment, 8.92, EPS));
    }
}
