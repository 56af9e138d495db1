/// Points awarded per matching factor.
///
/// `location`, `availability`, `day` are awarded at most once. The remaining
/// factors are multiplied by the number of overlapping items.
pub const DEFAULT_WEIGHTS: MatchWeights = MatchWeights {
    location: 10.0,
    availability: 4.0,
    day: 3.0,
    per_skill: 10.0,
    per_interest: 7.0,
    per_past_event: 4.0,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchWeights {
    pub location: f64,
    pub availability: f64,
    pub day: f64,
    pub per_skill: f64,
    pub per_interest: f64,
    pub per_past_event: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        DEFAULT_WEIGHTS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_overlap_outweighs_schedule_fit() {
        let w = DEFAULT_WEIGHTS;
        assert!(w.per_skill > w.availability + w.day);
        assert!(w.per_interest > w.availability);
        assert_eq!(w.location, w.per_skill);
    }
}
