//! IAG-style inter-annotator-agreement statistics. Grounded on `ne-scoring-gen.cc`'s
//! `show_iag()`; the formulas are transcribed exactly as derived there, not re-derived from the
//! abstract spec prose.

use crate::score::Scores;

#[derive(Debug, Clone, Copy)]
pub struct IagReport {
    pub total_entities: f64,
    pub correct: usize,
    pub added_void_corrects: f64,
    pub tag_types: usize,
    pub s: f64,
    pub pi: f64,
    pub kappa: f64,
    pub f_measure: f64,
}

/// `open`: in open mode there is no notion of confusion between reference and hypothesis tags
/// (`-o`). `expected_count`: the total population size the two annotators are assumed to be
/// drawn from (`-i`), used to estimate mutually-agreed negatives (`ovc`).
pub fn compute_iag(scores: &Scores, tag_count: usize, open: bool, expected_count: f64) -> IagReport {
    let count_correct = scores.count_correct as f64;
    let count_subst = scores.count_subst as f64;
    let ref_entities = scores.ref_entities as f64;
    let hyp_entities = scores.hyp_entities as f64;

    let (void_hyp, void_ref, rt) = if open {
        let void_hyp = ref_entities - count_correct;
        let void_ref = hyp_entities - count_correct;
        (void_hyp, void_ref, count_correct + void_hyp + void_ref)
    } else {
        let void_hyp = ref_entities - count_correct - count_subst;
        let void_ref = hyp_entities - count_correct - count_subst;
        (
            void_hyp,
            void_ref,
            count_correct + count_subst + void_hyp + void_ref,
        )
    };

    let ovc = (expected_count - rt).max(0.0);

    let a0 = if ovc != 0.0 {
        (1.0 + count_correct / ovc) / (1.0 + rt / ovc)
    } else {
        count_correct / rt
    };
    let ae_s = 1.0 / (tag_count as f64 + 1.0);
    let r_s = (a0 - ae_s) / (1.0 - ae_s);

    let mut sigma_pi = (void_hyp + void_ref) * (void_hyp + void_ref);
    let mut sigma_kappa = void_hyp * void_ref;

    for counts in scores.tag_counts.values() {
        let cpi = (counts.hyp_count + counts.ref_count) as f64;
        sigma_pi += cpi * cpi;
        sigma_kappa += counts.hyp_count as f64 * counts.ref_count as f64;
    }

    let (r_pi, r_kappa) = if ovc != 0.0 {
        let r_pi = (8.0 * count_correct - 4.0 * (rt - count_correct)
            + (4.0 * count_correct * rt - sigma_pi) / ovc)
            / (8.0 * count_correct + (4.0 * rt * rt - sigma_pi) / ovc);
        let r_kappa = (2.0 * count_correct + (count_correct * rt - sigma_kappa) / ovc)
            / (count_correct + rt + (rt * rt - sigma_kappa) / ovc);
        (r_pi, r_kappa)
    } else {
        let r_pi = (4.0 * count_correct * rt - sigma_pi) / (4.0 * rt * rt - sigma_pi);
        let r_kappa = (count_correct * rt - sigma_kappa) / (rt * rt - sigma_kappa);
        (r_pi, r_kappa)
    };

    let r_fm = 2.0 * count_correct / (ref_entities + hyp_entities);

    IagReport {
        total_entities: rt,
        correct: scores.count_correct,
        added_void_corrects: ovc,
        tag_types: tag_count,
        s: r_s,
        pi: r_pi,
        kappa: r_kappa,
        f_measure: r_fm,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_agreement_yields_s_of_one() {
        let scores = Scores {
            count_correct: 10,
            ref_entities: 10,
            hyp_entities: 10,
            ..Default::default()
        };
        let report = compute_iag(&scores, 1, false, 0.0);
        assert!((report.s - 1.0).abs() < 1e-9);
        assert!((report.f_measure - 1.0).abs() < 1e-9);
    }
}
