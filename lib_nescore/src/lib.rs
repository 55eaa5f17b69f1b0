//! Alignment and scoring of named-entity annotations against a reference. Grounded end-to-end on
//! `ne-scoring-gen.cc`'s `main()`: tokenize both sides, reposition the hypothesis onto the
//! reference's coordinate space, build/refine entities, materialize the cost model, search for
//! the minimum-cost alignment, then score it.

pub mod assemble;
pub mod build;
pub mod config;
pub mod cost;
pub mod cost_model;
pub mod entity;
pub mod error;
pub mod frontier;
pub mod iag;
pub mod interner;
pub mod offset_align;
pub mod refine;
pub mod report;
pub mod score;
pub mod search;
pub mod tokenize;

use generic_search::AStar;

use crate::{
    assemble::AlignmentResult,
    config::CostConfig,
    cost_model::{CostModel, DefaultCostModel},
    entity::{EntityStore, Side},
    error::Result,
    frontier::SegmentGraph,
    interner::Interner,
    score::{Scores, calc_scores},
};

/// The two tag notations the reference file can use. The hypothesis file is always read in the
/// embedded format, regardless of this setting: the original only ever offers `-a` to switch the
/// *reference's* notation (`opt_ref_aref`), and always loads the hypothesis via
/// `annotated_file_load`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Embedded,
    Aref,
}

/// Everything a report needs: the entity store, the assembled alignment, its scores, and the
/// single text buffer (in the reference's coordinate space) both sides' offsets index into.
pub struct RunOutcome {
    pub store: EntityStore,
    pub interner: Interner,
    pub result: AlignmentResult,
    pub scores: Scores,
    pub text: String,
}

/// Runs the full pipeline: tokenize, reposition, build, refine, materialize costs, search,
/// assemble, score.
pub fn run(
    config: CostConfig,
    reference_input: &str,
    hypothesis_input: &str,
    reference_file: &str,
    hypothesis_file: &str,
    format: InputFormat,
) -> Result<RunOutcome> {
    let mut interner = Interner::new();
    let mut store = EntityStore::new();

    let (reference_entities, reference_text) = match format {
        InputFormat::Embedded => {
            let tokenized = tokenize::embedded::tokenize(reference_input, reference_file, &config.tags)?;
            let entities = build::build_embedded_entities(&tokenized.tags, Side::Reference, &mut interner);
            (entities, tokenized.text)
        }
        InputFormat::Aref => {
            let tokenized = tokenize::aref::tokenize(reference_input, reference_file)?;
            let entities =
                build::build_aref_entities(&tokenized.markers, Side::Reference, &mut interner, reference_file)?;
            (entities, tokenized.text)
        }
    };
    store.reference = reference_entities;

    // The hypothesis is always read in the embedded notation, independent of the reference's
    // format: repositioning onto the reference's coordinate space happens below regardless.
    let hypothesis = tokenize::embedded::tokenize(hypothesis_input, hypothesis_file, &config.tags)?;
    let offsets = offset_align::align_and_reposition(&reference_text, &hypothesis.text, hypothesis_file)?;
    store.hypothesis = build::build_embedded_entities(&hypothesis.tags, Side::Hypothesis, &mut interner);
    reposition_hypothesis(&mut store, &offsets);

    refine::refine_entities(&mut store, &reference_text)?;
    run_materialized(config, store, interner, reference_text)
}

/// Rebases every hypothesis entity's boundary alternatives from the hypothesis text's coordinate
/// space onto the reference text's, via the map `align_and_reposition` built.
fn reposition_hypothesis(store: &mut EntityStore, offsets: &offset_align::OffsetMap) {
    for entity in &mut store.hypothesis {
        for start in &mut entity.starts {
            *start = offsets.reposition(*start);
        }
        for end in &mut entity.ends {
            *end = offsets.reposition(*end);
        }
    }
}

fn run_materialized(
    config: CostConfig,
    mut store: EntityStore,
    mut interner: Interner,
    text: String,
) -> Result<RunOutcome> {
    let model = DefaultCostModel::new(config);

    cost_model::materialize_miss_costs(&mut store, &mut interner, &model, &text, &text)?;
    let segments = SegmentGraph::build(&store);
    cost_model::materialize_substitution_costs(&mut store, &segments, &mut interner, &model, &text, &text)?;

    let mut astar = AStar::new(search::Context::new(&store, &segments));
    astar.initialise();
    let search_result = astar.search();
    let total_cost = match search_result {
        generic_search::AStarResult::FoundTarget { cost, .. } => cost,
        other => {
            return Err(error::Error::AlignmentFailed(format!("{other:?}")));
        }
    };

    let result = assemble::assemble(&astar)?;
    let scores = calc_scores(&store, &result, total_cost);

    Ok(RunOutcome {
        store,
        interner,
        result,
        scores,
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_a_perfectly_matching_single_entity() {
        let config = CostConfig::from_toml_str("tags = [\"N\"]\n").unwrap();
        let outcome = run(
            config,
            "<N>Alice</N> met Bob.",
            "<N>Alice</N> met Bob.",
            "ref",
            "hyp",
            InputFormat::Embedded,
        )
        .unwrap();

        assert_eq!(outcome.result.pairs.len(), 1);
        assert!(outcome.result.unmapped.is_empty());
        assert_eq!(outcome.scores.count_correct, 1);
        assert_eq!(outcome.scores.slot_error_rate(), 0.0);
    }

    #[test]
    fn scores_a_missed_entity_as_a_delete() {
        let config = CostConfig::from_toml_str("tags = [\"N\"]\n").unwrap();
        let outcome = run(
            config,
            "<N>Alice</N> met Bob.",
            "Alice met Bob.",
            "ref",
            "hyp",
            InputFormat::Embedded,
        )
        .unwrap();

        assert!(outcome.result.pairs.is_empty());
        assert_eq!(outcome.result.unmapped.len(), 1);
        assert_eq!(outcome.scores.count_delete, 1);
    }

    #[test]
    fn tolerates_whitespace_differences_between_reference_and_hypothesis() {
        let config = CostConfig::from_toml_str("tags = [\"N\"]\n").unwrap();
        let outcome = run(
            config,
            "<N>Alice</N>  met   Bob.",
            "<N>Alice</N> met Bob.",
            "ref",
            "hyp",
            InputFormat::Embedded,
        )
        .unwrap();

        assert_eq!(outcome.result.pairs.len(), 1);
        assert_eq!(outcome.scores.count_correct, 1);
    }

    #[test]
    fn scores_an_aref_reference_against_an_embedded_hypothesis() {
        let config = CostConfig::from_toml_str("tags = [\"N\"]\n").unwrap();
        let reference = concat!(
            r#"<annotation id=1 type=N ftype=s depth=0 parent=-1/>"#,
            "Alice",
            r#"<annotation id=1 type=N ftype=e depth=0 parent=-1/>"#,
            " met Bob.",
        );
        let outcome = run(
            config,
            reference,
            "<N>Alice</N> met Bob.",
            "ref",
            "hyp",
            InputFormat::Aref,
        )
        .unwrap();

        assert_eq!(outcome.result.pairs.len(), 1);
        assert_eq!(outcome.scores.count_correct, 1);
    }
}
