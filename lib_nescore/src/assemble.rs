//! Result assembly: spec §4.4. Grounded on `ne-scoring-gen.cc`'s backward-walk reconstruction in
//! `main()` (the `align_frontiers` accumulation) and `cleanup_unmapped()`.

use std::collections::{HashMap, HashSet};

use generic_search::{AStar, AStarResult, AStarState};

use crate::{
    entity::{EntityId, Side},
    error::{Error, Result},
    search::{Context, SegmentDelta},
};

/// The final outcome of an alignment search: which entities were paired, which were left
/// unmapped, and every reference entity's committed boundary choice.
#[derive(Debug, Clone, Default)]
pub struct AlignmentResult {
    /// `(reference, hypothesis)` pairs, in the order the search formed them.
    pub pairs: Vec<(EntityId, EntityId)>,
    pub unmapped: Vec<(Side, EntityId)>,
    /// Reference entity -> (chosen start alternative, chosen end alternative).
    pub frontiers: HashMap<EntityId, (usize, usize)>,
}

/// Walks the search's surviving target node backward via its predecessor chain, attributing each
/// segment's delta in original order.
pub fn assemble(astar: &AStar<Context<'_>>) -> Result<AlignmentResult> {
    match astar.state() {
        AStarState::Terminated {
            result: AStarResult::FoundTarget { .. },
        } => {}
        other => {
            return Err(Error::AlignmentFailed(format!("{other:?}")));
        }
    }

    let mut deltas: Vec<SegmentDelta> = astar.backtrack().collect();
    deltas.reverse();

    let mut pairs = Vec::new();
    let mut unmapped = Vec::new();
    let mut frontiers = HashMap::new();

    for delta in deltas {
        pairs.extend(delta.added_pairs);
        unmapped.extend(delta.unmapped);
        for (entity, sf, ef) in delta.resolved {
            frontiers.insert(entity, (sf, ef));
        }
    }

    // A reference entity can be recorded unmapped at the first segment it could feasibly pair,
    // then paired once its actual target entity starts later; the pairing always wins.
    let paired: HashSet<(Side, EntityId)> = pairs
        .iter()
        .flat_map(|&(reference, hypothesis)| {
            [(Side::Reference, reference), (Side::Hypothesis, hypothesis)]
        })
        .collect();
    unmapped.retain(|entry| !paired.contains(entry));

    Ok(AlignmentResult {
        pairs,
        unmapped,
        frontiers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        build, config::CostConfig, cost_model, entity::EntityStore, frontier::SegmentGraph,
        interner::Interner, search, tokenize::embedded,
    };

    #[test]
    fn assembles_a_single_matching_pair() {
        let mut interner = Interner::new();
        let tags = vec!["N".to_string()];
        let reference = embedded::tokenize("<N>Alice</N>", "ref", &tags).unwrap();
        let hypothesis = embedded::tokenize("<N>Alice</N>", "hyp", &tags).unwrap();

        let mut store = EntityStore::new();
        store.reference = build::build_embedded_entities(&reference.tags, Side::Reference, &mut interner);
        store.hypothesis =
            build::build_embedded_entities(&hypothesis.tags, Side::Hypothesis, &mut interner);

        let model = cost_model::DefaultCostModel::new(CostConfig::from_toml_str("tags = [\"N\"]\n").unwrap());
        cost_model::materialize_miss_costs(&mut store, &mut interner, &model, "Alice", "Alice").unwrap();
        let segments = SegmentGraph::build(&store);
        cost_model::materialize_substitution_costs(
            &mut store, &segments, &mut interner, &model, "Alice", "Alice",
        )
        .unwrap();

        let mut astar = AStar::new(Context::new(&store, &segments));
        astar.initialise();
        astar.search();

        let result = assemble(&astar).unwrap();
        assert_eq!(result.pairs.len(), 1);
        assert!(result.unmapped.is_empty());
        assert_eq!(result.frontiers.len(), 1);
    }
}
