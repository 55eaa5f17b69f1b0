//! Segment-by-segment alignment search. Spec §4.3. Grounded on `ne-scoring-gen.cc`'s
//! `align_node`/`nodes_are_equivalent()`/`align()`, driven through `generic_search`'s
//! `AStarNode`/`AStarContext` the way
//! `lib_tsalign/src/a_star_aligner/gap_affine_edit_distance.rs` drives it.
//!
//! `a_star_lower_bound()` always returns zero: every edge cost is non-negative and the segment
//! index strictly increases along any path, so plain uniform-cost search already finds the
//! optimum (see SPEC_FULL.md §4.3/§9).

use std::{
    cmp::Ordering,
    fmt::{self, Display},
};

use generic_search::{AStarContext, AStarNode, reset::Reset};
use num_traits::Zero;

use crate::{
    cost::Cost,
    entity::{EntityId, EntityStore, Side},
    frontier::{Segment, SegmentGraph},
};

/// A reference entity's committed boundary choice: indices into its own `starts`/`ends`.
pub type FrontierChoice = (EntityId, usize, usize);

/// The equivalence key spec §4.3 merges states on: two states reaching the same segment boundary
/// with an identical key have an identical future, so only the cheaper one needs to survive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EquivKey {
    /// Entities paired and still open, as a set (sorted for hashing).
    pub active_set: Vec<(Side, EntityId)>,
    /// `(reference, hypothesis)` pairs still active, in the order they were formed.
    pub current_pairs: Vec<(EntityId, EntityId)>,
    /// Boundary choices of reference entities still partially overlapping the remainder
    /// (`ends.back() > end(Sᵢ)`), sorted by entity for hashing.
    pub frontiers: Vec<FrontierChoice>,
}

impl EquivKey {
    fn empty() -> Self {
        Self {
            active_set: Vec::new(),
            current_pairs: Vec::new(),
            frontiers: Vec::new(),
        }
    }

    fn frontier_of(&self, id: EntityId) -> Option<(usize, usize)> {
        self.frontiers
            .iter()
            .find(|(entity, _, _)| *entity == id)
            .map(|&(_, sf, ef)| (sf, ef))
    }

    fn canonicalize(&mut self) {
        self.active_set.sort_unstable();
        self.frontiers.sort_unstable_by_key(|&(id, _, _)| id);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    pub segment_index: usize,
    pub key: EquivKey,
}

/// What one segment's extension committed, recorded on the edge for `assemble.rs`'s backward
/// walk to reconstruct the full mapping.
#[derive(Debug, Clone, Default)]
pub struct SegmentDelta {
    pub added_pairs: Vec<(EntityId, EntityId)>,
    pub unmapped: Vec<(Side, EntityId)>,
    pub resolved: Vec<FrontierChoice>,
}

#[derive(Debug, Clone)]
pub struct Node {
    identifier: Identifier,
    cost: Cost,
    predecessor: Option<Identifier>,
    predecessor_edge: Option<SegmentDelta>,
}

impl Node {
    fn root() -> Self {
        Self {
            identifier: Identifier {
                segment_index: 0,
                key: EquivKey::empty(),
            },
            cost: Cost::zero(),
            predecessor: None,
            predecessor_edge: None,
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost
    }
}

impl Eq for Node {}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost.cmp(&other.cost)
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "segment {} cost {} (active {}, pairs {})",
            self.identifier.segment_index,
            self.cost,
            self.identifier.key.active_set.len(),
            self.identifier.key.current_pairs.len()
        )
    }
}

impl AStarNode for Node {
    type Identifier = Identifier;
    type EdgeType = SegmentDelta;
    type Cost = Cost;

    fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    fn cost(&self) -> Cost {
        self.cost
    }

    fn a_star_lower_bound(&self) -> Cost {
        Cost::zero()
    }

    fn secondary_maximisable_score(&self) -> usize {
        0
    }

    fn predecessor(&self) -> Option<&Identifier> {
        self.predecessor.as_ref()
    }

    fn predecessor_edge_type(&self) -> Option<SegmentDelta> {
        self.predecessor_edge.clone()
    }
}

/// Drives the search over an already cost-materialized [`EntityStore`]/[`SegmentGraph`].
pub struct Context<'a> {
    store: &'a EntityStore,
    segments: &'a SegmentGraph,
}

impl<'a> Context<'a> {
    pub fn new(store: &'a EntityStore, segments: &'a SegmentGraph) -> Self {
        Self { store, segments }
    }
}

impl Reset for Context<'_> {
    fn reset(&mut self) {}
}

impl AStarContext for Context<'_> {
    type Node = Node;

    fn create_root(&self) -> Node {
        Node::root()
    }

    fn generate_successors(&mut self, node: &Node, output: &mut impl Extend<Node>) {
        let segment_index = node.identifier.segment_index;
        let Some(segment) = self.segments.segments.get(segment_index) else {
            return;
        };

        let children = extend_segment(self.store, segment, node);
        output.extend(children);
    }

    fn is_target(&self, node: &Node) -> bool {
        node.identifier.segment_index == self.segments.segments.len()
    }

    fn cost_limit(&self) -> Option<Cost> {
        None
    }
}

fn resolve_span(
    store: &EntityStore,
    key: &EquivKey,
    in_progress: &[(EntityId, usize, usize)],
    id: EntityId,
) -> Option<(usize, usize)> {
    if let Some(&(_, sf, ef)) = in_progress.iter().find(|(entity, _, _)| *entity == id) {
        let entity = store.get(Side::Reference, id);
        return Some((entity.starts[sf], entity.ends[ef]));
    }
    key.frontier_of(id).map(|(sf, ef)| {
        let entity = store.get(Side::Reference, id);
        (entity.starts[sf], entity.ends[ef])
    })
}

/// Step 1: enumerate every accepted boundary choice for the entities starting in `segment`,
/// depth-first over slot order. Each element of the result is the set of reference entities
/// instantiated by that choice (entities left as "skip" are simply absent).
fn enumerate_boundaries(
    store: &EntityStore,
    segment: &Segment,
    key: &EquivKey,
) -> Vec<Vec<(EntityId, usize, usize)>> {
    let slots: Vec<(EntityId, usize, bool)> = segment
        .starting_ref_entities
        .iter()
        .filter(|sre| key.frontier_of(sre.entity).is_none())
        .map(|sre| {
            let entity = store.get(Side::Reference, sre.entity);
            let is_last = sre.start_alt == entity.starts.len() - 1;
            (sre.entity, sre.start_alt, is_last)
        })
        .collect();

    let mut results = Vec::new();
    let mut current = Vec::new();
    enumerate_boundaries_rec(store, &slots, key, 0, &mut current, &mut results);
    results
}

fn enumerate_boundaries_rec(
    store: &EntityStore,
    slots: &[(EntityId, usize, bool)],
    key: &EquivKey,
    slot_idx: usize,
    current: &mut Vec<(EntityId, usize, usize)>,
    results: &mut Vec<Vec<(EntityId, usize, usize)>>,
) {
    if slot_idx == slots.len() {
        results.push(current.clone());
        return;
    }

    let (entity_id, start_alt, is_last) = slots[slot_idx];
    let entity = store.get(Side::Reference, entity_id);
    let start = entity.starts[start_alt];

    if !is_last {
        enumerate_boundaries_rec(store, slots, key, slot_idx + 1, current, results);
    }

    for ef in 0..entity.ends.len() {
        let end = entity.ends[ef];
        if start >= end {
            continue;
        }

        if let Some(parent_id) = entity.parent {
            if let Some((ps, pe)) = resolve_span(store, key, current, parent_id) {
                if start < ps || end > pe {
                    continue;
                }
            }
        }

        if let Some(left_id) = entity.left_constraint {
            if let Some((_, left_end)) = resolve_span(store, key, current, left_id) {
                if left_end > start {
                    continue;
                }
            }
        }

        current.push((entity_id, start_alt, ef));
        enumerate_boundaries_rec(store, slots, key, slot_idx + 1, current, results);
        current.pop();
    }
}

struct PairingCandidate {
    entity: EntityId,
    side: Side,
    targets: Vec<EntityId>,
}

fn pairing_candidates(
    store: &EntityStore,
    segment: &Segment,
    key: &EquivKey,
    new_refs: &[(EntityId, usize, usize)],
) -> Vec<PairingCandidate> {
    let mut candidates = Vec::new();

    for &(ref_id, sf, ef) in new_refs {
        let reference = store.get(Side::Reference, ref_id);
        let (start, end) = (reference.starts[sf], reference.ends[ef]);
        let targets: Vec<EntityId> = segment
            .hypothesis_entities
            .iter()
            .copied()
            .filter(|&hyp_id| {
                let hyp = store.get(Side::Hypothesis, hyp_id);
                hyp.starts[0] < end && start < hyp.ends[0]
            })
            .collect();
        candidates.push(PairingCandidate {
            entity: ref_id,
            side: Side::Reference,
            targets,
        });
    }

    for &hyp_id in &segment.starting_hyp_entities {
        let targets: Vec<EntityId> = key
            .frontiers
            .iter()
            .filter(|&&(ref_id, _, ef)| {
                let reference = store.get(Side::Reference, ref_id);
                reference.ends[ef] > segment.start
            })
            .map(|&(ref_id, _, _)| ref_id)
            .collect();
        candidates.push(PairingCandidate {
            entity: hyp_id,
            side: Side::Hypothesis,
            targets,
        });
    }

    candidates
}

struct PairingOutcome {
    new_pairs: Vec<(EntityId, EntityId)>,
    unmapped: Vec<(Side, EntityId)>,
}

/// Step 2: mixed-radix Cartesian product over "leave unmapped" (option 0) vs. each candidate
/// target, rejecting combinations that reuse an active entity or cross an existing pair.
fn enumerate_pairings(
    store: &EntityStore,
    key: &EquivKey,
    candidates: &[PairingCandidate],
) -> Vec<PairingOutcome> {
    let mut results = Vec::new();
    let mut local_active: Vec<(Side, EntityId)> = key.active_set.clone();
    let mut local_pairs: Vec<(EntityId, EntityId)> = key.current_pairs.clone();
    let mut new_pairs = Vec::new();
    let mut unmapped = Vec::new();

    enumerate_pairings_rec(
        store,
        candidates,
        0,
        &mut local_active,
        &mut local_pairs,
        &mut new_pairs,
        &mut unmapped,
        &mut results,
    );
    results
}

#[allow(clippy::too_many_arguments)]
fn enumerate_pairings_rec(
    store: &EntityStore,
    candidates: &[PairingCandidate],
    idx: usize,
    local_active: &mut Vec<(Side, EntityId)>,
    local_pairs: &mut Vec<(EntityId, EntityId)>,
    new_pairs: &mut Vec<(EntityId, EntityId)>,
    unmapped: &mut Vec<(Side, EntityId)>,
    results: &mut Vec<PairingOutcome>,
) {
    if idx == candidates.len() {
        results.push(PairingOutcome {
            new_pairs: new_pairs.clone(),
            unmapped: unmapped.clone(),
        });
        return;
    }

    let candidate = &candidates[idx];

    if !local_active.contains(&(candidate.side, candidate.entity)) {
        // Option 0: leave unmapped.
        unmapped.push((candidate.side, candidate.entity));
        enumerate_pairings_rec(
            store, candidates, idx + 1, local_active, local_pairs, new_pairs, unmapped, results,
        );
        unmapped.pop();
    }

    for &target in &candidate.targets {
        let (ref_id, hyp_id) = match candidate.side {
            Side::Reference => (candidate.entity, target),
            Side::Hypothesis => (target, candidate.entity),
        };

        if local_active.contains(&(Side::Reference, ref_id))
            || local_active.contains(&(Side::Hypothesis, hyp_id))
        {
            continue;
        }

        let reference = store.get(Side::Reference, ref_id);
        let hypothesis = store.get(Side::Hypothesis, hyp_id);
        let crosses = local_pairs.iter().any(|&(other_ref, other_hyp)| {
            let other_reference = store.get(Side::Reference, other_ref);
            let other_hypothesis = store.get(Side::Hypothesis, other_hyp);
            (hypothesis.depth < other_hypothesis.depth && reference.depth > other_reference.depth)
                || (hypothesis.depth > other_hypothesis.depth
                    && reference.depth < other_reference.depth)
        });
        if crosses {
            continue;
        }

        local_active.push((Side::Reference, ref_id));
        local_active.push((Side::Hypothesis, hyp_id));
        local_pairs.push((ref_id, hyp_id));
        new_pairs.push((ref_id, hyp_id));

        enumerate_pairings_rec(
            store, candidates, idx + 1, local_active, local_pairs, new_pairs, unmapped, results,
        );

        new_pairs.pop();
        local_pairs.pop();
        local_active.pop();
        local_active.pop();
    }
}

fn extend_segment(store: &EntityStore, segment: &Segment, node: &Node) -> Vec<Node> {
    let key = &node.identifier.key;
    let mut children = Vec::new();

    for new_refs in enumerate_boundaries(store, segment, key) {
        let candidates = pairing_candidates(store, segment, key, &new_refs);

        for outcome in enumerate_pairings(store, key, &candidates) {
            let mut child_key = key.clone();
            let mut cost = node.cost;

            for &(ref_id, sf, ef) in &new_refs {
                child_key.frontiers.push((ref_id, sf, ef));
            }

            for &(ref_id, hyp_id) in &outcome.new_pairs {
                let reference = store.get(Side::Reference, ref_id);
                let (sf, ef) = child_key.frontier_of(ref_id).expect("just instantiated");
                let cell = reference.subst_costs[&hyp_id][sf][ef]
                    .as_ref()
                    .expect("pairing enumeration only proposes overlapping boundaries");
                cost += cell.cost;
                child_key.active_set.push((Side::Reference, ref_id));
                child_key.active_set.push((Side::Hypothesis, hyp_id));
                child_key.current_pairs.push((ref_id, hyp_id));
            }

            for &(side, entity_id) in &outcome.unmapped {
                let entity = store.get(side, entity_id);
                let (sf, ef) = match side {
                    Side::Reference => child_key.frontier_of(entity_id).expect("just instantiated"),
                    Side::Hypothesis => (0, 0),
                };
                let cell = entity.miss_costs[sf][ef]
                    .as_ref()
                    .expect("miss costs are materialized for every positive-span boundary");
                cost += cell.cost;
            }

            // Segment exit: close entities whose last alternative ends here.
            let segment_end = segment.end;
            child_key.frontiers.retain(|&(ref_id, _, _)| {
                store.get(Side::Reference, ref_id).ends.last().copied().unwrap() > segment_end
            });
            let closed: Vec<EntityId> = key
                .frontiers
                .iter()
                .chain(new_refs.iter())
                .map(|&(id, _, _)| id)
                .filter(|&id| store.get(Side::Reference, id).ends.last().copied().unwrap() <= segment_end)
                .collect();
            let is_closed = |side: Side, id: EntityId| -> bool {
                match side {
                    Side::Reference => closed.contains(&id),
                    Side::Hypothesis => {
                        store.get(Side::Hypothesis, id).ends.last().copied().unwrap() <= segment_end
                    }
                }
            };
            child_key
                .active_set
                .retain(|&(side, id)| !is_closed(side, id));
            child_key.current_pairs.retain(|&(ref_id, hyp_id)| {
                !is_closed(Side::Reference, ref_id) && !is_closed(Side::Hypothesis, hyp_id)
            });

            child_key.canonicalize();

            let mut resolved = new_refs.clone();
            resolved.sort_unstable_by_key(|&(id, _, _)| id);

            let identifier = Identifier {
                segment_index: node.identifier.segment_index + 1,
                key: child_key,
            };

            children.push(Node {
                identifier,
                cost,
                predecessor: Some(node.identifier.clone()),
                predecessor_edge: Some(SegmentDelta {
                    added_pairs: outcome.new_pairs,
                    unmapped: outcome.unmapped,
                    resolved,
                }),
            });
        }
    }

    children
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        build, cost_model,
        entity::Side,
        frontier::SegmentGraph,
        interner::Interner,
        tokenize::embedded,
    };
    use generic_search::AStar;

    fn single_pair_store() -> (EntityStore, Interner) {
        let mut interner = Interner::new();
        let tags = vec!["N".to_string()];
        let reference = embedded::tokenize("<N>Alice</N>", "ref", &tags).unwrap();
        let hypothesis = embedded::tokenize("<N>Alice</N>", "hyp", &tags).unwrap();

        let mut store = EntityStore::new();
        store.reference = build::build_embedded_entities(&reference.tags, Side::Reference, &mut interner);
        store.hypothesis =
            build::build_embedded_entities(&hypothesis.tags, Side::Hypothesis, &mut interner);
        (store, interner)
    }

    #[test]
    fn aligns_a_single_matching_pair_with_zero_cost() {
        let (mut store, mut interner) = single_pair_store();
        let model = cost_model::DefaultCostModel::new(
            crate::config::CostConfig::from_toml_str("tags = [\"N\"]\n").unwrap(),
        );

        cost_model::materialize_miss_costs(&mut store, &mut interner, &model, "Alice", "Alice").unwrap();
        let segments = SegmentGraph::build(&store);
        cost_model::materialize_substitution_costs(
            &mut store, &segments, &mut interner, &model, "Alice", "Alice",
        )
        .unwrap();

        let mut search = AStar::new(Context::new(&store, &segments));
        search.initialise();
        let result = search.search();
        assert!(matches!(
            result,
            generic_search::AStarResult::FoundTarget { .. }
        ));
        assert_eq!(result.cost().as_f64(), 0.0);
    }
}
