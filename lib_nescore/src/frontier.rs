//! Segment construction: spec §4.1. Grounded on `ne-scoring-gen.cc`'s
//! `add_frontiers()`/`build_segments()`.

use std::collections::BTreeSet;

use crate::entity::{Entity, EntityId, EntityStore, Side};

/// A reference entity starting at a segment's start offset, tagged with the start alternative
/// index that matches.
#[derive(Debug, Clone, Copy)]
pub struct StartingRefEntity {
    pub entity: EntityId,
    pub start_alt: usize,
}

/// A reference entity ending at a segment's end offset, tagged with the end alternative index
/// that matches.
#[derive(Debug, Clone, Copy)]
pub struct EndingRefEntity {
    pub entity: EntityId,
    pub end_alt: usize,
}

/// Half-open `[start, end)` byte range between two consecutive frontiers.
#[derive(Debug, Clone, Default)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
    pub reference_entities: Vec<EntityId>,
    pub hypothesis_entities: Vec<EntityId>,
    pub starting_ref_entities: Vec<StartingRefEntity>,
    pub ending_ref_entities: Vec<EndingRefEntity>,
    pub starting_hyp_entities: Vec<EntityId>,
}

/// The ordered sequence of segments derived from the union of entity boundary frontiers.
#[derive(Debug, Clone, Default)]
pub struct SegmentGraph {
    pub segments: Vec<Segment>,
}

impl SegmentGraph {
    pub fn build(store: &EntityStore) -> Self {
        let mut frontiers = BTreeSet::new();
        for entity in store.reference.iter().chain(store.hypothesis.iter()) {
            frontiers.extend(entity.starts.iter().copied());
            frontiers.extend(entity.ends.iter().copied());
        }

        let frontiers: Vec<usize> = frontiers.into_iter().collect();
        if frontiers.len() < 2 {
            return Self {
                segments: Vec::new(),
            };
        }

        let mut segments: Vec<Segment> = frontiers
            .windows(2)
            .map(|window| Segment {
                start: window[0],
                end: window[1],
                ..Default::default()
            })
            .collect();

        let segment_index_by_start: std::collections::HashMap<usize, usize> = segments
            .iter()
            .enumerate()
            .map(|(index, segment)| (segment.start, index))
            .collect();
        let segment_index_by_end: std::collections::HashMap<usize, usize> = segments
            .iter()
            .enumerate()
            .map(|(index, segment)| (segment.end, index))
            .collect();

        for (side, entities) in [
            (Side::Reference, &store.reference),
            (Side::Hypothesis, &store.hypothesis),
        ] {
            for (index, entity) in entities.iter().enumerate() {
                let id = EntityId(index as u32);
                insert_alternatives(&mut segments, &segment_index_by_start, &segment_index_by_end, side, id, entity);
            }
        }

        // Fourth pass: add entities still "open" across a segment via their outermost span.
        for (side, entities) in [
            (Side::Reference, &store.reference),
            (Side::Hypothesis, &store.hypothesis),
        ] {
            for (index, entity) in entities.iter().enumerate() {
                let id = EntityId(index as u32);
                let (outer_start, outer_end) = entity.outermost_span();
                for segment in &mut segments {
                    if outer_start < segment.end && outer_end > segment.start {
                        let list = match side {
                            Side::Reference => &mut segment.reference_entities,
                            Side::Hypothesis => &mut segment.hypothesis_entities,
                        };
                        if !list.contains(&id) {
                            list.push(id);
                        }
                    }
                }
            }
        }

        Self { segments }
    }
}

fn insert_alternatives(
    segments: &mut [Segment],
    segment_index_by_start: &std::collections::HashMap<usize, usize>,
    segment_index_by_end: &std::collections::HashMap<usize, usize>,
    side: Side,
    id: EntityId,
    entity: &Entity,
) {
    for (start_alt, &start) in entity.starts.iter().enumerate() {
        if let Some(&segment_index) = segment_index_by_start.get(&start) {
            let segment = &mut segments[segment_index];
            match side {
                Side::Reference => {
                    segment.starting_ref_entities.push(StartingRefEntity {
                        entity: id,
                        start_alt,
                    });
                }
                Side::Hypothesis => {
                    segment.starting_hyp_entities.push(id);
                }
            }
        }
    }

    if side == Side::Reference {
        for (end_alt, &end) in entity.ends.iter().enumerate() {
            // `segment_index_by_end` maps a segment's end offset to its own index; the ending
            // entity is recorded on the segment that this offset closes, i.e. the one whose
            // `end` equals the offset.
            if let Some(&segment_index) = segment_index_by_end.get(&end) {
                segments[segment_index]
                    .ending_ref_entities
                    .push(EndingRefEntity {
                        entity: id,
                        end_alt,
                    });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interner::Interner;

    #[test]
    fn builds_segments_from_two_entities() {
        let mut interner = Interner::new();
        let tag = interner.intern("N");
        let mut store = EntityStore::new();
        store.reference.push(Entity::new(
            tag,
            Side::Reference,
            vec![0],
            vec![5],
            Vec::new(),
            0,
            None,
            None,
            1,
        ));
        store.hypothesis.push(Entity::new(
            tag,
            Side::Hypothesis,
            vec![0],
            vec![5],
            Vec::new(),
            0,
            None,
            None,
            1,
        ));

        let graph = SegmentGraph::build(&store);
        assert_eq!(graph.segments.len(), 1);
        let segment = &graph.segments[0];
        assert_eq!((segment.start, segment.end), (0, 5));
        assert_eq!(segment.starting_ref_entities.len(), 1);
        assert_eq!(segment.starting_hyp_entities.len(), 1);
        assert_eq!(segment.ending_ref_entities.len(), 1);
    }

    #[test]
    fn entity_with_boundary_alternatives_spans_multiple_segments() {
        let mut interner = Interner::new();
        let tag = interner.intern("N");
        let mut store = EntityStore::new();
        store.reference.push(Entity::new(
            tag,
            Side::Reference,
            vec![0, 6],
            vec![5, 11],
            Vec::new(),
            0,
            None,
            None,
            1,
        ));

        let graph = SegmentGraph::build(&store);
        // Frontiers at 0, 5, 6, 11 -> three segments.
        assert_eq!(graph.segments.len(), 3);
        assert_eq!(graph.segments[0].starting_ref_entities.len(), 1);
        assert_eq!(graph.segments[2].starting_ref_entities.len(), 1);
    }
}
