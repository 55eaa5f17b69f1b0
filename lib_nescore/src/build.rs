//! Entity construction from tag streams. Spec §6/§9. Grounded on `ne-scoring-gen.cc`'s two
//! `build_entities_from_tags()` overloads: a stack-based one for the embedded format, and a
//! depth-vector-based one for aref.

use std::collections::HashMap;

use crate::{
    entity::{Entity, EntityId, Side},
    error::{Error, Result},
    interner::Interner,
    tokenize::aref::ArefMarker,
    tokenize::embedded::EmbeddedTag,
};

/// Builds entities from a validated embedded-format tag stream (already nesting-checked by
/// [`crate::tokenize::embedded::tokenize`]). Each opening/closing pair becomes one entity with a
/// single start and a single end alternative; `parent`/`left_constraint` stay unset, since
/// embedded-format nesting is unambiguous and needs no boundary-alternative tie-breaking.
pub fn build_embedded_entities(tags: &[EmbeddedTag], side: Side, interner: &mut Interner) -> Vec<Entity> {
    struct Open {
        tag: crate::interner::InternedId,
        start: usize,
        attrs: Vec<(String, String)>,
        depth: usize,
        line: usize,
    }

    let mut entities = Vec::new();
    let mut stack: Vec<Open> = Vec::new();

    for tag in tags {
        if tag.opening {
            stack.push(Open {
                tag: interner.intern(&tag.tag),
                start: tag.offset,
                attrs: tag.attrs.clone(),
                depth: stack.len(),
                line: tag.line,
            });
        } else {
            // The tokenizer already rejected mismatched/unmatched tags.
            let open = stack.pop().expect("tokenizer guarantees matched tags");
            entities.push(Entity::new(
                open.tag,
                side,
                vec![open.start],
                vec![tag.offset],
                open.attrs,
                open.depth,
                None,
                None,
                open.line,
            ));
        }
    }

    entities
}

/// Builds entities from an aref-format marker stream. Markers are grouped by their `id`; the
/// first marker seen for a given id fixes that entity's tag, depth, and parent (matching markers
/// after it only contribute further boundary alternatives), mirroring the original's guard on
/// `entities[eid].tagid == -1`. `left_constraint` links an entity to the most recently started
/// entity at the same depth sharing the same parent, exactly as in the original.
pub fn build_aref_entities(
    markers: &[ArefMarker],
    side: Side,
    interner: &mut Interner,
    file_name: &str,
) -> Result<Vec<Entity>> {
    struct Pending {
        tag: crate::interner::InternedId,
        depth: usize,
        parent_external: Option<i64>,
        starts: Vec<usize>,
        ends: Vec<usize>,
        line: usize,
    }

    let mut id_to_index: HashMap<i64, usize> = HashMap::new();
    let mut pending: Vec<Pending> = Vec::new();
    let mut entity_per_depth: Vec<Option<usize>> = Vec::new();
    let mut left_constraints: HashMap<usize, Option<usize>> = HashMap::new();

    for marker in markers {
        let index = match id_to_index.get(&marker.id) {
            Some(&index) => index,
            None => {
                let index = pending.len();
                id_to_index.insert(marker.id, index);

                let left_constraint = entity_per_depth
                    .get(marker.depth)
                    .copied()
                    .flatten()
                    .filter(|&prev_index| pending[prev_index].parent_external == marker.parent);

                pending.push(Pending {
                    tag: interner.intern(&marker.tag),
                    depth: marker.depth,
                    parent_external: marker.parent,
                    starts: Vec::new(),
                    ends: Vec::new(),
                    line: marker.line,
                });

                if entity_per_depth.len() <= marker.depth {
                    entity_per_depth.resize(marker.depth + 1, None);
                }
                entity_per_depth[marker.depth] = Some(index);

                // Stash the resolved left_constraint alongside the pending entity by immediately
                // recording it; see resolution pass below.
                left_constraints.insert(index, left_constraint);

                index
            }
        };

        pending[index].line = marker.line;

        if marker.ftype.contributes_start() {
            pending[index].starts.push(marker.offset);
        }
        if marker.ftype.contributes_end() {
            pending[index].ends.push(marker.offset);
        }
    }

    let mut entities = Vec::with_capacity(pending.len());
    for (index, entry) in pending.into_iter().enumerate() {
        let mut starts = entry.starts;
        let mut ends = entry.ends;
        starts.sort_unstable();
        starts.dedup();
        ends.sort_unstable();
        ends.dedup();

        if starts.is_empty() || ends.is_empty() {
            return Err(Error::MalformedTag {
                file: file_name.to_string(),
                line: 0,
                col: 0,
                message: format!("annotation entity at index {index} is missing a start or end marker"),
            });
        }

        let parent = entry
            .parent_external
            .map(|parent_id| {
                id_to_index
                    .get(&parent_id)
                    .map(|&parent_index| EntityId(parent_index as u32))
                    .ok_or_else(|| Error::MalformedTag {
                        file: file_name.to_string(),
                        line: 0,
                        col: 0,
                        message: format!("annotation parent id {parent_id} does not match any entity"),
                    })
            })
            .transpose()?;

        let left_constraint = left_constraints
            .remove(&index)
            .flatten()
            .map(|left_index| EntityId(left_index as u32));

        entities.push(Entity::new(
            entry.tag, side, starts, ends, Vec::new(), entry.depth, parent, left_constraint, entry.line,
        ));
    }

    Ok(entities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenize::{aref, embedded};

    #[test]
    fn builds_nested_embedded_entities_with_depth() {
        let mut interner = Interner::new();
        let tags = vec!["N".to_string(), "L".to_string()];
        let result = embedded::tokenize("<N><L>Paris</L></N>", "ref", &tags).unwrap();
        let entities = build_embedded_entities(&result.tags, Side::Reference, &mut interner);
        assert_eq!(entities.len(), 2);
        // Inner L closes first, so it is appended before N.
        assert_eq!(entities[0].depth, 1);
        assert_eq!(entities[1].depth, 0);
        assert!(entities[0].parent.is_none());
    }

    #[test]
    fn builds_aref_entities_with_boundary_alternatives_and_parent() {
        let mut interner = Interner::new();
        let input = concat!(
            r#"<annotation id=1 type=P ftype=s depth=0 parent=-1/>"#,
            r#"<annotation id=2 type=N ftype=s depth=1 parent=1/>"#,
            "Alice Smith",
            r#"<annotation id=2 type=N ftype=s depth=1 parent=1/>"#,
            r#"<annotation id=2 type=N ftype=e depth=1 parent=1/>"#,
            r#"<annotation id=2 type=N ftype=e depth=1 parent=1/>"#,
            r#"<annotation id=1 type=P ftype=e depth=0 parent=-1/>"#,
        );
        let result = aref::tokenize(input, "ref").unwrap();
        let entities = build_aref_entities(&result.markers, Side::Reference, &mut interner, "ref").unwrap();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[1].parent, Some(EntityId(0)));
        assert_eq!(entities[1].starts.len(), 2);
        assert_eq!(entities[1].ends.len(), 1);
    }
}
