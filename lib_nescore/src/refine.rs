//! Whitespace refinement: spec §6. Grounded on `ne-scoring-gen.cc`'s `refine_entities()`.

use crate::{
    entity::{Entity, EntityStore},
    error::{Error, Result},
};

/// Advances each candidate start past leading whitespace and retracts each candidate end past
/// trailing whitespace, in `text` coordinates. Alternatives that become empty or inverted are
/// dropped from either end of the alternative list while preserving at least one alternative.
pub fn refine_entity(entity: &mut Entity, text: &str) -> Result<()> {
    let bytes = text.as_bytes();

    let mut starts: Vec<usize> = entity
        .starts
        .iter()
        .map(|&start| advance_past_whitespace(bytes, start))
        .collect();
    let mut ends: Vec<usize> = entity
        .ends
        .iter()
        .map(|&end| retract_past_whitespace(bytes, end))
        .collect();

    starts.dedup();
    ends.dedup();

    let last_end = *ends.last().unwrap();
    while starts.len() > 1 && *starts.first().unwrap() >= last_end {
        starts.remove(0);
    }
    let first_start = *starts.first().unwrap();
    while ends.len() > 1 && *ends.last().unwrap() <= first_start {
        ends.pop();
    }

    if starts.is_empty() || ends.is_empty() || *starts.first().unwrap() >= *ends.last().unwrap() {
        return Err(Error::EmptyEntityAfterRefinement {
            tag: format!("{:?}", entity.tag),
            offset: entity.starts[0],
        });
    }

    entity.starts = starts;
    entity.ends = ends;
    Ok(())
}

pub fn refine_entities(store: &mut EntityStore, reference_text: &str) -> Result<()> {
    for entity in store.reference.iter_mut().chain(store.hypothesis.iter_mut()) {
        refine_entity(entity, reference_text)?;
    }
    Ok(())
}

fn advance_past_whitespace(bytes: &[u8], mut offset: usize) -> usize {
    while offset < bytes.len() && bytes[offset].is_ascii_whitespace() {
        offset += 1;
    }
    offset
}

fn retract_past_whitespace(bytes: &[u8], mut offset: usize) -> usize {
    while offset > 0 && bytes[offset - 1].is_ascii_whitespace() {
        offset -= 1;
    }
    offset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Side;
    use crate::interner::Interner;

    #[test]
    fn trims_leading_and_trailing_whitespace() {
        let mut interner = Interner::new();
        let tag = interner.intern("N");
        let text = "  Alice  ";
        let mut entity = Entity::new(tag, Side::Reference, vec![0], vec![9], Vec::new(), 0, None, None, 1);
        refine_entity(&mut entity, text).unwrap();
        assert_eq!(entity.starts, vec![2]);
        assert_eq!(entity.ends, vec![7]);
    }

    #[test]
    fn rejects_entity_that_is_entirely_whitespace() {
        let mut interner = Interner::new();
        let tag = interner.intern("N");
        let text = "     ";
        let mut entity = Entity::new(tag, Side::Reference, vec![0], vec![5], Vec::new(), 0, None, None, 1);
        assert!(refine_entity(&mut entity, text).is_err());
    }

    #[test]
    fn idempotent_on_already_refined_entity() {
        let mut interner = Interner::new();
        let tag = interner.intern("N");
        let text = "Alice";
        let mut entity = Entity::new(tag, Side::Reference, vec![0], vec![5], Vec::new(), 0, None, None, 1);
        refine_entity(&mut entity, text).unwrap();
        let starts_before = entity.starts.clone();
        let ends_before = entity.ends.clone();
        refine_entity(&mut entity, text).unwrap();
        assert_eq!(entity.starts, starts_before);
        assert_eq!(entity.ends, ends_before);
    }
}
