use std::collections::HashMap;

use crate::{cost::Cost, interner::InternedId};

/// Which annotation an entity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Reference,
    Hypothesis,
}

/// The index of an entity within its side's entity vector in an [`EntityStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub u32);

impl EntityId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Cost and error-type labels for leaving an entity unmapped, under one boundary choice.
#[derive(Debug, Clone)]
pub struct MissCostCell {
    pub cost: Cost,
    pub error_types: Vec<InternedId>,
}

/// Cost and error-type labels for pairing a reference entity with a hypothesis entity, under one
/// boundary choice of the reference entity.
#[derive(Debug, Clone)]
pub struct SubstCostCell {
    pub cost: Cost,
    pub error_types: Vec<InternedId>,
}

/// A tagged span of text, possibly with multiple candidate start/end offsets.
#[derive(Debug, Clone)]
pub struct Entity {
    pub tag: InternedId,
    pub side: Side,
    /// Non-empty, strictly increasing candidate start offsets.
    pub starts: Vec<usize>,
    /// Non-empty, strictly increasing candidate end offsets.
    pub ends: Vec<usize>,
    /// Opaque to the engine; forwarded to the cost model in document order.
    pub attrs: Vec<(String, String)>,
    pub depth: usize,
    pub parent: Option<EntityId>,
    pub left_constraint: Option<EntityId>,
    /// The line, in the entity's own source file, of the tag/marker that fixed its tag and depth.
    /// For diagnostics only; does not participate in alignment.
    pub line: usize,
    /// `miss_costs[s][e]` is `Some` only when `starts[s] < ends[e]`.
    pub miss_costs: Vec<Vec<Option<MissCostCell>>>,
    /// For reference entities only: hyp entity -> `|starts|x|ends|` grid, populated lazily.
    pub subst_costs: HashMap<EntityId, Vec<Vec<Option<SubstCostCell>>>>,
}

impl Entity {
    pub fn new(
        tag: InternedId,
        side: Side,
        starts: Vec<usize>,
        ends: Vec<usize>,
        attrs: Vec<(String, String)>,
        depth: usize,
        parent: Option<EntityId>,
        left_constraint: Option<EntityId>,
        line: usize,
    ) -> Self {
        debug_assert!(!starts.is_empty());
        debug_assert!(!ends.is_empty());
        debug_assert!(starts.is_sorted());
        debug_assert!(ends.is_sorted());
        debug_assert!(*ends.last().unwrap() > *starts.first().unwrap());

        let miss_costs = vec![vec![None; ends.len()]; starts.len()];
        Self {
            tag,
            side,
            starts,
            ends,
            attrs,
            depth,
            parent,
            left_constraint,
            line,
            miss_costs,
            subst_costs: HashMap::new(),
        }
    }

    pub fn is_reference(&self) -> bool {
        self.side == Side::Reference
    }

    pub fn outermost_span(&self) -> (usize, usize) {
        (*self.starts.first().unwrap(), *self.ends.last().unwrap())
    }

    /// True if the hypothesis entity has exactly one start and one end alternative.
    pub fn is_well_formed_hypothesis(&self) -> bool {
        self.side != Side::Hypothesis || (self.starts.len() == 1 && self.ends.len() == 1)
    }
}

/// Owns all reference and hypothesis entities, keyed by stable index.
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    pub reference: Vec<Entity>,
    pub hypothesis: Vec<Entity>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entities(&self, side: Side) -> &[Entity] {
        match side {
            Side::Reference => &self.reference,
            Side::Hypothesis => &self.hypothesis,
        }
    }

    pub fn entities_mut(&mut self, side: Side) -> &mut Vec<Entity> {
        match side {
            Side::Reference => &mut self.reference,
            Side::Hypothesis => &mut self.hypothesis,
        }
    }

    pub fn get(&self, side: Side, id: EntityId) -> &Entity {
        &self.entities(side)[id.index()]
    }

    pub fn get_mut(&mut self, side: Side, id: EntityId) -> &mut Entity {
        &mut self.entities_mut(side)[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interner::Interner;

    #[test]
    fn outermost_span_uses_first_start_and_last_end() {
        let mut interner = Interner::new();
        let tag = interner.intern("N");
        let entity = Entity::new(
            tag,
            Side::Reference,
            vec![0, 4],
            vec![5, 9],
            Vec::new(),
            0,
            None,
            None,
            1,
        );
        assert_eq!(entity.outermost_span(), (0, 9));
    }
}
