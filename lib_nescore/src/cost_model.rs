//! The pluggable cost model. Abstracted as a trait per spec §6/§9: a scripting-language bridge
//! does not belong in the engine, so the shipped implementation is table-driven, configured from
//! [`crate::config::CostConfig`].
//!
//! Grounded on `lib_tsalign/src/costs/cost_function/mod.rs`'s step-wise-function shape for the
//! idea of a small evaluated table, generalized to the reference/hypothesis pair shape this
//! domain needs.

use num_traits::Zero;

use crate::{
    config::CostConfig,
    cost::Cost,
    entity::{EntityStore, MissCostCell, Side, SubstCostCell},
    error::Result,
    frontier::SegmentGraph,
    interner::Interner,
};

/// A read-only view of one entity's chosen boundary, exposed to the cost model.
#[derive(Debug, Clone, Copy)]
pub struct EntityView<'a> {
    pub tag: &'a str,
    pub is_hypothesis: bool,
    pub start: usize,
    pub end: usize,
    pub attrs: &'a [(String, String)],
    pub text: &'a str,
}

/// The cost and error-type labels produced by one cost-model call. An empty `error_types` denotes
/// a correct pairing.
#[derive(Debug, Clone)]
pub struct CostOutcome {
    pub cost: Cost,
    pub error_types: Vec<String>,
}

impl CostOutcome {
    pub fn correct(cost: Cost) -> Self {
        Self {
            cost,
            error_types: Vec::new(),
        }
    }

    pub fn is_correct(&self) -> bool {
        self.error_types.is_empty()
    }
}

/// A pluggable evaluator that returns miss/substitution costs and error-type labels.
///
/// Must be side-effect-free with respect to the engine; called at most once per
/// `(entity, s, e)` for misses and `(ref, s, e, hyp)` for substitutions.
pub trait CostModel {
    /// The closed set of tag kinds the engine recognizes.
    fn tags(&self) -> &[String];

    fn miss_cost(&self, entity: &EntityView) -> Result<CostOutcome>;

    fn substitution_cost(
        &self,
        reference: &EntityView,
        hypothesis: &EntityView,
    ) -> Result<CostOutcome>;
}

/// The default, table-driven cost model.
#[derive(Debug, Clone)]
pub struct DefaultCostModel {
    config: CostConfig,
}

impl DefaultCostModel {
    pub fn new(config: CostConfig) -> Self {
        Self { config }
    }

    fn miss_cost_for_tag(&self, tag: &str) -> f64 {
        self.config
            .miss_cost
            .get(tag)
            .copied()
            .unwrap_or(self.config.default_miss_cost)
    }

    fn tag_substitution_cost(&self, from: &str, to: &str) -> Option<f64> {
        self.config
            .substitution_cost
            .iter()
            .find(|entry| {
                (entry.from == from && entry.to == to) || (entry.from == to && entry.to == from)
            })
            .map(|entry| entry.cost)
    }
}

impl CostModel for DefaultCostModel {
    fn tags(&self) -> &[String] {
        &self.config.tags
    }

    fn miss_cost(&self, entity: &EntityView) -> Result<CostOutcome> {
        let cost = self.miss_cost_for_tag(entity.tag);
        let error_type = if entity.is_hypothesis {
            "insertion"
        } else {
            "deletion"
        };
        Ok(CostOutcome {
            cost: Cost::new(cost),
            error_types: vec![error_type.to_string()],
        })
    }

    fn substitution_cost(
        &self,
        reference: &EntityView,
        hypothesis: &EntityView,
    ) -> Result<CostOutcome> {
        let mut error_types = Vec::new();

        let attrs_mismatch = reference.attrs != hypothesis.attrs;
        if attrs_mismatch {
            error_types.push("attribute-mismatch".to_string());
        }

        if reference.tag != hypothesis.tag {
            let cost = self
                .tag_substitution_cost(reference.tag, hypothesis.tag)
                .unwrap_or(self.config.default_different_tag_cost);
            error_types.push("tag-mismatch".to_string());
            return Ok(CostOutcome {
                cost: Cost::new(cost) + if attrs_mismatch {
                    Cost::new(self.config.attr_mismatch_cost)
                } else {
                    Cost::zero()
                },
                error_types,
            });
        }

        if reference.text != hypothesis.text {
            error_types.push("text-mismatch".to_string());
            return Ok(CostOutcome {
                cost: Cost::new(self.config.default_same_tag_different_text_cost)
                    + if attrs_mismatch {
                        Cost::new(self.config.attr_mismatch_cost)
                    } else {
                        Cost::zero()
                    },
                error_types,
            });
        }

        if attrs_mismatch {
            return Ok(CostOutcome {
                cost: Cost::new(self.config.attr_mismatch_cost),
                error_types,
            });
        }

        Ok(CostOutcome::correct(Cost::new(0.0)))
    }
}

/// Populates every entity's `miss_costs[s][e]` grid, for every boundary pair with a positive
/// span. Grounded on `ne-scoring-gen.cc`'s `compute_entities_miss_costs()`.
pub fn materialize_miss_costs(
    store: &mut EntityStore,
    interner: &mut Interner,
    model: &dyn CostModel,
    reference_text: &str,
    hypothesis_text: &str,
) -> Result<()> {
    for side in [Side::Reference, Side::Hypothesis] {
        let text = match side {
            Side::Reference => reference_text,
            Side::Hypothesis => hypothesis_text,
        };
        let is_hypothesis = side == Side::Hypothesis;

        for entity in store.entities_mut(side) {
            let tag = interner.get(entity.tag).to_string();
            for (sf, &start) in entity.starts.clone().iter().enumerate() {
                for (ef, &end) in entity.ends.clone().iter().enumerate() {
                    if start >= end {
                        continue;
                    }
                    let view = EntityView {
                        tag: &tag,
                        is_hypothesis,
                        start,
                        end,
                        attrs: &entity.attrs,
                        text: &text[start..end],
                    };
                    let outcome = model.miss_cost(&view)?;
                    let error_types = outcome
                        .error_types
                        .iter()
                        .map(|label| interner.intern(label))
                        .collect();
                    entity.miss_costs[sf][ef] = Some(MissCostCell {
                        cost: outcome.cost,
                        error_types,
                    });
                }
            }
        }
    }

    Ok(())
}

/// Populates, for every reference/hypothesis entity pair that co-occurs in some segment, the
/// `|starts|x|ends|` substitution cost grid on the reference entity. Grounded on
/// `ne-scoring-gen.cc`'s `compute_substitution_errors_costs()`: a pair is evaluated at most once,
/// the first time the two entities are found together in a segment, and only for boundary
/// combinations that overlap the hypothesis entity's fixed span.
pub fn materialize_substitution_costs(
    store: &mut EntityStore,
    segments: &SegmentGraph,
    interner: &mut Interner,
    model: &dyn CostModel,
    reference_text: &str,
    hypothesis_text: &str,
) -> Result<()> {
    for segment in &segments.segments {
        for &hyp_id in &segment.hypothesis_entities {
            for &ref_id in &segment.reference_entities {
                if store.get(Side::Reference, ref_id).subst_costs.contains_key(&hyp_id) {
                    continue;
                }

                let hyp = store.get(Side::Hypothesis, hyp_id);
                let hyp_tag = interner.get(hyp.tag).to_string();
                let (hyp_start, hyp_end) = (hyp.starts[0], hyp.ends[0]);
                let hyp_attrs = hyp.attrs.clone();
                let hyp_view = EntityView {
                    tag: &hyp_tag,
                    is_hypothesis: true,
                    start: hyp_start,
                    end: hyp_end,
                    attrs: &hyp_attrs,
                    text: &hypothesis_text[hyp_start..hyp_end],
                };

                let reference = store.get(Side::Reference, ref_id);
                let ref_tag = interner.get(reference.tag).to_string();
                let mut grid: Vec<Vec<Option<SubstCostCell>>> =
                    vec![vec![None; reference.ends.len()]; reference.starts.len()];

                for (sf, &start) in reference.starts.clone().iter().enumerate() {
                    if start >= hyp_end {
                        continue;
                    }
                    for (ef, &end) in reference.ends.clone().iter().enumerate() {
                        if end < hyp_start || start >= end {
                            continue;
                        }
                        let reference = store.get(Side::Reference, ref_id);
                        let ref_view = EntityView {
                            tag: &ref_tag,
                            is_hypothesis: false,
                            start,
                            end,
                            attrs: &reference.attrs,
                            text: &reference_text[start..end],
                        };
                        let outcome = model.substitution_cost(&ref_view, &hyp_view)?;
                        let error_types = outcome
                            .error_types
                            .iter()
                            .map(|label| interner.intern(label))
                            .collect();
                        grid[sf][ef] = Some(SubstCostCell {
                            cost: outcome.cost,
                            error_types,
                        });
                    }
                }

                store
                    .get_mut(Side::Reference, ref_id)
                    .subst_costs
                    .insert(hyp_id, grid);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CostConfig {
        CostConfig::from_toml_str(
            r#"
            tags = ["N", "L"]

            [miss_cost]
            N = 1.0
            L = 1.0

            [[substitution_cost]]
            from = "N"
            to = "L"
            cost = 1.5
            "#,
        )
        .unwrap()
    }

    #[test]
    fn identical_tag_and_text_is_correct() {
        let model = DefaultCostModel::new(config());
        let reference = EntityView {
            tag: "N",
            is_hypothesis: false,
            start: 0,
            end: 5,
            attrs: &[],
            text: "Alice",
        };
        let hypothesis = EntityView {
            is_hypothesis: true,
            ..reference
        };
        let outcome = model.substitution_cost(&reference, &hypothesis).unwrap();
        assert!(outcome.is_correct());
        assert_eq!(outcome.cost.as_f64(), 0.0);
    }

    #[test]
    fn different_tag_costs_1_5() {
        let model = DefaultCostModel::new(config());
        let reference = EntityView {
            tag: "N",
            is_hypothesis: false,
            start: 0,
            end: 5,
            attrs: &[],
            text: "Alice",
        };
        let hypothesis = EntityView {
            tag: "L",
            is_hypothesis: true,
            ..reference
        };
        let outcome = model.substitution_cost(&reference, &hypothesis).unwrap();
        assert!(!outcome.is_correct());
        assert_eq!(outcome.cost.as_f64(), 1.5);
    }

    #[test]
    fn same_tag_different_text_costs_1() {
        let model = DefaultCostModel::new(config());
        let reference = EntityView {
            tag: "N",
            is_hypothesis: false,
            start: 0,
            end: 5,
            attrs: &[],
            text: "Alice",
        };
        let hypothesis = EntityView {
            text: "Bobby",
            is_hypothesis: true,
            ..reference
        };
        let outcome = model.substitution_cost(&reference, &hypothesis).unwrap();
        assert_eq!(outcome.cost.as_f64(), 1.0);
    }

    #[test]
    fn miss_cost_uses_tag_table() {
        let model = DefaultCostModel::new(config());
        let entity = EntityView {
            tag: "N",
            is_hypothesis: false,
            start: 0,
            end: 5,
            attrs: &[],
            text: "Alice",
        };
        let outcome = model.miss_cost(&entity).unwrap();
        assert_eq!(outcome.cost.as_f64(), 1.0);
        assert_eq!(outcome.error_types, vec!["deletion".to_string()]);
    }
}
