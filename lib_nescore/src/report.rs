//! Human-readable reporting: detail lines, the summary block, and the IAG block. Grounded on
//! `ne-scoring-gen.cc`'s `show_entity()`, `show_details()`, `show_summary()` and `show_iag()`.
//!
//! Detail lines print each entity's line number in its *own* source file (`entity.line`, set once
//! by the tokenizer), but render the entity's text out of the single post-repositioning text
//! buffer: by the time entities reach this stage, hypothesis offsets have already been rebased
//! onto the reference text's coordinate space, so one buffer serves both sides, exactly as the
//! original passes a single `data` buffer to `show_entity()` regardless of which side the entity
//! is on.

use std::collections::BTreeMap;

use crate::{
    assemble::AlignmentResult,
    config::CostConfig,
    entity::{Entity, EntityStore, Side},
    iag::IagReport,
    interner::Interner,
    score::Scores,
    tokenize::escape,
};

/// Renders an entity's span as escaped text. For an entity with several boundary alternatives,
/// shows every alternative's bracket, with the committed pair (`chosen`, defaulting to the first
/// start and last end) marked with curly braces and the rest with square ones.
fn render_entity(entity: &Entity, text: &str, chosen: Option<(usize, usize)>) -> String {
    if entity.starts.len() == 1 && entity.ends.len() == 1 {
        return escape(&text[entity.starts[0]..entity.ends[0]]);
    }

    let (sf, ef) = chosen.unwrap_or((0, entity.ends.len() - 1));
    let chosen_start = entity.starts[sf];
    let chosen_end = entity.ends[ef];

    let mut flags: BTreeMap<usize, u8> = BTreeMap::new();
    for &start in &entity.starts {
        *flags.entry(start).or_insert(0) |= 1;
    }
    for &end in &entity.ends {
        *flags.entry(end).or_insert(0) |= 2;
    }

    let mut rendered = String::new();
    let mut pos: Option<usize> = None;
    for (&offset, &flag) in &flags {
        if let Some(prev) = pos {
            rendered.push_str(&escape(&text[prev..offset]));
        }
        pos = Some(offset);
        if flag & 2 != 0 {
            rendered.push(if offset == chosen_end { '}' } else { ']' });
        }
        if flag & 1 != 0 {
            rendered.push(if offset == chosen_start { '{' } else { '[' });
        }
    }
    rendered
}

fn entity_label(entity: &Entity, interner: &Interner) -> String {
    let mut label = interner.get(entity.tag).to_string();
    if !entity.attrs.is_empty() {
        label.push_str(" (");
        for (index, (key, value)) in entity.attrs.iter().enumerate() {
            if index != 0 {
                label.push(' ');
            }
            label.push_str(key);
            label.push('=');
            label.push_str(value);
        }
        label.push(')');
    }
    label
}

fn print_entity_line(entity: &Entity, text: &str, chosen: Option<(usize, usize)>, interner: &Interner) {
    println!(
        "    {}: {} - {}",
        if entity.is_reference() { "ref" } else { "hyp" },
        entity_label(entity, interner),
        render_entity(entity, text, chosen)
    );
}

fn build_error_string(error_types: &[crate::interner::InternedId], interner: &Interner) -> String {
    error_types
        .iter()
        .map(|&id| interner.get(id))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Prints one line per unmapped entity and one per substitution/correct pair, in the order the
/// alignment search produced them. `text` is the single post-repositioning text buffer both
/// sides' offsets are expressed in. `details_correct` mirrors `-c`: print correct pairs too, not
/// only substitutions.
pub fn show_details(
    store: &EntityStore,
    result: &AlignmentResult,
    text: &str,
    reference_file: &str,
    hypothesis_file: &str,
    interner: &Interner,
    details_correct: bool,
) {
    for &(side, id) in &result.unmapped {
        let entity = store.get(side, id);
        // A hypothesis entity is always single-boundary; a reference entity's boundary choice is
        // whatever the search committed for it. `frontiers` is keyed by bare id, and ids are
        // reused across sides, so only consult it on the reference side.
        let (sf, ef) = match side {
            Side::Reference => result.frontiers.get(&id).copied().unwrap_or((0, 0)),
            Side::Hypothesis => (0, 0),
        };
        let cell = entity.miss_costs[sf][ef]
            .as_ref()
            .expect("unmapped entities are always materialized at their committed span");
        let (error_code, file) = match side {
            Side::Hypothesis => ('I', hypothesis_file),
            Side::Reference => ('D', reference_file),
        };
        let error_string = build_error_string(&cell.error_types, interner);
        println!(
            "{error_code}: {error_string} ({:.6}): {file}:{}",
            cell.cost.as_f64(),
            entity.line
        );
        print_entity_line(entity, text, Some((sf, ef)), interner);
        println!();
    }

    for &(ref_id, hyp_id) in &result.pairs {
        let reference = store.get(Side::Reference, ref_id);
        let hypothesis = store.get(Side::Hypothesis, hyp_id);
        let &(sf, ef) = result.frontiers.get(&ref_id).expect("paired reference entity has a committed frontier");
        let cell = reference.subst_costs[&hyp_id][sf][ef]
            .as_ref()
            .expect("pairing enumeration only proposes materialized boundary combinations");

        let error_code = if cell.error_types.is_empty() {
            if details_correct { 'C' } else { '\0' }
        } else {
            'S'
        };
        if error_code == '\0' {
            continue;
        }

        let error_string = if error_code == 'C' {
            "correct".to_string()
        } else {
            build_error_string(&cell.error_types, interner)
        };
        println!(
            "{error_code}: {error_string} ({:.6}): {reference_file}:{} {hypothesis_file}:{}",
            cell.cost.as_f64(),
            reference.line,
            hypothesis.line
        );
        print_entity_line(reference, text, Some((sf, ef)), interner);
        print_entity_line(hypothesis, text, None, interner);
        println!();
    }
}

/// Prints the slot error rate, the conservation-count breakdown, overall precision/recall/F, and
/// a per-tag precision/recall/F table, in declaration order.
pub fn show_summary(scores: &Scores, config: &CostConfig, interner: &Interner) {
    println!(
        "Slot Error Rate: {:5.1}% ({} {})\n",
        scores.slot_error_rate() * 100.0,
        scores.ser,
        scores.ref_entities
    );

    let denom = scores.ref_entities as f64;
    let pct = |count: usize| if scores.ref_entities == 0 { 0.0 } else { 100.0 * count as f64 / denom };
    println!("{:6} {:5.1}% corrects", scores.count_correct, pct(scores.count_correct));
    println!("{:6} {:5.1}% inserts", scores.count_insert, pct(scores.count_insert));
    println!("{:6} {:5.1}% deletes", scores.count_delete, pct(scores.count_delete));
    println!("{:6} {:5.1}% substitutions", scores.count_subst, pct(scores.count_subst));
    println!("{:6} {:5.1}% total errors\n", scores.count_total, pct(scores.count_total));

    if scores.hyp_entities != 0 {
        println!("{:5.1}% overall precision ({} entities in hypothesis)", scores.precision(), scores.hyp_entities);
    } else {
        println!("  0.0% overall precision (0 entities in hypothesis)");
    }
    println!("{:5.1}% overall recall ({} entities in reference)", scores.recall(), scores.ref_entities);
    println!("{:5.1}% overall F-measure\n", scores.f_measure());

    println!("   P      R      F   tag");
    for tag in &config.tags {
        let Some(id) = interner.find(tag) else { continue };
        let counts = scores.tag_counts.get(&id).copied().unwrap_or_default();
        if counts.hyp_count + counts.ref_count == 0 {
            continue;
        }
        println!(
            "{:5.1}% {:5.1}% {:5.1}% {tag} (hyp_count={}, ref_count={}, correct={})",
            counts.precision(),
            counts.recall(),
            counts.f_measure(),
            counts.hyp_count,
            counts.ref_count,
            counts.correct,
        );
    }
}

/// Prints the inter-annotator-agreement block computed by [`crate::iag::compute_iag`].
pub fn show_iag(report: &IagReport) {
    println!("Total entities: {}", report.total_entities as i64);
    println!("Correct: {}", report.correct);
    println!("Added void/void corrects: {}", report.added_void_corrects);
    println!("Tag types: {}", report.tag_types);
    println!();
    println!("S         = {:7.5}", report.s);
    println!("Pi        = {:7.5}", report.pi);
    println!("Kappa     = {:7.5}", report.kappa);
    println!("F-measure = {:7.5}", report.f_measure);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityId, Side};

    #[test]
    fn renders_single_boundary_entity_as_plain_span() {
        let mut interner = Interner::new();
        let tag = interner.intern("N");
        let entity = Entity::new(tag, Side::Reference, vec![0], vec![5], Vec::new(), 0, None, None, 1);
        assert_eq!(render_entity(&entity, "Alice Smith", None), "Alice");
    }

    #[test]
    fn renders_multi_boundary_entity_with_brackets() {
        let mut interner = Interner::new();
        let tag = interner.intern("N");
        let entity = Entity::new(tag, Side::Reference, vec![0, 2], vec![5, 7], Vec::new(), 0, None, None, 1);
        let rendered = render_entity(&entity, "Alice S.", Some((0, 0)));
        assert!(rendered.contains('{'));
        assert!(rendered.contains('}'));
    }

    #[test]
    fn entity_id_indexes_are_stable_through_store_lookup() {
        assert_eq!(EntityId(0).index(), 0);
    }
}
