use log::{debug, warn};

use propnet_shared::{
    CodecError, FlattenedSchema, PropertyIndex, Protocol, UpdateKind, UpdateWriter,
};

use super::{Candidate, Selection};

fn record_bits(
    selection: &Selection,
    chosen: &[PropertyIndex],
    schema: &FlattenedSchema,
) -> Result<u32, CodecError> {
    if chosen.is_empty() {
        return Ok(0);
    }
    // the tick isn't part of the record
    UpdateWriter::update_bit_length(&selection.delta_with(0, chosen), schema)
}

fn schema_of<'p>(protocol: &'p Protocol, selection: &Selection) -> Result<&'p FlattenedSchema, CodecError> {
    protocol
        .class(selection.class_id)
        .map(|class| &**class.schema())
        .ok_or(CodecError::UnknownClass {
            class_id: selection.class_id,
        })
}

/// Fits candidates into `budget_bits`, in entity order. "Changes often"
/// properties of known entities are reserved first and always sent. Full
/// updates go in whole or not at all. Remaining dirty properties are added
/// one by one while they fit; the rest wait for a later tick.
///
/// A record too large for even an empty packet would wait forever, so one
/// such record per packet goes out over budget.
pub(crate) fn select_updates<'s>(
    protocol: &Protocol,
    candidates: Vec<Candidate<'s>>,
    budget_bits: u32,
) -> Result<Vec<Selection<'s>>, CodecError> {
    let mut selections: Vec<Selection<'s>> =
        candidates.into_iter().map(Selection::from_candidate).collect();
    let mut costs: Vec<u32> = vec![0; selections.len()];
    let mut used: u32 = 0;
    let mut oversized_sent = false;

    // Urgent pass
    for (selection, cost) in selections.iter_mut().zip(costs.iter_mut()) {
        if selection.kind != UpdateKind::Delta {
            continue;
        }
        let schema = schema_of(protocol, selection)?;
        let urgent: Vec<PropertyIndex> = selection
            .dirty
            .iter_set()
            .filter(|index| {
                schema
                    .property(*index)
                    .is_some_and(|property| property.descriptor().changes_often_flag())
            })
            .collect();
        if urgent.is_empty() {
            continue;
        }
        *cost = record_bits(selection, &urgent, schema)?;
        used += *cost;
        selection.chosen = urgent;
    }
    if used > budget_bits {
        warn!(
            "\"changes often\" properties need {} bits, over the {} bit budget",
            used, budget_bits
        );
    }

    // Fill pass
    for (selection, cost) in selections.iter_mut().zip(costs.iter_mut()) {
        let schema = schema_of(protocol, selection)?;
        match selection.kind {
            UpdateKind::Full => {
                let all: Vec<PropertyIndex> =
                    (0..schema.len()).map(|index| index as PropertyIndex).collect();
                let bits = record_bits(selection, &all, schema)?;
                if used + bits <= budget_bits {
                    used += bits;
                    *cost = bits;
                    selection.chosen = all;
                } else if bits > budget_bits && !oversized_sent {
                    warn_overflow(selection, "full update", bits, budget_bits);
                    oversized_sent = true;
                    used += bits;
                    *cost = bits;
                    selection.chosen = all;
                } else {
                    debug!(
                        "deferring full update of entity {} ({} bits, {} left)",
                        selection.handle,
                        bits,
                        budget_bits.saturating_sub(used)
                    );
                }
            }
            UpdateKind::Delta => {
                let pending: Vec<PropertyIndex> = selection
                    .dirty
                    .iter_set()
                    .filter(|index| !selection.chosen.contains(index))
                    .collect();
                let mut deferred = 0;
                for index in pending {
                    let position = selection.chosen.partition_point(|chosen| *chosen < index);
                    let mut trial = selection.chosen.clone();
                    trial.insert(position, index);
                    let bits = record_bits(selection, &trial, schema)?;
                    if used - *cost + bits <= budget_bits {
                        used = used - *cost + bits;
                        *cost = bits;
                        selection.chosen = trial;
                    } else if selection.chosen.is_empty() && bits > budget_bits && !oversized_sent {
                        warn_overflow(selection, "property", bits, budget_bits);
                        oversized_sent = true;
                        used += bits;
                        *cost = bits;
                        selection.chosen = trial;
                    } else {
                        deferred += 1;
                    }
                }
                if deferred > 0 {
                    debug!(
                        "deferring {} properties of entity {}",
                        deferred, selection.handle
                    );
                }
            }
        }
    }

    selections.retain(|selection| !selection.is_empty());
    Ok(selections)
}

fn warn_overflow(selection: &Selection, what: &str, bits: u32, budget_bits: u32) {
    warn!(
        "Packet Write Error: {} of entity {} needs {} bits, but a packet only has {} bits available! \
         Sending it over budget. Recommend slimming down this class or raising max_update_bits.",
        what, selection.handle, bits, budget_bits
    );
}
