use cubecl::prelude::*;

/// Reads the line starting at element `index` of the workspace.
///
/// `index` must be a multiple of the workspace line size, so the read is a single
/// aligned transaction. Nothing checks it.
#[cube]
pub fn vector_load<E: Numeric>(workspace: &Tensor<Line<E>>, index: u32) -> Line<E> {
    workspace[index / workspace.line_size()]
}

/// Writes `value` to the line starting at element `index` of the workspace.
///
/// Same alignment contract as [vector_load].
#[cube]
pub fn vector_store<E: Numeric>(workspace: &mut Tensor<Line<E>>, value: Line<E>, index: u32) {
    let line_size = workspace.line_size();
    workspace[index / line_size] = value;
}

/// [vector_load] that yields a zero line when `predicate` is false.
///
/// The load is issued whatever the predicate: a false predicate reads the first line
/// of the workspace instead of `index`, and the value is discarded by a select. Units
/// of a plane therefore never diverge on the data path.
#[cube]
pub fn predicated_vector_load<E: Numeric>(
    workspace: &Tensor<Line<E>>,
    index: u32,
    predicate: bool,
) -> Line<E> {
    let line_size = workspace.line_size();
    let line = workspace[select(predicate, index / line_size, 0u32)];
    select(
        predicate,
        line,
        Line::empty(line_size).fill(E::from_int(0)),
    )
}
