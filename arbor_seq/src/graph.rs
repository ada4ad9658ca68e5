// The fixed triangular graph the sequencer walks.
//
// 36 nodes arranged as a perfect binary tree flattened into 8 rows:
//
//   row 0:                 00
//   row 1:               01  02
//   row 2:             03  04  05
//   row 3:           06  07  08  09
//   row 4:         10  11  12  13  14
//   row 5:       15  16  17  18  19  20
//   row 6:     21  22  23  24  25  26  27
//   row 7:   28  29  30  31  32  33  34  35
//
// Row r starts at index r(r+1)/2 and holds r+1 nodes. A node at row r,
// position i, branches to two children in row r+1: the "up" child at
// position i and the "down" child at position i+1. Only the 28 nodes of
// rows 0-6 branch; each carries the probability of taking its down branch.
//
// The shape is compiled in and immutable. Everything else in the engine is
// derived from these tables.

/// Total number of nodes in the graph.
pub const NODES: usize = 36;

/// Number of rows (one sequencer step per row).
pub const ROWS: usize = 8;

/// Number of branching nodes (rows 0-6), each carrying an edge weight.
pub const BRANCH_NODES: usize = 28;

/// First node index of each row, with `NODES` as the end sentinel.
pub const ROW_START: [usize; ROWS + 1] = [0, 1, 3, 6, 10, 15, 21, 28, 36];

/// The row a node belongs to.
pub fn row_of(node: usize) -> usize {
    debug_assert!(node < NODES);
    let mut row = 0;
    while ROW_START[row + 1] <= node {
        row += 1;
    }
    row
}

/// A node's position within its row (0 = topmost).
pub fn row_index(node: usize) -> usize {
    node - ROW_START[row_of(node)]
}

/// The "up" child of a node in row `row`.
///
/// Equals `node + row + 1`: the child keeps the parent's position in the
/// next, one-longer row.
pub fn up_child(node: usize, row: usize) -> usize {
    debug_assert!(row < ROWS - 1);
    node + row + 1
}

/// The "down" child of a node in row `row`, one below the up child.
pub fn down_child(node: usize, row: usize) -> usize {
    up_child(node, row) + 1
}
